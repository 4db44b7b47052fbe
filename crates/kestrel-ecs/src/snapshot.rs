//! World snapshots for inspection and determinism checks.
//!
//! [`WorldSnapshot`] captures the alive entities and every stored component
//! value as JSON, keyed so that serialization order is canonical. Two
//! worlds that went through the same simulation produce byte-identical
//! snapshots and therefore the same [`WorldSnapshot::hash`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;
use crate::entity::EntityId;
use crate::world::World;
use crate::EcsError;

/// Serializable view of the world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Alive entities, ascending.
    pub entities: Vec<EntityId>,
    /// Component name -> raw entity id -> value.
    pub components: BTreeMap<String, BTreeMap<u64, serde_json::Value>>,
}

impl WorldSnapshot {
    /// BLAKE3 hex digest of the canonical JSON encoding.
    pub fn hash(&self) -> String {
        let bytes =
            serde_json::to_vec(self).expect("WorldSnapshot should always be JSON-serializable");
        blake3::hash(&bytes).to_hex().to_string()
    }

    /// Value of `component` for `entity`, if captured.
    pub fn value(&self, entity: EntityId, component: &str) -> Option<&serde_json::Value> {
        self.components.get(component)?.get(&entity.to_raw())
    }
}

impl World {
    /// Capture every alive entity and component value.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentSerialization`] if a component value cannot be
    /// represented as JSON.
    pub fn snapshot(&self) -> Result<WorldSnapshot, EcsError> {
        let mut components = BTreeMap::new();
        for (idx, store) in self.stores.iter().enumerate() {
            let name = self.registry.name_of(ComponentTypeId(idx as u32));
            let mut values = BTreeMap::new();
            for entity in store.entities() {
                let value = store
                    .get_json(entity)
                    .map_err(|details| EcsError::ComponentSerialization {
                        component: name.to_owned(),
                        details,
                    })?;
                if let Some(value) = value {
                    values.insert(entity.to_raw(), value);
                }
            }
            components.insert(name.to_owned(), values);
        }
        Ok(WorldSnapshot {
            entities: self.entities(),
            components,
        })
    }

    /// Shorthand for `self.snapshot()?.hash()`.
    pub fn state_hash(&self) -> Result<String, EcsError> {
        Ok(self.snapshot()?.hash())
    }
}
