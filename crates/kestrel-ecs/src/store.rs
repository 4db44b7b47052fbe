//! Per-type component storage.
//!
//! A [`ComponentStore<T>`] maps entities to values of one component type.
//! The [`World`](crate::world::World) keeps stores behind the object-safe
//! [`AnyStore`] trait so it can cascade entity destruction, answer
//! membership questions for queries, and offer name-based JSON access
//! without knowing `T`.
//!
//! `get` hands out a shared borrow of the live value and `get_mut` an
//! exclusive one. Writes through `get_mut` persist immediately; there is no
//! copy-out/copy-in step. Clone the value if you need to keep it past the
//! next world mutation.

use std::any::Any;
use std::collections::BTreeMap;

use crate::component::Component;
use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Storage for a single component type, ordered by [`EntityId`].
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    values: BTreeMap<EntityId, T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value for `entity`, or `None` if it has none.
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.values.get(&entity)
    }

    /// Mutable access to the live value for `entity`.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.values.get_mut(&entity)
    }

    /// Insert or fully replace the value for `entity`, returning the old one.
    pub fn set(&mut self, entity: EntityId, value: T) -> Option<T> {
        self.values.insert(entity, value)
    }

    /// Whether `entity` has a value in this store.
    pub fn has(&self, entity: EntityId) -> bool {
        self.values.contains_key(&entity)
    }

    /// Remove the value for `entity`. Absent entries are a no-op.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.values.remove(&entity)
    }

    /// Snapshot of the owning entities, ascending.
    pub fn entities(&self) -> Vec<EntityId> {
        self.values.keys().copied().collect()
    }

    /// Iterate `(entity, value)` pairs in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.values.iter().map(|(e, v)| (*e, v))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> FromIterator<(EntityId, T)> for ComponentStore<T> {
    fn from_iter<I: IntoIterator<Item = (EntityId, T)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnyStore
// ---------------------------------------------------------------------------

/// Type-erased view of a [`ComponentStore`].
pub trait AnyStore: Send + Sync {
    /// `std::any::type_name` of the stored component.
    fn type_name(&self) -> &'static str;
    /// Whether `entity` has a value.
    fn has(&self, entity: EntityId) -> bool;
    /// Drop the value for `entity`; returns whether one was present.
    fn remove_entity(&mut self, entity: EntityId) -> bool;
    /// Snapshot of the owning entities, ascending.
    fn entities(&self) -> Vec<EntityId>;
    /// Number of stored values.
    fn len(&self) -> usize;
    /// Whether the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Serialize the value for `entity`, `Ok(None)` when absent.
    fn get_json(&self, entity: EntityId) -> Result<Option<serde_json::Value>, String>;
    /// Deserialize `value` and store it for `entity`.
    fn set_json(&mut self, entity: EntityId, value: serde_json::Value) -> Result<(), String>;
    /// Upcast for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn has(&self, entity: EntityId) -> bool {
        ComponentStore::has(self, entity)
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn entities(&self) -> Vec<EntityId> {
        ComponentStore::entities(self)
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn get_json(&self, entity: EntityId) -> Result<Option<serde_json::Value>, String> {
        self.get(entity)
            .map(|v| serde_json::to_value(v).map_err(|e| e.to_string()))
            .transpose()
    }

    fn set_json(&mut self, entity: EntityId, value: serde_json::Value) -> Result<(), String> {
        let typed: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
        self.set(entity, typed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
