//! The [`World`] is the composition root of the ECS. It owns the entity
//! registry, the component registry, and one store per registered
//! component name.
//!
//! Every entity-scoped operation checks liveness first: reads and writes
//! against a dead or stale [`EntityId`] fail with
//! [`EcsError::DeadEntity`], so a destroyed entity can never be resurrected
//! by a late write.

use std::any::TypeId;

use tracing::{debug, warn};

use crate::component::{Component, ComponentHandle, ComponentRegistry, ComponentTypeId};
use crate::entity::{EntityAllocator, EntityId};
use crate::store::{AnyStore, ComponentStore};
use crate::EcsError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The top-level ECS container.
#[derive(Default)]
pub struct World {
    /// Entity registry.
    pub(crate) allocator: EntityAllocator,
    /// Component names and type metadata.
    pub(crate) registry: ComponentRegistry,
    /// Indexed by `ComponentTypeId`; always the same length as the registry.
    pub(crate) stores: Vec<Box<dyn AnyStore>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.allocator.alive_count())
            .field("components", &self.registry.registered_names())
            .finish()
    }
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- registration -------------------------------------------------------

    /// Register component type `T` under `name` with an empty store.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateRegistration`] if `name` is already bound.
    pub fn register_component<T: Component>(
        &mut self,
        name: &str,
    ) -> Result<ComponentHandle<T>, EcsError> {
        self.register_store(name, ComponentStore::new())
    }

    /// Bind `name` to an existing store instance.
    ///
    /// Every entity in `store` must be alive in this world.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateRegistration`] if `name` is already bound, or
    /// [`EcsError::DeadEntity`] for the first non-alive entity in `store`.
    pub fn register_store<T: Component>(
        &mut self,
        name: &str,
        store: ComponentStore<T>,
    ) -> Result<ComponentHandle<T>, EcsError> {
        if let Some(entity) = store
            .entities()
            .into_iter()
            .find(|e| !self.allocator.is_alive(*e))
        {
            return Err(EcsError::DeadEntity { entity });
        }
        let id = self.registry.register::<T>(name)?;
        debug_assert_eq!(id.index(), self.stores.len());
        debug!(
            component = name,
            id = id.index(),
            preloaded = store.len(),
            "registered component"
        );
        self.stores.push(Box::new(store));
        Ok(ComponentHandle::new(id))
    }

    /// Resolve a typed handle for a component registered under `name`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponent`] for unknown names,
    /// [`EcsError::ComponentTypeMismatch`] if `T` is not the registered type.
    pub fn handle<T: Component>(&self, name: &str) -> Result<ComponentHandle<T>, EcsError> {
        let id = self.registry.resolve(name)?;
        let info = self
            .registry
            .get_info(id)
            .ok_or_else(|| unknown_id(&self.registry, id))?;
        if info.type_id != TypeId::of::<T>() {
            return Err(mismatch::<T>(&self.registry, id));
        }
        Ok(ComponentHandle::new(id))
    }

    /// Names of all registered components, sorted.
    pub fn component_names(&self) -> Vec<&str> {
        self.registry.registered_names()
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create a new entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        self.allocator.allocate()
    }

    /// Destroy `entity`, removing it from every store first.
    ///
    /// Returns `false` (and does nothing) if the entity was not alive.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        let purged = self
            .stores
            .iter_mut()
            .map(|store| store.remove_entity(entity))
            .filter(|removed| *removed)
            .count();
        self.allocator.deallocate(entity);
        debug!(%entity, purged, "destroyed entity");
        true
    }

    /// Whether `entity` is alive.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// All alive entities, ascending.
    pub fn entities(&self) -> Vec<EntityId> {
        self.allocator.alive_entities()
    }

    // -- typed access -------------------------------------------------------

    /// Attach or overwrite component `T` on `entity`, returning the old value.
    pub fn insert<T: Component>(
        &mut self,
        entity: EntityId,
        handle: ComponentHandle<T>,
        value: T,
    ) -> Result<Option<T>, EcsError> {
        self.ensure_writable(entity, handle.id())?;
        Ok(self.typed_store_mut(handle)?.set(entity, value))
    }

    /// Read component `T` of `entity`. `Ok(None)` if the entity lacks it.
    pub fn get<T: Component>(
        &self,
        entity: EntityId,
        handle: ComponentHandle<T>,
    ) -> Result<Option<&T>, EcsError> {
        self.ensure_alive(entity)?;
        Ok(self.typed_store(handle)?.get(entity))
    }

    /// Mutable access to component `T` of `entity`; writes persist in place.
    pub fn get_mut<T: Component>(
        &mut self,
        entity: EntityId,
        handle: ComponentHandle<T>,
    ) -> Result<Option<&mut T>, EcsError> {
        self.ensure_alive(entity)?;
        Ok(self.typed_store_mut(handle)?.get_mut(entity))
    }

    /// Like [`get`](Self::get), but a missing component is an error.
    pub fn component<T: Component>(
        &self,
        entity: EntityId,
        handle: ComponentHandle<T>,
    ) -> Result<&T, EcsError> {
        self.get(entity, handle)?
            .ok_or_else(|| self.missing(entity, handle.id()))
    }

    /// Mutate component `T` of `entity` in place.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if the entity is alive but lacks `T`.
    pub fn modify<T: Component, R>(
        &mut self,
        entity: EntityId,
        handle: ComponentHandle<T>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, EcsError> {
        self.ensure_writable(entity, handle.id())?;
        if let Some(value) = self.typed_store_mut(handle)?.get_mut(entity) {
            return Ok(f(value));
        }
        Err(self.missing(entity, handle.id()))
    }

    /// Whether `entity` has component `T`.
    pub fn has<T: Component>(
        &self,
        entity: EntityId,
        handle: ComponentHandle<T>,
    ) -> Result<bool, EcsError> {
        self.ensure_alive(entity)?;
        Ok(self.typed_store(handle)?.has(entity))
    }

    /// Detach component `T` from `entity`. Removing an absent component is
    /// a no-op returning `Ok(None)`.
    pub fn remove<T: Component>(
        &mut self,
        entity: EntityId,
        handle: ComponentHandle<T>,
    ) -> Result<Option<T>, EcsError> {
        self.ensure_writable(entity, handle.id())?;
        Ok(self.typed_store_mut(handle)?.remove(entity))
    }

    /// Read access to the whole store behind `handle`.
    pub fn store<T: Component>(
        &self,
        handle: ComponentHandle<T>,
    ) -> Result<&ComponentStore<T>, EcsError> {
        self.typed_store(handle)
    }

    // -- name-based access --------------------------------------------------

    /// Attach or overwrite the component registered as `name`, decoding
    /// `value` into the registered type.
    pub fn insert_by_name(
        &mut self,
        entity: EntityId,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), EcsError> {
        let id = self.registry.resolve(name)?;
        self.ensure_writable(entity, id)?;
        self.stores[id.index()]
            .set_json(entity, value)
            .map_err(|details| EcsError::ComponentDeserialization {
                component: name.to_owned(),
                details,
            })
    }

    /// Read the component registered as `name`, encoded as JSON.
    pub fn get_by_name(
        &self,
        entity: EntityId,
        name: &str,
    ) -> Result<Option<serde_json::Value>, EcsError> {
        let id = self.registry.resolve(name)?;
        self.ensure_alive(entity)?;
        self.stores[id.index()]
            .get_json(entity)
            .map_err(|details| EcsError::ComponentSerialization {
                component: name.to_owned(),
                details,
            })
    }

    /// Whether `entity` has the component registered as `name`.
    pub fn has_by_name(&self, entity: EntityId, name: &str) -> Result<bool, EcsError> {
        let id = self.registry.resolve(name)?;
        self.ensure_alive(entity)?;
        Ok(self.stores[id.index()].has(entity))
    }

    /// Detach the component registered as `name`. Returns whether a value
    /// was present.
    pub fn remove_by_name(&mut self, entity: EntityId, name: &str) -> Result<bool, EcsError> {
        let id = self.registry.resolve(name)?;
        self.ensure_writable(entity, id)?;
        Ok(self.stores[id.index()].remove_entity(entity))
    }

    // -- internals ----------------------------------------------------------

    pub(crate) fn ensure_alive(&self, entity: EntityId) -> Result<(), EcsError> {
        if self.allocator.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::DeadEntity { entity })
        }
    }

    /// Liveness check for mutating calls; rejected writes are logged.
    fn ensure_writable(&self, entity: EntityId, id: ComponentTypeId) -> Result<(), EcsError> {
        self.ensure_alive(entity).inspect_err(|_| {
            warn!(
                %entity,
                component = self.registry.name_of(id),
                "rejected write to dead entity"
            );
        })
    }

    pub(crate) fn erased_store(&self, id: ComponentTypeId) -> Result<&dyn AnyStore, EcsError> {
        self.stores
            .get(id.index())
            .map(|store| store.as_ref())
            .ok_or_else(|| unknown_id(&self.registry, id))
    }

    fn typed_store<T: Component>(
        &self,
        handle: ComponentHandle<T>,
    ) -> Result<&ComponentStore<T>, EcsError> {
        self.erased_store(handle.id())?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
            .ok_or_else(|| mismatch::<T>(&self.registry, handle.id()))
    }

    fn typed_store_mut<T: Component>(
        &mut self,
        handle: ComponentHandle<T>,
    ) -> Result<&mut ComponentStore<T>, EcsError> {
        let id = handle.id();
        let registry = &self.registry;
        self.stores
            .get_mut(id.index())
            .ok_or_else(|| unknown_id(registry, id))?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .ok_or_else(|| mismatch::<T>(registry, id))
    }

    fn missing(&self, entity: EntityId, id: ComponentTypeId) -> EcsError {
        EcsError::MissingComponent {
            entity,
            component: self.registry.name_of(id).to_owned(),
        }
    }
}

fn unknown_id(registry: &ComponentRegistry, id: ComponentTypeId) -> EcsError {
    EcsError::UnregisteredComponent {
        name: format!("{id:?}"),
        registered: registry.registered_names().join(", "),
    }
}

fn mismatch<T>(registry: &ComponentRegistry, id: ComponentTypeId) -> EcsError {
    EcsError::ComponentTypeMismatch {
        name: registry.name_of(id).to_owned(),
        expected: registry.get_info(id).map_or("?", |info| info.type_name),
        found: std::any::type_name::<T>(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
