//! Component type registration and metadata.
//!
//! Every component type used by a [`World`](crate::world::World) is
//! registered under a unique name. Registration produces a
//! [`ComponentTypeId`] (a dense index into the world's store table) and a
//! typed [`ComponentHandle`] that systems keep for compile-time checked
//! access. Names stay available for tooling and dynamic access.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::EcsError;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Bound satisfied by every type that can be stored as a component.
///
/// Blanket-implemented; component types only need the usual derives.
pub trait Component: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> Component for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// Position of this component's store in the world's store table.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentHandle
// ---------------------------------------------------------------------------

/// Typed token for a registered component, returned by
/// [`World::register_component`](crate::world::World::register_component).
///
/// Handles are only meaningful for the world that issued them.
pub struct ComponentHandle<T> {
    id: ComponentTypeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentHandle<T> {
    pub(crate) fn new(id: ComponentTypeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The untyped id behind this handle.
    #[inline]
    pub fn id(self) -> ComponentTypeId {
        self.id
    }
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentHandle<T> {}

impl<T> PartialEq for ComponentHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ComponentHandle<T> {}

impl<T> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ComponentHandle<{}>({})",
            std::any::type_name::<T>(),
            self.id.0
        )
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Id assigned at registration time.
    pub id: ComponentTypeId,
    /// Registered name, e.g. `"Transform"`.
    pub name: String,
    /// Rust `TypeId` of the stored values, checked on typed lookups.
    pub type_id: TypeId,
    /// `std::any::type_name` of the stored values, for error messages.
    pub type_name: &'static str,
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping component names to [`ComponentTypeId`]s and metadata.
///
/// A name can be registered once. The same Rust type may be registered
/// under several names; each name gets its own id and store.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_name: HashMap<String, ComponentTypeId>,
    /// Indexed by `ComponentTypeId.0`.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateRegistration`] if `name` is already bound.
    pub fn register<T: Component>(&mut self, name: &str) -> Result<ComponentTypeId, EcsError> {
        if self.by_name.contains_key(name) {
            return Err(EcsError::DuplicateRegistration {
                name: name.to_owned(),
            });
        }
        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        });
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Look up a component by its registered name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Resolve `name` or produce an [`EcsError::UnregisteredComponent`]
    /// listing what is registered.
    pub fn resolve(&self, name: &str) -> Result<ComponentTypeId, EcsError> {
        self.lookup_by_name(name)
            .ok_or_else(|| EcsError::UnregisteredComponent {
                name: name.to_owned(),
                registered: self.registered_names().join(", "),
            })
    }

    /// Metadata for a registered id.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Registered name for an id, or `"?"` for foreign ids.
    pub fn name_of(&self, id: ComponentTypeId) -> &str {
        self.get_info(id).map_or("?", |info| info.name.as_str())
    }

    /// Total number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether any component types have been registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Names of all registered component types, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
