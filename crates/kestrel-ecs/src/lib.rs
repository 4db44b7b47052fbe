//! Kestrel ECS -- entity registry, per-type component stores and
//! include/exclude queries.
//!
//! The [`World`](world::World) owns a generational entity registry and one
//! [`ComponentStore`](store::ComponentStore) per registered component name.
//! Registration hands back a typed [`ComponentHandle`](component::ComponentHandle)
//! for checked access; the registered name stays usable for dynamic,
//! JSON-based access by tooling.
//!
//! # Quick Start
//!
//! ```
//! use kestrel_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut world = World::new();
//! let pos = world.register_component::<Position>("Position").unwrap();
//! let vel = world.register_component::<Velocity>("Velocity").unwrap();
//!
//! let entity = world.create_entity();
//! world.insert(entity, pos, Position { x: 0.0, y: 0.0 }).unwrap();
//! world.insert(entity, vel, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
//!
//! assert_eq!(world.query(&["Position", "Velocity"], &[]).unwrap(), vec![entity]);
//! assert_eq!(world.get(entity, pos).unwrap(), Some(&Position { x: 0.0, y: 0.0 }));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A component name or id was used that was never registered.
    #[error("component '{name}' not registered. Registered components: [{registered}]")]
    UnregisteredComponent { name: String, registered: String },

    /// The entity was destroyed, is a stale handle, or was never created.
    #[error("entity {entity} is not alive")]
    DeadEntity { entity: entity::EntityId },

    /// `register_component` was called twice with the same name.
    #[error("component '{name}' is already registered")]
    DuplicateRegistration { name: String },

    /// The entity is alive but lacks the requested component.
    #[error("entity {entity} has no '{component}' component")]
    MissingComponent {
        entity: entity::EntityId,
        component: String,
    },

    /// A typed lookup used a different Rust type than the registration.
    #[error("component '{name}' stores {expected}, not {found}")]
    ComponentTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A JSON value did not match the registered component type.
    #[error("failed to deserialize component '{component}': {details}")]
    ComponentDeserialization { component: String, details: String },

    /// A component value could not be encoded as JSON.
    #[error("failed to serialize component '{component}': {details}")]
    ComponentSerialization { component: String, details: String },

    /// A query named no components to include.
    #[error("query must include at least one component")]
    EmptyQuery,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentHandle, ComponentRegistry, ComponentTypeId};
    pub use crate::entity::EntityId;
    pub use crate::query::Query;
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::store::{AnyStore, ComponentStore};
    pub use crate::world::World;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
