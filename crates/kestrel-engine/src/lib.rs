//! Kestrel Engine -- priority scheduler and fixed-timestep tick loop on top
//! of [`kestrel_ecs`].
//!
//! Game logic is written as [`System`](system::System)s. The
//! [`Scheduler`](scheduler::Scheduler) runs them in ascending priority,
//! initializing each once before its first update, and the
//! [`TickLoop`](tick::TickLoop) converts host frame time into fixed ticks.
//!
//! # Quick Start
//!
//! ```
//! use kestrel_engine::prelude::*;
//!
//! let mut world = World::new();
//! let c = register_core_components(&mut world).unwrap();
//! let ship = world.create_entity();
//! world.insert(ship, c.transform, Transform::default()).unwrap();
//! world.insert(ship, c.velocity, Velocity(Vec3::new(2.0, 0.0, 0.0))).unwrap();
//!
//! let config = TickConfig { fixed_dt: 0.5, ..Default::default() };
//! let mut tick_loop = TickLoop::new(world, config).unwrap();
//! tick_loop.add_system(MovementSystem::new(&c)).unwrap();
//!
//! tick_loop.run_ticks(4).unwrap();
//! let pos = tick_loop.world().component(ship, c.transform).unwrap().position;
//! assert_eq!(pos, Vec3::new(4.0, 0.0, 0.0));
//! ```

#![deny(unsafe_code)]

pub mod logging;
pub mod scheduler;
pub mod system;
pub mod systems;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use kestrel_ecs;

pub use scheduler::SchedulerError;
pub use tick::TickError;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use kestrel_ecs::prelude::*;

    pub use crate::logging::init_tracing;
    pub use crate::scheduler::{Phase, Scheduler, SchedulerError, SystemState};
    pub use crate::system::{FnSystem, System};
    pub use crate::systems::{
        register_core_components, Bounds, CoreComponents, Health, HealthRegenSystem, Lifetime,
        LifetimeSystem, MovementSystem, Transform, Vec3, Velocity,
    };
    pub use crate::tick::{TickConfig, TickDiagnostics, TickError, TickLoop};
}
