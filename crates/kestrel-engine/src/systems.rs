//! Reference gameplay components and systems.
//!
//! These are the building blocks most game clients start from: kinematic
//! movement, health regeneration and timed despawn. They are ordinary
//! [`System`] implementations and only touch the world through queries and
//! component handles.

use std::ops::{Add, AddAssign, Mul};

use kestrel_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::system::System;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// 3D vector in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise clamp into `[min, max]`. An inverted range yields `max`.
    pub fn clamp(self, min: Vec3, max: Vec3) -> Self {
        Self {
            x: self.x.max(min.x).min(max.x),
            y: self.y.max(min.y).min(max.y),
            z: self.z.max(min.z).min(max.z),
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// World-space placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
}

/// Linear velocity in units per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

/// Hit points. `alive == false` entities do not regenerate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub hp: f32,
    pub max: f32,
    pub alive: bool,
}

impl Health {
    pub fn new(hp: f32, max: f32) -> Self {
        Self {
            hp,
            max,
            alive: hp > 0.0,
        }
    }
}

/// Axis-aligned box that movement keeps the entity inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Seconds until the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f32,
}

/// Handles for the components registered by [`register_core_components`].
#[derive(Debug, Clone, Copy)]
pub struct CoreComponents {
    pub transform: ComponentHandle<Transform>,
    pub velocity: ComponentHandle<Velocity>,
    pub health: ComponentHandle<Health>,
    pub bounds: ComponentHandle<Bounds>,
    pub lifetime: ComponentHandle<Lifetime>,
}

/// Register the reference components under their conventional names
/// (`"Transform"`, `"Velocity"`, `"Health"`, `"Bounds"`, `"Lifetime"`).
pub fn register_core_components(world: &mut World) -> Result<CoreComponents, EcsError> {
    Ok(CoreComponents {
        transform: world.register_component("Transform")?,
        velocity: world.register_component("Velocity")?,
        health: world.register_component("Health")?,
        bounds: world.register_component("Bounds")?,
        lifetime: world.register_component("Lifetime")?,
    })
}

// ---------------------------------------------------------------------------
// MovementSystem
// ---------------------------------------------------------------------------

/// Integrates `Transform` by `Velocity`, clamped into `Bounds` if present.
#[derive(Debug, Clone)]
pub struct MovementSystem {
    transform: ComponentHandle<Transform>,
    velocity: ComponentHandle<Velocity>,
    bounds: ComponentHandle<Bounds>,
}

impl MovementSystem {
    pub const NAME: &'static str = "movement";
    pub const PRIORITY: i32 = 100;

    pub fn new(components: &CoreComponents) -> Self {
        Self {
            transform: components.transform,
            velocity: components.velocity,
            bounds: components.bounds,
        }
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn update(&mut self, world: &mut World, dt: f64) -> anyhow::Result<()> {
        let dt = dt as f32;
        let query = Query::new().with(self.transform).with(self.velocity);
        for entity in world.run_query(&query)? {
            let velocity = world.component(entity, self.velocity)?.0;
            let bounds = world.get(entity, self.bounds)?.copied();
            world.modify(entity, self.transform, |t| {
                t.position += velocity * dt;
                if let Some(b) = bounds {
                    t.position = t.position.clamp(b.min, b.max);
                }
            })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HealthRegenSystem
// ---------------------------------------------------------------------------

/// Regenerates `rate` hit points per second, never past `max`.
#[derive(Debug, Clone)]
pub struct HealthRegenSystem {
    rate: f32,
    health: ComponentHandle<Health>,
}

impl HealthRegenSystem {
    pub const NAME: &'static str = "health_regen";
    pub const PRIORITY: i32 = 200;

    pub fn new(components: &CoreComponents, rate: f32) -> Self {
        Self {
            rate,
            health: components.health,
        }
    }

    /// Hit points per second.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl System for HealthRegenSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn update(&mut self, world: &mut World, dt: f64) -> anyhow::Result<()> {
        let gain = self.rate * dt as f32;
        for entity in world.run_query(&Query::new().with(self.health))? {
            world.modify(entity, self.health, |h| {
                if h.alive {
                    h.hp = (h.hp + gain).min(h.max);
                }
            })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LifetimeSystem
// ---------------------------------------------------------------------------

/// Counts down `Lifetime` and destroys entities whose time ran out.
#[derive(Debug, Clone)]
pub struct LifetimeSystem {
    lifetime: ComponentHandle<Lifetime>,
}

impl LifetimeSystem {
    pub const NAME: &'static str = "lifetime";
    pub const PRIORITY: i32 = 900;

    pub fn new(components: &CoreComponents) -> Self {
        Self {
            lifetime: components.lifetime,
        }
    }
}

impl System for LifetimeSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn update(&mut self, world: &mut World, dt: f64) -> anyhow::Result<()> {
        let dt = dt as f32;
        for entity in world.run_query(&Query::new().with(self.lifetime))? {
            let remaining = world.modify(entity, self.lifetime, |l| {
                l.remaining -= dt;
                l.remaining
            })?;
            if remaining <= 0.0 {
                debug!(%entity, "lifetime expired");
                world.destroy_entity(entity);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
