//! Fixed-timestep tick loop.
//!
//! The [`TickLoop`] owns the [`World`] and the [`Scheduler`] and turns
//! variable host frame times into a whole number of fixed simulation ticks.
//! Each tick is one `scheduler.update(world, fixed_dt)`.
//!
//! # Example
//!
//! ```
//! use kestrel_engine::prelude::*;
//!
//! let config = TickConfig { fixed_dt: 0.25, ..Default::default() };
//! let mut tick_loop = TickLoop::new(World::new(), config).unwrap();
//! tick_loop
//!     .add_system(FnSystem::new("example", 0, |_world, _dt| Ok(())))
//!     .unwrap();
//!
//! // Half a second of frame time is two fixed ticks.
//! assert_eq!(tick_loop.advance(0.5).unwrap(), 2);
//! assert_eq!(tick_loop.tick_count(), 2);
//! ```

use std::time::{Duration, Instant};

use kestrel_ecs::world::World;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::scheduler::{Scheduler, SchedulerError};
use crate::system::System;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Most ticks [`TickLoop::advance`] runs for a single frame. Backlog
    /// beyond this is dropped.
    pub max_steps_per_frame: u32,
}

impl Default for TickConfig {
    /// 60 Hz, at most 8 catch-up ticks per frame.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_steps_per_frame: 8,
        }
    }
}

impl TickConfig {
    /// Check the invariants the loop relies on.
    pub fn validate(&self) -> Result<(), TickError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(TickError::InvalidConfig(format!(
                "fixed_dt must be positive and finite, got {}",
                self.fixed_dt
            )));
        }
        if self.max_steps_per_frame == 0 {
            return Err(TickError::InvalidConfig(
                "max_steps_per_frame must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the [`TickLoop`].
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("invalid tick configuration: {0}")]
    InvalidConfig(String),

    #[error("frame time must be finite and non-negative, got {0}")]
    InvalidFrameTime(f64),

    #[error("tick {tick} failed")]
    Tick {
        tick: u64,
        #[source]
        source: SchedulerError,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system, in execution order.
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Deterministic fixed-timestep driver.
///
/// Simulation time is `tick_count * fixed_dt`, never an accumulated sum,
/// so it does not drift.
#[derive(Debug)]
pub struct TickLoop {
    world: World,
    scheduler: Scheduler,
    config: TickConfig,
    tick_counter: u64,
    /// Unsimulated frame time, always below `fixed_dt` between frames.
    accumulator: f64,
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a tick loop around `world`.
    ///
    /// # Errors
    ///
    /// [`TickError::InvalidConfig`] if `config` fails validation.
    pub fn new(world: World, config: TickConfig) -> Result<Self, TickError> {
        config.validate()?;
        Ok(Self {
            world,
            scheduler: Scheduler::new(),
            config,
            tick_counter: 0,
            accumulator: 0.0,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Schedule a system. See [`Scheduler::add`].
    pub fn add_system(&mut self, system: impl System + 'static) -> Result<(), TickError> {
        self.scheduler.add(system)?;
        Ok(())
    }

    /// Run exactly one fixed tick.
    ///
    /// The tick counter only advances if every system succeeded.
    pub fn tick(&mut self) -> Result<(), TickError> {
        let started = Instant::now();
        let result = self.scheduler.update(&mut self.world, self.config.fixed_dt);
        self.last_diagnostics = TickDiagnostics {
            system_times: self.scheduler.last_timings().to_vec(),
            total_time: started.elapsed(),
        };
        result.map_err(|source| TickError::Tick {
            tick: self.tick_counter,
            source,
        })?;
        self.tick_counter += 1;
        Ok(())
    }

    /// Run `count` ticks, stopping at the first failure.
    pub fn run_ticks(&mut self, count: u64) -> Result<(), TickError> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    /// Feed `frame_seconds` of host time and run every whole tick that fits,
    /// up to `max_steps_per_frame`. Returns the number of ticks run.
    pub fn advance(&mut self, frame_seconds: f64) -> Result<u32, TickError> {
        if !(frame_seconds >= 0.0 && frame_seconds.is_finite()) {
            return Err(TickError::InvalidFrameTime(frame_seconds));
        }
        let dt = self.config.fixed_dt;
        self.accumulator += frame_seconds;

        let mut steps = 0;
        while self.accumulator >= dt && steps < self.config.max_steps_per_frame {
            self.tick()?;
            self.accumulator -= dt;
            steps += 1;
        }
        if self.accumulator >= dt {
            let dropped = self.accumulator - self.accumulator % dt;
            warn!(
                dropped_seconds = dropped,
                max_steps = self.config.max_steps_per_frame,
                "simulation falling behind, dropping frame time"
            );
            self.accumulator %= dt;
        }
        Ok(steps)
    }

    // -- accessors ----------------------------------------------------------

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds, `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// Fraction of a tick left in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.config.fixed_dt
    }

    /// Seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// The active configuration.
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Read-only access to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Mutable access to the scheduler, e.g. to remove a system.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Give back the world, dropping the loop.
    pub fn into_world(self) -> World {
        self.world
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::FnSystem;
    use kestrel_ecs::component::ComponentHandle;

    fn counting_loop(config: TickConfig) -> (TickLoop, ComponentHandle<u64>) {
        let mut world = World::new();
        let counter = world.register_component::<u64>("Counter").unwrap();
        let e = world.create_entity();
        world.insert(e, counter, 0).unwrap();

        let mut tick_loop = TickLoop::new(world, config).unwrap();
        tick_loop
            .add_system(FnSystem::new("count", 0, move |w, _dt| {
                for entity in w.query(&["Counter"], &[])? {
                    w.modify(entity, counter, |c| *c += 1)?;
                }
                Ok(())
            }))
            .unwrap();
        (tick_loop, counter)
    }

    fn count_of(tick_loop: &TickLoop, counter: ComponentHandle<u64>) -> u64 {
        let world = tick_loop.world();
        let e = world.entities()[0];
        *world.component(e, counter).unwrap()
    }

    #[test]
    fn new_tick_loop_starts_at_zero() {
        let tick_loop = TickLoop::new(World::new(), TickConfig::default()).unwrap();
        assert_eq!(tick_loop.tick_count(), 0);
        assert_eq!(tick_loop.sim_time(), 0.0);
        assert!(tick_loop.scheduler().is_empty());
    }

    #[test]
    fn default_config_is_60hz() {
        let config = TickConfig::default();
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_configs_rejected() {
        for fixed_dt in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let config = TickConfig {
                fixed_dt,
                ..Default::default()
            };
            assert!(matches!(
                TickLoop::new(World::new(), config),
                Err(TickError::InvalidConfig(_))
            ));
        }
        let config = TickConfig {
            max_steps_per_frame: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: TickConfig = serde_json::from_str(r#"{"fixed_dt": 0.02}"#).unwrap();
        assert_eq!(config.fixed_dt, 0.02);
        assert_eq!(config.max_steps_per_frame, 8);
    }

    #[test]
    fn run_ticks_advances_counter_and_systems() {
        let (mut tick_loop, counter) = counting_loop(TickConfig::default());
        tick_loop.run_ticks(10).unwrap();
        assert_eq!(tick_loop.tick_count(), 10);
        assert_eq!(count_of(&tick_loop, counter), 10);
        assert_eq!(tick_loop.last_diagnostics().system_times.len(), 1);
        assert_eq!(tick_loop.last_diagnostics().system_times[0].0, "count");
    }

    #[test]
    fn sim_time_computed_not_accumulated() {
        let config = TickConfig {
            fixed_dt: 0.1,
            ..Default::default()
        };
        let mut tick_loop = TickLoop::new(World::new(), config).unwrap();
        tick_loop.run_ticks(1000).unwrap();
        assert_eq!(tick_loop.sim_time(), 1000.0 * 0.1);
    }

    #[test]
    fn advance_runs_whole_ticks_and_keeps_remainder() {
        let config = TickConfig {
            fixed_dt: 0.25,
            ..Default::default()
        };
        let (mut tick_loop, counter) = counting_loop(config);

        assert_eq!(tick_loop.advance(0.125).unwrap(), 0);
        assert_eq!(tick_loop.alpha(), 0.5);
        assert_eq!(tick_loop.advance(0.625).unwrap(), 3);
        assert_eq!(tick_loop.alpha(), 0.0);
        assert_eq!(count_of(&tick_loop, counter), 3);
    }

    #[test]
    fn advance_caps_catch_up_and_drops_backlog() {
        let config = TickConfig {
            fixed_dt: 0.25,
            max_steps_per_frame: 2,
        };
        let (mut tick_loop, counter) = counting_loop(config);

        assert_eq!(tick_loop.advance(1.125).unwrap(), 2);
        assert_eq!(tick_loop.alpha(), 0.5);
        assert_eq!(tick_loop.advance(0.0).unwrap(), 0);
        assert_eq!(count_of(&tick_loop, counter), 2);
    }

    #[test]
    fn advance_rejects_bad_frame_time() {
        let mut tick_loop = TickLoop::new(World::new(), TickConfig::default()).unwrap();
        assert!(matches!(
            tick_loop.advance(-0.1),
            Err(TickError::InvalidFrameTime(_))
        ));
        assert!(tick_loop.advance(f64::NAN).is_err());
    }

    #[test]
    fn failed_tick_does_not_advance_counter() {
        let mut tick_loop = TickLoop::new(World::new(), TickConfig::default()).unwrap();
        tick_loop
            .add_system(FnSystem::new("boom", 0, |_w, _dt| anyhow::bail!("boom")))
            .unwrap();

        let err = tick_loop.tick().unwrap_err();
        assert!(matches!(err, TickError::Tick { tick: 0, .. }));
        assert_eq!(tick_loop.tick_count(), 0);
    }

    #[test]
    fn duplicate_system_surfaces_as_scheduler_error() {
        let mut tick_loop = TickLoop::new(World::new(), TickConfig::default()).unwrap();
        tick_loop
            .add_system(FnSystem::new("a", 0, |_w, _dt| Ok(())))
            .unwrap();
        assert!(matches!(
            tick_loop.add_system(FnSystem::new("a", 1, |_w, _dt| Ok(()))),
            Err(TickError::Scheduler(SchedulerError::DuplicateSystem { .. }))
        ));
    }
}
