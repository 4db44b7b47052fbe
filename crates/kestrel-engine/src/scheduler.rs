//! Priority-ordered system scheduler.
//!
//! Systems run in ascending [`System::priority`]; equal priorities keep
//! insertion order. Each [`Scheduler::update`] first initializes every
//! system that has not been initialized yet (in order), then runs every
//! system's update (in order). Mutations made by one system are visible to
//! every later system in the same tick because they all share one
//! `&mut World`.
//!
//! An error from `init` or `update` aborts the tick: later systems do not
//! run and the error is returned to the caller. The scheduler never
//! retries or swallows failures.

use std::fmt;
use std::time::{Duration, Instant};

use kestrel_ecs::world::World;
use tracing::{debug, trace, warn};

use crate::system::System;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which hook of a system failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Update,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => f.write_str("init"),
            Phase::Update => f.write_str("update"),
        }
    }
}

/// Errors produced by the [`Scheduler`].
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A system with the same name is already scheduled.
    #[error("system '{name}' is already scheduled")]
    DuplicateSystem { name: String },

    /// A system's hook returned an error; the tick was aborted.
    #[error("system '{system}' failed during {phase}")]
    SystemFailed {
        system: String,
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Lifecycle of a scheduled system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Added, `init` not yet (successfully) run.
    Registered,
    /// `init` has completed; only `update` runs from now on.
    Initialized,
}

struct ScheduledSystem {
    system: Box<dyn System>,
    /// Captured at insertion so ordering cannot drift.
    priority: i32,
    state: SystemState,
}

/// Ordered collection of systems driven once per tick.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
    /// Wall time of each system's update in the last tick, in run order.
    last_timings: Vec<(String, Duration)>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.system_names())
            .finish()
    }
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `system`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::DuplicateSystem`] if the name is taken.
    pub fn add(&mut self, system: impl System + 'static) -> Result<(), SchedulerError> {
        self.add_boxed(Box::new(system))
    }

    /// Schedule an already boxed system.
    pub fn add_boxed(&mut self, system: Box<dyn System>) -> Result<(), SchedulerError> {
        if self.position(system.name()).is_some() {
            return Err(SchedulerError::DuplicateSystem {
                name: system.name().to_owned(),
            });
        }
        let priority = system.priority();
        // After every existing system with priority <= ours: ties keep
        // insertion order.
        let at = self.systems.partition_point(|s| s.priority <= priority);
        debug!(system = system.name(), priority, slot = at, "scheduled system");
        self.systems.insert(
            at,
            ScheduledSystem {
                system,
                priority,
                state: SystemState::Registered,
            },
        );
        Ok(())
    }

    /// Unschedule the system called `name`, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn System>> {
        let at = self.position(name)?;
        debug!(system = name, "removed system");
        Some(self.systems.remove(at).system)
    }

    /// Run one tick: pending inits, then every update, in priority order.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::SystemFailed`] from the first failing hook. Systems
    /// after it do not run this tick.
    pub fn update(&mut self, world: &mut World, dt: f64) -> Result<(), SchedulerError> {
        for entry in self
            .systems
            .iter_mut()
            .filter(|s| s.state == SystemState::Registered)
        {
            debug!(system = entry.system.name(), "initializing system");
            entry
                .system
                .init(world)
                .map_err(|source| failure(entry.system.name(), Phase::Init, source))?;
            entry.state = SystemState::Initialized;
        }

        self.last_timings.clear();
        for entry in &mut self.systems {
            trace!(system = entry.system.name(), dt, "updating system");
            let started = Instant::now();
            let result = entry.system.update(world, dt);
            let name = entry.system.name();
            result.map_err(|source| failure(name, Phase::Update, source))?;
            self.last_timings.push((name.to_owned(), started.elapsed()));
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    /// Names in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Lifecycle state of the system called `name`.
    pub fn state(&self, name: &str) -> Option<SystemState> {
        self.position(name).map(|at| self.systems[at].state)
    }

    /// Number of scheduled systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems are scheduled.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Per-system update times of the last tick, in run order. Only the
    /// systems that completed are listed if the tick failed.
    pub fn last_timings(&self) -> &[(String, Duration)] {
        &self.last_timings
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.systems.iter().position(|s| s.system.name() == name)
    }
}

fn failure(system: &str, phase: Phase, source: anyhow::Error) -> SchedulerError {
    warn!(system, %phase, error = %source, "system failed, aborting tick");
    SchedulerError::SystemFailed {
        system: system.to_owned(),
        phase,
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
