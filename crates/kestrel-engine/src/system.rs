//! The [`System`] trait and a closure adapter.
//!
//! A system is a named, prioritized unit of per-tick logic. It holds only
//! configuration (a rate, a set of component handles); gameplay state lives
//! in components on the [`World`].

use kestrel_ecs::world::World;

/// Per-tick simulation logic driven by the [`Scheduler`](crate::scheduler::Scheduler).
///
/// Lower [`priority`](Self::priority) runs earlier. [`init`](Self::init) is
/// called exactly once before the first [`update`](Self::update).
pub trait System {
    /// Unique name within a scheduler; used in logs and errors.
    fn name(&self) -> &str;

    /// Ordering key. Read once, when the system is added.
    fn priority(&self) -> i32 {
        0
    }

    /// One-time setup before the first update.
    fn init(&mut self, _world: &mut World) -> anyhow::Result<()> {
        Ok(())
    }

    /// Advance this system by `dt` seconds.
    fn update(&mut self, world: &mut World, dt: f64) -> anyhow::Result<()>;
}

type InitFn = Box<dyn FnMut(&mut World) -> anyhow::Result<()>>;

/// A [`System`] built from closures.
///
/// ```
/// use kestrel_engine::prelude::*;
///
/// let mut scheduler = Scheduler::new();
/// scheduler
///     .add(FnSystem::new("noop", 10, |_world, _dt| Ok(())))
///     .unwrap();
/// assert_eq!(scheduler.system_names(), vec!["noop"]);
/// ```
pub struct FnSystem<F> {
    name: String,
    priority: i32,
    init: Option<InitFn>,
    update: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut World, f64) -> anyhow::Result<()>,
{
    /// Wrap `update` as a system.
    pub fn new(name: impl Into<String>, priority: i32, update: F) -> Self {
        Self {
            name: name.into(),
            priority,
            init: None,
            update,
        }
    }

    /// Attach a one-time init hook.
    pub fn with_init(
        mut self,
        init: impl FnMut(&mut World) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.init = Some(Box::new(init));
        self
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, f64) -> anyhow::Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn init(&mut self, world: &mut World) -> anyhow::Result<()> {
        match self.init.as_mut() {
            Some(init) => init(world),
            None => Ok(()),
        }
    }

    fn update(&mut self, world: &mut World, dt: f64) -> anyhow::Result<()> {
        (self.update)(world, dt)
    }
}

impl<F> std::fmt::Debug for FnSystem<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSystem")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("has_init", &self.init.is_some())
            .finish()
    }
}
