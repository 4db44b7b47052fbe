//! Include/exclude queries over component membership.
//!
//! A query returns an owned, ascending snapshot of the alive entities that
//! have every included component and none of the excluded ones. The result
//! is a `Vec`, not a live view: systems may create, mutate or destroy
//! entities while walking it, and later queries see those changes.
//!
//! Matching is driven by the smallest include store; the remaining include
//! stores are probed for membership and exclude stores filter the result.

use crate::component::{ComponentHandle, ComponentTypeId};
use crate::entity::EntityId;
use crate::world::World;
use crate::EcsError;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Handle-based query description.
///
/// ```
/// use kestrel_ecs::prelude::*;
///
/// let mut world = World::new();
/// let pos = world.register_component::<[f32; 3]>("Position").unwrap();
/// let frozen = world.register_component::<bool>("Frozen").unwrap();
///
/// let moving = world.create_entity();
/// world.insert(moving, pos, [0.0; 3]).unwrap();
/// let stuck = world.create_entity();
/// world.insert(stuck, pos, [0.0; 3]).unwrap();
/// world.insert(stuck, frozen, true).unwrap();
///
/// let query = Query::new().with(pos).without(frozen);
/// assert_eq!(world.run_query(&query).unwrap(), vec![moving]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    include: Vec<ComponentTypeId>,
    exclude: Vec<ComponentTypeId>,
}

impl Query {
    /// An empty query. At least one [`with`](Self::with) is required before
    /// running it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require component `T`.
    pub fn with<T>(mut self, handle: ComponentHandle<T>) -> Self {
        self.include.push(handle.id());
        self
    }

    /// Reject entities that have component `T`.
    pub fn without<T>(mut self, handle: ComponentHandle<T>) -> Self {
        self.exclude.push(handle.id());
        self
    }

    /// Build from raw ids.
    pub fn from_ids(include: Vec<ComponentTypeId>, exclude: Vec<ComponentTypeId>) -> Self {
        Self { include, exclude }
    }

    /// Required component ids.
    pub fn include(&self) -> &[ComponentTypeId] {
        &self.include
    }

    /// Rejected component ids.
    pub fn exclude(&self) -> &[ComponentTypeId] {
        &self.exclude
    }
}

// ---------------------------------------------------------------------------
// World query impl
// ---------------------------------------------------------------------------

impl World {
    /// Query by component name.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponent`] for any unknown name,
    /// [`EcsError::EmptyQuery`] if `include` is empty.
    pub fn query(&self, include: &[&str], exclude: &[&str]) -> Result<Vec<EntityId>, EcsError> {
        let resolve = |names: &[&str]| {
            names
                .iter()
                .map(|name| self.registry.resolve(name))
                .collect::<Result<Vec<_>, _>>()
        };
        self.run_query(&Query::from_ids(resolve(include)?, resolve(exclude)?))
    }

    /// Run a handle-based [`Query`].
    ///
    /// # Errors
    ///
    /// [`EcsError::EmptyQuery`] if the query includes nothing, or
    /// [`EcsError::UnregisteredComponent`] for ids this world never issued.
    pub fn run_query(&self, query: &Query) -> Result<Vec<EntityId>, EcsError> {
        let include = query
            .include
            .iter()
            .map(|id| self.erased_store(*id))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude = query
            .exclude
            .iter()
            .map(|id| self.erased_store(*id))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(driver) = include.iter().min_by_key(|store| store.len()) else {
            return Err(EcsError::EmptyQuery);
        };

        Ok(driver
            .entities()
            .into_iter()
            .filter(|&entity| {
                self.allocator.is_alive(entity)
                    && include.iter().all(|store| store.has(entity))
                    && !exclude.iter().any(|store| store.has(entity))
            })
            .collect())
    }

    /// Number of entities matching `query`.
    pub fn count(&self, query: &Query) -> Result<usize, EcsError> {
        self.run_query(query).map(|matches| matches.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct A(u32);

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct B(u32);

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct C;

    struct Fixture {
        world: World,
        a: ComponentHandle<A>,
        b: ComponentHandle<B>,
        c: ComponentHandle<C>,
    }

    fn fixture() -> Fixture {
        let mut world = World::new();
        let a = world.register_component::<A>("A").unwrap();
        let b = world.register_component::<B>("B").unwrap();
        let c = world.register_component::<C>("C").unwrap();
        Fixture { world, a, b, c }
    }

    #[test]
    fn only_entity_with_both_matches() {
        let Fixture { mut world, a, b, .. } = fixture();
        let e0 = world.create_entity();
        let e1 = world.create_entity();
        let e2 = world.create_entity();
        world.insert(e0, a, A(0)).unwrap();
        world.insert(e1, a, A(1)).unwrap();
        world.insert(e1, b, B(1)).unwrap();
        world.insert(e2, b, B(2)).unwrap();

        let result = world.query(&["A", "B"], &[]).unwrap();
        assert_eq!(result, vec![e1]);
        assert_eq!(result[0].index(), 1);
    }

    #[test]
    fn exclude_filters_out() {
        let Fixture { mut world, a, c, .. } = fixture();
        let plain = world.create_entity();
        let tagged = world.create_entity();
        world.insert(plain, a, A(0)).unwrap();
        world.insert(tagged, a, A(1)).unwrap();
        world.insert(tagged, c, C).unwrap();

        assert_eq!(world.query(&["A"], &["C"]).unwrap(), vec![plain]);
        assert_eq!(
            world.run_query(&Query::new().with(a).with(c)).unwrap(),
            vec![tagged]
        );
    }

    #[test]
    fn results_are_ascending_and_repeatable() {
        let Fixture { mut world, a, b, .. } = fixture();
        let entities: Vec<_> = (0..20).map(|_| world.create_entity()).collect();
        // Insert in reverse so store order cannot be insertion order.
        for &e in entities.iter().rev() {
            world.insert(e, a, A(e.index())).unwrap();
            if e.index() % 2 == 0 {
                world.insert(e, b, B(0)).unwrap();
            }
        }

        let first = world.query(&["A", "B"], &[]).unwrap();
        let second = world.query(&["B", "A"], &[]).unwrap();
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn destroyed_entities_never_match() {
        let Fixture { mut world, a, .. } = fixture();
        let e0 = world.create_entity();
        let e1 = world.create_entity();
        world.insert(e0, a, A(0)).unwrap();
        world.insert(e1, a, A(1)).unwrap();

        world.destroy_entity(e0);
        assert_eq!(world.query(&["A"], &[]).unwrap(), vec![e1]);
    }

    #[test]
    fn result_is_a_snapshot() {
        let Fixture { mut world, a, .. } = fixture();
        let e0 = world.create_entity();
        world.insert(e0, a, A(0)).unwrap();

        let snapshot = world.run_query(&Query::new().with(a)).unwrap();
        let late = world.create_entity();
        world.insert(late, a, A(1)).unwrap();
        world.destroy_entity(e0);

        assert_eq!(snapshot, vec![e0]);
        assert_eq!(world.run_query(&Query::new().with(a)).unwrap(), vec![late]);
    }

    #[test]
    fn empty_include_is_rejected() {
        let Fixture { world, c, .. } = fixture();
        assert!(matches!(world.query(&[], &["C"]), Err(EcsError::EmptyQuery)));
        assert!(matches!(
            world.run_query(&Query::new().without(c)),
            Err(EcsError::EmptyQuery)
        ));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let Fixture { world, .. } = fixture();
        assert!(matches!(
            world.query(&["A", "Nope"], &[]),
            Err(EcsError::UnregisteredComponent { name, .. }) if name == "Nope"
        ));
        assert!(matches!(
            world.query(&["A"], &["Nope"]),
            Err(EcsError::UnregisteredComponent { .. })
        ));
    }

    #[test]
    fn count_matches_len() {
        let Fixture { mut world, b, .. } = fixture();
        for i in 0..7 {
            let e = world.create_entity();
            world.insert(e, b, B(i)).unwrap();
        }
        assert_eq!(world.count(&Query::new().with(b)).unwrap(), 7);
    }
}
