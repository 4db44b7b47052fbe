//! Entity identifiers and the entity registry.
//!
//! An [`EntityId`] packs a *generation* in the high 32 bits and a slot
//! *index* in the low 32 bits. Indices are recycled after destruction, but
//! each reuse bumps the generation, so a handle kept across a destroy is
//! reported dead forever instead of aliasing the new occupant of its slot.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`. Ids order by index first and
/// generation second, which is the "ascending id" order queries return.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The reuse generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index()
            .cmp(&other.index())
            .then_with(|| self.generation().cmp(&other.generation()))
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates, destroys and recycles [`EntityId`]s.
///
/// Free indices are kept in a FIFO queue so that a slot is not reissued
/// immediately after it is freed.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation for each index slot.
    generations: Vec<u32>,
    /// Whether the slot is currently alive.
    alive: Vec<bool>,
    /// Recyclable indices, oldest first.
    free_indices: VecDeque<u32>,
    /// Number of alive slots.
    alive_count: usize,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`], distinct from every alive id.
    pub fn allocate(&mut self) -> EntityId {
        self.alive_count += 1;
        if let Some(index) = self.free_indices.pop_front() {
            // Generation was already bumped on deallocate.
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Mark `id` dead and queue its index for reuse.
    ///
    /// Returns `false` without touching anything if `id` is not alive
    /// (never allocated, already destroyed, or stale).
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        self.alive_count -= 1;
        true
    }

    /// Returns `true` if `id` is alive and its generation is current.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation()
    }

    /// Number of currently alive entities.
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// All alive entities, in ascending id order.
    pub fn alive_entities(&self) -> Vec<EntityId> {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(|(idx, _)| EntityId::new(idx as u32, self.generations[idx]))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
