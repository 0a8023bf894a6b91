//! Particle records and the fixed-capacity particle store.
//!
//! The store is a slot arena: exactly `capacity` slots are allocated once
//! and reused for the simulation's whole life. Spawning activates a free
//! slot, deactivating flips the flag and leaves the slot in place, so
//! indices stay stable for renderer-side buffers. Nothing here allocates
//! after construction.

use glam::Vec2;

use crate::error::ConfigError;

/// One particle slot.
///
/// `density` and `pressure` are derived fields: the step recomputes both
/// before anything reads them, every tick. `acceleration` is per-tick
/// scratch and only meaningful for the most recent step.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// Position in world coordinates.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Net acceleration accumulated by the most recent step.
    pub acceleration: Vec2,
    /// Neighborhood density from the last density pass.
    pub density: f32,
    /// Pressure derived from density; never negative.
    pub pressure: f32,
    /// Inactive slots are skipped by the simulation and the renderer.
    pub active: bool,
    /// Spawn position, kept as the reset target and the safe fallback when
    /// a particle's state goes non-finite.
    pub home: Vec2,
}

impl Particle {
    fn inactive() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            density: 0.0,
            pressure: 0.0,
            active: false,
            home: Vec2::ZERO,
        }
    }
}

/// Fixed-capacity particle arena.
pub struct ParticleStore {
    slots: Vec<Particle>,
    /// Snapshot of the slots at seed time; `reset` copies this back.
    seed: Vec<Particle>,
    active_count: usize,
}

impl ParticleStore {
    /// Allocates `capacity` inactive slots. Rejects zero capacity.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let slots = vec![Particle::inactive(); capacity];
        let seed = slots.clone();
        Ok(Self { slots, seed, active_count: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// Read-only view of every slot, active or not, in index order.
    pub fn particles(&self) -> &[Particle] {
        &self.slots
    }

    /// Activates the lowest-index free slot, or returns `None` when the
    /// arena is full. Callers are expected to check this on every spawn
    /// attempt; running out of slots is an ordinary condition, not a
    /// failure.
    pub fn spawn(&mut self, position: Vec2, velocity: Vec2) -> Option<usize> {
        if self.active_count == self.slots.len() {
            return None;
        }
        let idx = self.slots.iter().position(|p| !p.active)?;
        self.slots[idx] = Particle {
            position,
            velocity,
            acceleration: Vec2::ZERO,
            density: 0.0,
            pressure: 0.0,
            active: true,
            home: position,
        };
        self.active_count += 1;
        Some(idx)
    }

    /// Marks a slot inactive. The slot's memory stays in place so other
    /// indices are unaffected; the slot becomes spawnable again.
    pub fn deactivate(&mut self, index: usize) {
        if self.slots[index].active {
            self.slots[index].active = false;
            self.active_count -= 1;
        }
    }

    /// Visits active particles in stable index order.
    pub fn for_each_active<F: FnMut(usize, &Particle)>(&self, mut f: F) {
        for (i, p) in self.slots.iter().enumerate() {
            if p.active {
                f(i, p);
            }
        }
    }

    /// Mutating variant of [`ParticleStore::for_each_active`], same order.
    pub fn for_each_active_mut<F: FnMut(usize, &mut Particle)>(&mut self, mut f: F) {
        for (i, p) in self.slots.iter_mut().enumerate() {
            if p.active {
                f(i, p);
            }
        }
    }

    /// Records the current slots as the seed configuration that `reset`
    /// restores. Constructors commit the initial (empty) state; hosts
    /// re-commit after placing their starting particles.
    pub fn commit_seed(&mut self) {
        self.seed.copy_from_slice(&self.slots);
    }

    /// Restores every slot to the committed seed state and reactivates
    /// exactly the seeded subset. No allocation; idempotent.
    pub fn reset(&mut self) {
        self.slots.copy_from_slice(&self.seed);
        self.active_count = self.slots.iter().filter(|p| p.active).count();
    }

    #[cfg(test)]
    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(ParticleStore::new(0), Err(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn spawn_fills_exactly_capacity() {
        let mut store = ParticleStore::new(8).unwrap();
        for i in 0..8 {
            let idx = store.spawn(Vec2::new(i as f32, 0.0), Vec2::ZERO);
            assert_eq!(idx, Some(i));
        }
        assert_eq!(store.spawn(Vec2::ZERO, Vec2::ZERO), None);
        assert_eq!(store.active_count(), 8);
    }

    #[test]
    fn deactivate_keeps_other_indices_stable() {
        let mut store = ParticleStore::new(4).unwrap();
        for i in 0..3 {
            store.spawn(Vec2::new(i as f32, 0.0), Vec2::ZERO);
        }
        store.deactivate(1);
        assert_eq!(store.active_count(), 2);
        assert_eq!(store.particles()[0].position.x, 0.0);
        assert_eq!(store.particles()[2].position.x, 2.0);
        assert!(!store.particles()[1].active);
    }

    #[test]
    fn deactivated_slot_is_reused() {
        let mut store = ParticleStore::new(3).unwrap();
        for i in 0..3 {
            store.spawn(Vec2::new(i as f32, 0.0), Vec2::ZERO);
        }
        store.deactivate(1);
        let idx = store.spawn(Vec2::new(9.0, 0.0), Vec2::ZERO);
        assert_eq!(idx, Some(1));
        assert_eq!(store.active_count(), 3);
    }

    #[test]
    fn double_deactivate_is_harmless() {
        let mut store = ParticleStore::new(2).unwrap();
        store.spawn(Vec2::ZERO, Vec2::ZERO);
        store.deactivate(0);
        store.deactivate(0);
        assert_eq!(store.active_count(), 0);
    }

    #[test]
    fn reset_restores_committed_seed() {
        let mut store = ParticleStore::new(4).unwrap();
        store.spawn(Vec2::new(1.0, 2.0), Vec2::ZERO);
        store.spawn(Vec2::new(3.0, 4.0), Vec2::ZERO);
        store.commit_seed();

        store.spawn(Vec2::new(5.0, 6.0), Vec2::ZERO);
        store.for_each_active_mut(|_, p| p.position += Vec2::splat(10.0));
        store.reset();

        assert_eq!(store.active_count(), 2);
        assert_eq!(store.particles()[0].position, Vec2::new(1.0, 2.0));
        assert_eq!(store.particles()[1].position, Vec2::new(3.0, 4.0));
        assert!(!store.particles()[2].active);
    }

    #[test]
    fn iteration_order_is_index_order() {
        let mut store = ParticleStore::new(5).unwrap();
        for i in 0..5 {
            store.spawn(Vec2::new(i as f32, 0.0), Vec2::ZERO);
        }
        store.deactivate(2);
        let mut seen = Vec::new();
        store.for_each_active(|i, _| seen.push(i));
        assert_eq!(seen, vec![0, 1, 3, 4]);
    }
}
