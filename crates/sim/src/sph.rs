//! Simplified SPH simulation step.
//!
//! This module ties together the particle store and spatial hash for the
//! per-frame tick:
//! 1. Clamp delta-time
//! 2. Rebuild the spatial hash from active particle positions
//! 3. Density pass (quadratic falloff weight)
//! 4. Pressure pass (clamped linear equation of state)
//! 5. Force accumulation (gravity + pressure gradient + viscosity + pointer)
//! 6. Semi-implicit Euler integration
//! 7. Boundary clamp with damped velocity reflection
//! 8. Non-finite recovery
//!
//! The weights are deliberate simplifications of real SPH: density uses
//! `(1 - d/h)^2` and forces fall off linearly with distance, instead of the
//! poly6/spiky kernels and an incompressibility solver. The engine's look
//! and its test suite are calibrated against these cheap weights; swapping
//! in physical kernels changes behavior. Forces are also accumulated from
//! each particle's own neighbor query with no pairwise symmetrization, so
//! momentum is only approximately conserved.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ConfigError, ParamError};
use crate::interaction::Interaction;
use crate::params::{Boundary, SimParams};
use crate::particle::{Particle, ParticleStore};
use crate::physics;
use crate::spatial::SpatialHash;

/// Quadratic density falloff weight: `(1 - d/h)^2` on `[0, h]`.
#[inline]
fn density_weight(dist: f32, h: f32) -> f32 {
    let q = 1.0 - dist / h;
    if q > 0.0 {
        q * q
    } else {
        0.0
    }
}

/// Linear force falloff weight: `1 - d/h` on `[0, h]`.
#[inline]
fn force_weight(dist: f32, h: f32) -> f32 {
    (1.0 - dist / h).max(0.0)
}

/// Per-step health summary returned by [`SphSimulation::step`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StepStats {
    /// Active particles this tick.
    pub active: usize,
    /// Particles reset to their spawn position after going non-finite.
    pub recovered: u32,
    /// Largest particle speed after integration (world units/s).
    pub max_speed: f32,
}

/// The simulation: exclusively owns the particle store and spatial hash.
///
/// One `step` call per host frame runs the whole pipeline synchronously.
/// `&mut self` on `step` makes overlapping ticks and mid-tick readers
/// unrepresentable; renderers borrow [`SphSimulation::particles`] between
/// steps instead. Dropping the value releases all backing storage.
pub struct SphSimulation {
    params: SimParams,
    boundary: Boundary,
    store: ParticleStore,
    grid: SpatialHash,
    // Pre-allocated per-tick buffers (no steady-state allocation).
    scratch_density: Vec<f32>,
    scratch_force: Vec<Vec2>,
}

impl SphSimulation {
    /// Allocates stores for `capacity` particles with no particles active.
    ///
    /// Rejects zero capacity and out-of-range parameters; the boundary is
    /// validated by its own constructor. The empty state is committed as
    /// the initial reset target; hosts that hand-place particles should
    /// call [`SphSimulation::commit_seed`] when done.
    pub fn new(
        capacity: usize,
        boundary: Boundary,
        params: SimParams,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let store = ParticleStore::new(capacity)?;
        let grid = SpatialHash::new(params.smoothing_radius)?;
        Ok(Self {
            params,
            boundary,
            store,
            grid,
            scratch_density: vec![0.0; capacity],
            scratch_force: vec![Vec2::ZERO; capacity],
        })
    }

    /// Like [`SphSimulation::new`], then seeds a jittered lattice block of
    /// particles in the upper half of the boundary and commits it as the
    /// reset configuration. The same `seed` reproduces the same block.
    pub fn with_seeded_block(
        capacity: usize,
        boundary: Boundary,
        params: SimParams,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let mut sim = Self::new(capacity, boundary, params)?;
        let spacing = 0.5 * sim.params.smoothing_radius;
        let size = boundary.size();
        let x0 = boundary.min.x + 0.25 * size.x;
        let x1 = boundary.min.x + 0.75 * size.x;
        let y0 = boundary.min.y + 0.55 * size.y;
        let y1 = boundary.min.y + 0.90 * size.y;
        // Small jitter breaks the lattice symmetry so the block does not
        // collapse as perfectly aligned columns.
        let jitter = 0.2 * spacing;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut y = y1;
        'rows: while y >= y0 {
            let mut x = x0;
            while x <= x1 {
                let offset =
                    Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * jitter;
                if sim.store.spawn(Vec2::new(x, y) + offset, Vec2::ZERO).is_none() {
                    break 'rows;
                }
                x += spacing;
            }
            y -= spacing;
        }
        sim.commit_seed();
        Ok(sim)
    }

    /// Runs one simulation tick.
    ///
    /// `dt` is clamped to `params.max_dt`; non-positive or non-finite `dt`
    /// skips the tick entirely. `interaction` is this frame's pointer
    /// force, or `None` while the pointer is idle.
    pub fn step(&mut self, dt: f32, interaction: Option<&Interaction>) -> StepStats {
        let dt = if dt.is_finite() { dt.min(self.params.max_dt) } else { 0.0 };
        if dt <= 0.0 || self.store.is_empty() {
            return StepStats { active: self.store.active_count(), ..StepStats::default() };
        }

        // The hash cell size follows the smoothing radius, whichever path
        // mutated it since the last tick.
        if self.grid.cell_size() != self.params.smoothing_radius {
            self.grid.resize_cells(self.params.smoothing_radius);
        }

        self.rebuild_grid();
        self.density_pressure_pass();
        self.accumulate_forces(interaction);
        self.integrate(dt)
    }

    /// Step 2: full spatial hash rebuild from active positions.
    fn rebuild_grid(&mut self) {
        self.grid.clear();
        let grid = &mut self.grid;
        self.store.for_each_active(|i, p| grid.insert(i as u32, p.position));
    }

    /// Steps 3 and 4: per-particle density from the neighborhood, then
    /// pressure through the equation of state.
    ///
    /// Pressure is clamped at zero: this fluid has no tensile forces, so
    /// particles push apart but never pull together through pressure.
    fn density_pressure_pass(&mut self) {
        let h = self.params.smoothing_radius;
        let particles = self.store.particles();
        let grid = &self.grid;
        let densities = &mut self.scratch_density;

        for (i, p) in particles.iter().enumerate() {
            if !p.active {
                densities[i] = 0.0;
                continue;
            }
            // Self contribution is the weight at distance zero.
            let mut density = density_weight(0.0, h);
            grid.for_each_neighbor(p.position, h, |j, dist| {
                if j as usize != i {
                    density += density_weight(dist, h);
                }
            });
            densities[i] = density.max(physics::DENSITY_EPSILON);
        }

        let stiffness = self.params.stiffness;
        let rest_density = self.params.rest_density;
        let densities = &self.scratch_density;
        self.store.for_each_active_mut(|i, p| {
            p.density = densities[i];
            p.pressure = (stiffness * (p.density - rest_density)).max(0.0);
        });
    }

    /// Step 5: net acceleration per particle. Particles have unit mass, so
    /// forces and accelerations coincide.
    fn accumulate_forces(&mut self, interaction: Option<&Interaction>) {
        let h = self.params.smoothing_radius;
        let viscosity = self.params.viscosity;
        let gravity = Vec2::new(0.0, -self.params.gravity);
        let pointer_strength = self.params.interaction_strength;
        let pointer_radius = self.params.interaction_radius;

        let particles = self.store.particles();
        let grid = &self.grid;
        let forces = &mut self.scratch_force;

        for (i, p_i) in particles.iter().enumerate() {
            if !p_i.active {
                forces[i] = Vec2::ZERO;
                continue;
            }
            let pos_i = p_i.position;
            let vel_i = p_i.velocity;
            let pressure_i = p_i.pressure;

            let mut acc = gravity;
            grid.for_each_neighbor(pos_i, h, |j, dist| {
                let j = j as usize;
                if j == i || dist < physics::MIN_DISTANCE {
                    return;
                }
                let p_j = &particles[j];
                let q = force_weight(dist, h);
                let dir = (pos_i - p_j.position) / dist;
                // Pressure gradient: push away from the pair's shared
                // pressure, fading linearly with distance.
                acc += dir * (0.5 * (pressure_i + p_j.pressure) * q);
                // Viscosity: relax toward the neighbor's velocity.
                acc += (p_j.velocity - vel_i) * (viscosity * q);
            });

            if let Some(pointer) = interaction {
                let delta = pos_i - pointer.position;
                let dist = delta.length();
                if dist < pointer_radius && dist > physics::MIN_DISTANCE {
                    let falloff = 1.0 - dist / pointer_radius;
                    acc += delta / dist
                        * (pointer.signed_strength() * pointer_strength * falloff);
                }
            }

            forces[i] = acc;
        }
    }

    /// Steps 6 through 8: integrate, clamp to the boundary, recover any
    /// particle whose state went non-finite.
    fn integrate(&mut self, dt: f32) -> StepStats {
        let damping = self.params.boundary_damping;
        let bmin = self.boundary.min;
        let bmax = self.boundary.max;
        let forces = &self.scratch_force;

        let mut active = 0usize;
        let mut recovered = 0u32;
        let mut max_speed = 0.0f32;

        self.store.for_each_active_mut(|i, p| {
            active += 1;
            p.acceleration = forces[i];

            // Semi-implicit Euler: velocity first, then position.
            p.velocity += p.acceleration * dt;
            let speed = p.velocity.length();
            if speed.is_finite() && speed > physics::MAX_SPEED {
                p.velocity *= physics::MAX_SPEED / speed;
            }
            p.position += p.velocity * dt;

            // Damped reflection off the walls, every axis, every tick.
            if p.position.x < bmin.x {
                p.position.x = bmin.x;
                p.velocity.x = -p.velocity.x * damping;
            } else if p.position.x > bmax.x {
                p.position.x = bmax.x;
                p.velocity.x = -p.velocity.x * damping;
            }
            if p.position.y < bmin.y {
                p.position.y = bmin.y;
                p.velocity.y = -p.velocity.y * damping;
            } else if p.position.y > bmax.y {
                p.position.y = bmax.y;
                p.velocity.y = -p.velocity.y * damping;
            }

            // NaN/Inf comparisons fail every clamp above, so a blown-up
            // particle lands here and is parked back at its spawn point
            // instead of feeding garbage to the renderer.
            if !p.position.is_finite() || !p.velocity.is_finite() {
                p.position = p.home.clamp(bmin, bmax);
                p.velocity = Vec2::ZERO;
                p.acceleration = Vec2::ZERO;
                recovered += 1;
            }

            let speed = p.velocity.length();
            if speed > max_speed {
                max_speed = speed;
            }
        });

        if recovered > 0 {
            log::warn!(
                "reset {recovered} particle(s) with non-finite state to their spawn positions"
            );
        }

        StepStats { active, recovered, max_speed }
    }

    /// Activates a particle, or returns `None` when the arena is full.
    pub fn spawn(&mut self, position: Vec2, velocity: Vec2) -> Option<usize> {
        self.store.spawn(position, velocity)
    }

    /// Spawns a lattice block of particles; returns how many fit before
    /// capacity ran out.
    pub fn spawn_block(
        &mut self,
        center: Vec2,
        half_extents: Vec2,
        spacing: f32,
        velocity: Vec2,
    ) -> usize {
        if !(spacing > 0.0) {
            return 0;
        }
        let min = center - half_extents;
        let max = center + half_extents;
        let mut spawned = 0;
        let mut y = min.y;
        while y <= max.y {
            let mut x = min.x;
            while x <= max.x {
                if self.store.spawn(Vec2::new(x, y), velocity).is_none() {
                    return spawned;
                }
                spawned += 1;
                x += spacing;
            }
            y += spacing;
        }
        spawned
    }

    /// Deactivates one particle; its slot is reusable, other indices are
    /// untouched.
    pub fn deactivate(&mut self, index: usize) {
        self.store.deactivate(index);
    }

    /// Records the current particle state as the configuration `reset`
    /// restores.
    pub fn commit_seed(&mut self) {
        self.store.commit_seed();
    }

    /// Restores the last committed seed configuration.
    pub fn reset(&mut self) {
        self.store.reset();
        log::debug!("simulation reset to seeded configuration");
    }

    /// Read-only view of all particle slots, for rendering between steps.
    /// Inactive slots keep their index; check [`Particle::active`].
    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    pub fn active_count(&self) -> usize {
        self.store.active_count()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Mutates one parameter by name, effective on the next tick. Invalid
    /// values are rejected and the previous value stays in force.
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<(), ParamError> {
        self.params.set(name, value)
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Swaps the boundary (host window resize). Particles outside the new
    /// bounds are pulled back in by the next tick's clamp.
    pub fn set_boundary(&mut self, boundary: Boundary) {
        self.boundary = boundary;
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn test_boundary() -> Boundary {
        Boundary::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).unwrap()
    }

    fn single_particle_sim(position: Vec2, velocity: Vec2) -> SphSimulation {
        let mut sim =
            SphSimulation::new(16, test_boundary(), SimParams::default()).unwrap();
        sim.spawn(position, velocity).unwrap();
        sim
    }

    #[test]
    fn density_weight_shape() {
        let h = 0.5;
        assert_eq!(density_weight(0.0, h), 1.0);
        assert!((density_weight(0.25, h) - 0.25).abs() < 1e-6);
        assert_eq!(density_weight(0.5, h), 0.0);
        assert_eq!(density_weight(1.0, h), 0.0);
    }

    #[test]
    fn force_weight_shape() {
        let h = 0.5;
        assert_eq!(force_weight(0.0, h), 1.0);
        assert!((force_weight(0.25, h) - 0.5).abs() < 1e-6);
        assert_eq!(force_weight(0.75, h), 0.0);
    }

    #[test]
    fn lone_particle_falls_under_gravity() {
        let mut sim = single_particle_sim(Vec2::new(5.0, 8.0), Vec2::ZERO);
        let stats = sim.step(DT, None);
        assert_eq!(stats.active, 1);
        let p = &sim.particles()[0];
        assert!((p.velocity.y - (-9.8 * DT)).abs() < 1e-5);
        assert_eq!(p.velocity.x, 0.0);
        assert!(p.position.y < 8.0);
    }

    #[test]
    fn lone_particle_density_is_self_weight() {
        let mut sim = single_particle_sim(Vec2::new(5.0, 5.0), Vec2::ZERO);
        sim.step(DT, None);
        let p = &sim.particles()[0];
        assert_eq!(p.density, 1.0);
        // Below rest density, so the clamped equation of state gives zero.
        assert_eq!(p.pressure, 0.0);
    }

    #[test]
    fn floor_bounce_is_damped_and_upward() {
        let mut sim = single_particle_sim(Vec2::new(5.0, 0.05), Vec2::new(0.0, -10.0));
        sim.step(DT, None);
        let p = &sim.particles()[0];
        assert_eq!(p.position.y, 0.0);
        assert!(p.velocity.y > 0.0, "bounce should reverse velocity");
        assert!(
            p.velocity.y < 10.2 * 0.5 + 1e-3,
            "bounce should lose energy, got {}",
            p.velocity.y
        );
    }

    #[test]
    fn non_finite_particle_recovers_to_home() {
        let mut sim = single_particle_sim(Vec2::new(5.0, 5.0), Vec2::ZERO);
        sim.store_mut().slot_mut(0).position = Vec2::new(f32::NAN, 5.0);
        let stats = sim.step(DT, None);
        assert_eq!(stats.recovered, 1);
        let p = &sim.particles()[0];
        assert_eq!(p.position, Vec2::new(5.0, 5.0));
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn zero_or_negative_dt_skips_the_tick() {
        let mut sim = single_particle_sim(Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0));
        sim.step(0.0, None);
        sim.step(-1.0, None);
        sim.step(f32::NAN, None);
        let p = &sim.particles()[0];
        assert_eq!(p.position, Vec2::new(5.0, 5.0));
        assert_eq!(p.velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn oversized_dt_is_clamped_to_max_dt() {
        let mut a = single_particle_sim(Vec2::new(5.0, 5.0), Vec2::ZERO);
        let mut b = single_particle_sim(Vec2::new(5.0, 5.0), Vec2::ZERO);
        let max_dt = a.params().max_dt;
        a.step(10.0, None);
        b.step(max_dt, None);
        assert_eq!(
            a.particles()[0].position.to_array(),
            b.particles()[0].position.to_array()
        );
    }

    #[test]
    fn speed_is_capped() {
        let mut sim = single_particle_sim(Vec2::new(5.0, 9.0), Vec2::ZERO);
        sim.set_param("gravity", 1.0e6).unwrap();
        let stats = sim.step(DT, None);
        assert!(stats.max_speed <= physics::MAX_SPEED * 1.001);
    }

    #[test]
    fn dense_cluster_has_positive_pressure() {
        let mut sim =
            SphSimulation::new(64, test_boundary(), SimParams::default()).unwrap();
        // Tight 8x8 block, spacing well under the smoothing radius.
        sim.spawn_block(Vec2::new(5.0, 5.0), Vec2::splat(0.35), 0.1, Vec2::ZERO);
        sim.step(DT, None);
        let center = sim
            .particles()
            .iter()
            .find(|p| p.active && p.position.distance(Vec2::new(5.0, 5.0)) < 0.2)
            .expect("block should have a particle near its center");
        assert!(center.density > sim.params().rest_density);
        assert!(center.pressure > 0.0);
    }

    #[test]
    fn seeded_block_stays_inside_boundary() {
        let sim = SphSimulation::with_seeded_block(
            256,
            test_boundary(),
            SimParams::default(),
            42,
        )
        .unwrap();
        assert!(sim.active_count() > 0);
        let boundary = sim.boundary();
        for p in sim.particles().iter().filter(|p| p.active) {
            assert!(boundary.contains(p.position));
        }
    }
}
