//! Ripple - interactive particle fluid simulation core
//!
//! Simplified SPH-like fluid in 2D: hundreds of particles advanced per frame
//! under gravity, pressure, viscosity, boundary, and pointer-interaction
//! forces, fast enough for interactive rates.
//!
//! This crate is framework-agnostic - it handles simulation only. A host
//! (renderer + demo shell) drives [`SphSimulation::step`] once per frame and
//! reads particle state back between steps for drawing.
//!
//! The physics is deliberately simplified: quadratic/linear falloff weights
//! instead of proper SPH kernels, and a clamped linear equation of state
//! instead of an incompressibility solver. See the [`sph`] module docs.

pub mod error;
pub mod interaction;
pub mod params;
pub mod particle;
pub mod physics;
pub mod spatial;
pub mod sph;

pub use error::{ConfigError, ParamError};
pub use interaction::{Interaction, InteractionMode};
pub use params::{Boundary, SimParams};
pub use particle::{Particle, ParticleStore};
pub use spatial::SpatialHash;
pub use sph::{SphSimulation, StepStats};
