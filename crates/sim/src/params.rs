//! Runtime-tunable simulation parameters and the rectangular boundary.
//!
//! Parameters mutate through [`SimParams::set`], which validates ranges and
//! keeps the previous value on rejection. The structs derive serde so hosts
//! can persist tuning presets.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ParamError};
use crate::physics;

/// Axis-aligned rectangular simulation boundary, in world units.
///
/// Build through [`Boundary::new`] so the `min < max` invariant holds; the
/// fields stay public for hosts that serialize presets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub min: Vec2,
    pub max: Vec2,
}

impl Boundary {
    /// Rejects non-finite bounds and `min >= max` on either axis.
    pub fn new(min: Vec2, max: Vec2) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min.x >= max.x || min.y >= max.y {
            return Err(ConfigError::BadBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        0.5 * (self.min + self.max)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Tunable parameters for the simulation step.
///
/// All values are per-frame-tick physics inputs; mutating one takes effect
/// on the very next step. `smoothing_radius` doubles as the spatial hash
/// cell size so a neighbor query only ever visits the 3x3 cell block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Gravity magnitude (world units/s²), applied along -y.
    pub gravity: f32,
    /// Neighbor velocity-difference damping coefficient (1/s).
    pub viscosity: f32,
    /// Target density under the quadratic falloff weight.
    pub rest_density: f32,
    /// Pressure per unit of density excess over rest.
    pub stiffness: f32,
    /// Velocity retained after a wall bounce, in [0, 1).
    pub boundary_damping: f32,
    /// Pointer force acceleration at zero distance.
    pub interaction_strength: f32,
    /// Pointer force reach (world units).
    pub interaction_radius: f32,
    /// Smoothing radius h: neighbor influence range and hash cell size.
    pub smoothing_radius: f32,
    /// Upper clamp on the per-step delta-time (seconds).
    pub max_dt: f32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            gravity: physics::GRAVITY,
            viscosity: 0.5,            // gentle internal friction
            rest_density: 2.0,         // loose packing before pressure kicks in
            stiffness: 30.0,
            boundary_damping: 0.5,     // inelastic walls, half the speed survives
            interaction_strength: 40.0,
            interaction_radius: 1.5,
            smoothing_radius: 0.5,
            max_dt: physics::MAX_DT,
        }
    }
}

impl SimParams {
    /// Checks every field against its accepted range.
    ///
    /// Called once at simulation construction; after that, mutation goes
    /// through [`SimParams::set`] which validates incrementally.
    pub fn validate(&self) -> Result<(), ParamError> {
        non_negative("gravity", self.gravity)?;
        non_negative("viscosity", self.viscosity)?;
        non_negative("rest_density", self.rest_density)?;
        non_negative("stiffness", self.stiffness)?;
        damping("boundary_damping", self.boundary_damping)?;
        non_negative("interaction_strength", self.interaction_strength)?;
        positive("interaction_radius", self.interaction_radius)?;
        positive("smoothing_radius", self.smoothing_radius)?;
        positive("max_dt", self.max_dt)?;
        Ok(())
    }

    /// Sets one parameter by name, validating its range.
    ///
    /// On any error the previous value is retained. This is the surface a
    /// demo shell binds its sliders to.
    pub fn set(&mut self, name: &str, value: f32) -> Result<(), ParamError> {
        match name {
            "gravity" => self.gravity = non_negative("gravity", value)?,
            "viscosity" => self.viscosity = non_negative("viscosity", value)?,
            "rest_density" => self.rest_density = non_negative("rest_density", value)?,
            "stiffness" => self.stiffness = non_negative("stiffness", value)?,
            "boundary_damping" => {
                self.boundary_damping = damping("boundary_damping", value)?
            }
            "interaction_strength" => {
                self.interaction_strength = non_negative("interaction_strength", value)?
            }
            "interaction_radius" => {
                self.interaction_radius = positive("interaction_radius", value)?
            }
            "smoothing_radius" => {
                self.smoothing_radius = positive("smoothing_radius", value)?
            }
            "max_dt" => self.max_dt = positive("max_dt", value)?,
            _ => return Err(ParamError::Unknown(name.to_string())),
        }
        Ok(())
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<f32, ParamError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ParamError::OutOfRange { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<f32, ParamError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParamError::OutOfRange { name, value })
    }
}

fn damping(name: &'static str, value: f32) -> Result<f32, ParamError> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ParamError::OutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(SimParams::default().validate().is_ok());
    }

    #[test]
    fn set_rejects_negative_viscosity_and_keeps_previous() {
        let mut params = SimParams::default();
        let before = params.viscosity;
        let err = params.set("viscosity", -0.1).unwrap_err();
        assert!(matches!(err, ParamError::OutOfRange { name: "viscosity", .. }));
        assert_eq!(params.viscosity, before);
    }

    #[test]
    fn set_rejects_unknown_name() {
        let mut params = SimParams::default();
        let err = params.set("surface_tension", 1.0).unwrap_err();
        assert!(matches!(err, ParamError::Unknown(_)));
    }

    #[test]
    fn set_rejects_non_finite() {
        let mut params = SimParams::default();
        assert!(params.set("gravity", f32::NAN).is_err());
        assert!(params.set("smoothing_radius", f32::INFINITY).is_err());
    }

    #[test]
    fn set_rejects_damping_of_one_or_more() {
        let mut params = SimParams::default();
        assert!(params.set("boundary_damping", 1.0).is_err());
        assert!(params.set("boundary_damping", 0.99).is_ok());
        assert!(params.set("boundary_damping", 0.0).is_ok());
    }

    #[test]
    fn set_applies_valid_value() {
        let mut params = SimParams::default();
        params.set("gravity", 4.0).unwrap();
        assert_eq!(params.gravity, 4.0);
    }

    #[test]
    fn boundary_rejects_inverted_and_degenerate_bounds() {
        assert!(Boundary::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).is_ok());
        assert!(Boundary::new(Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)).is_err());
        assert!(Boundary::new(Vec2::ZERO, Vec2::new(10.0, 0.0)).is_err());
        assert!(Boundary::new(Vec2::ZERO, Vec2::new(f32::NAN, 10.0)).is_err());
    }
}
