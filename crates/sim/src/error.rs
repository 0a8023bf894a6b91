//! Error types for construction and runtime parameter mutation.

use std::fmt;

use glam::Vec2;

/// Rejected configuration at construction time.
///
/// These are programmer/config errors, not runtime conditions: they are
/// reported synchronously and nothing is silently clamped.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Particle capacity must be at least 1.
    ZeroCapacity,
    /// Spatial hash cell size must be positive and finite.
    BadCellSize(f32),
    /// Boundary must satisfy `min < max` on both axes, with finite bounds.
    BadBounds { min: Vec2, max: Vec2 },
    /// A simulation parameter failed validation.
    Param(ParamError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "particle capacity must be at least 1"),
            Self::BadCellSize(size) => {
                write!(f, "cell size must be positive and finite, got {size}")
            }
            Self::BadBounds { min, max } => {
                write!(f, "boundary min {min} must be strictly below max {max} on both axes")
            }
            Self::Param(e) => write!(f, "invalid parameter: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ParamError> for ConfigError {
    fn from(e: ParamError) -> Self {
        Self::Param(e)
    }
}

/// Rejected runtime parameter mutation.
///
/// On rejection the previous value is always retained.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Parameter name not recognized by [`crate::SimParams::set`].
    Unknown(String),
    /// Value outside the parameter's accepted range.
    OutOfRange { name: &'static str, value: f32 },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown parameter {name:?}"),
            Self::OutOfRange { name, value } => {
                write!(f, "value {value} out of range for parameter {name:?}")
            }
        }
    }
}

impl std::error::Error for ParamError {}
