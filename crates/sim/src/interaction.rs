//! Pointer-driven interaction force description.
//!
//! The host projects its pointer state into world space and hands the
//! simulation one of these per frame while the pointer is pressed; passing
//! `None` to the step means no interaction this tick. Plain data, rebuilt
//! fresh every frame.

use glam::Vec2;

/// Direction of the pointer force.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
    /// Pull particles toward the pointer.
    Attract,
    /// Push particles away from the pointer.
    Repel,
}

/// One frame's worth of pointer interaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction {
    /// World-space center of the applied force.
    pub position: Vec2,
    /// Multiplier on `SimParams::interaction_strength`; 1.0 is full
    /// strength, hosts can scale by pressure sensitivity or similar.
    pub strength: f32,
    pub mode: InteractionMode,
}

impl Interaction {
    pub fn attract(position: Vec2) -> Self {
        Self { position, strength: 1.0, mode: InteractionMode::Attract }
    }

    pub fn repel(position: Vec2) -> Self {
        Self { position, strength: 1.0, mode: InteractionMode::Repel }
    }

    /// Strength signed by mode: positive pushes particles away from the
    /// center, negative pulls them in.
    pub(crate) fn signed_strength(&self) -> f32 {
        match self.mode {
            InteractionMode::Repel => self.strength,
            InteractionMode::Attract => -self.strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_strength_follows_mode() {
        let center = Vec2::new(1.0, 1.0);
        assert!(Interaction::repel(center).signed_strength() > 0.0);
        assert!(Interaction::attract(center).signed_strength() < 0.0);
    }
}
