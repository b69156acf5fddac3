//! Motion integrator: one collision-aware move per frame.

use nalgebra::Vector3;

use super::state::CharacterState;
use crate::collision::{CharacterId, CollisionWorld, MoveOutcome};

/// Applies a frame's combined displacement to a character body.
///
/// Horizontal and vertical motion always go through a single
/// `move_character` call per frame.
#[derive(Debug, Clone, Copy)]
pub struct MotionIntegrator {
    character: CharacterId,
}

impl MotionIntegrator {
    pub fn new(character: CharacterId) -> Self {
        Self { character }
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    /// Moves the body, then mirrors the resolved translation and facing into `state`.
    /// Returns `None` when the world has no body for this character.
    pub fn apply<W: CollisionWorld + ?Sized>(
        &self,
        world: &mut W,
        state: &mut CharacterState,
        displacement: Vector3<f32>,
        dt: f32,
    ) -> Option<MoveOutcome> {
        let outcome = world.move_character(self.character, displacement, dt)?;
        state.position += outcome.applied;
        world.set_character_yaw(self.character, state.facing_yaw);
        Some(outcome)
    }
}
