//! World-query seam between the character controller and the collision backend.
//!
//! [`crate::physics::PhysicsWorld`] implements it on top of rapier3d; tests use
//! lightweight stand-ins.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Identifier of a character body inside a collision world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub u64);

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "character#{}", self.0)
    }
}

/// Bit set of collision layers a query tests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub const fn layer(index: u32) -> Self {
        LayerMask(1 << index)
    }

    pub const fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: LayerMask) -> Self {
        LayerMask(self.0 | other.0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

/// Result of a downward sphere sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Distance travelled before contact; 0 when the sphere starts overlapping.
    pub distance: f32,
    /// Contact point on the ground surface.
    pub point: Point3<f32>,
}

/// What the collision-aware move actually did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Translation applied after collision resolution.
    pub applied: Vector3<f32>,
    /// The backend found ground under the capsule after the move.
    pub grounded: bool,
}

/// Collision/world query collaborator.
///
/// Sweeps ignore trigger volumes and the character's own body.
pub trait CollisionWorld {
    /// Sweeps a sphere of `radius` from `origin` straight down by at most `max_distance`,
    /// testing only colliders on `layers`.
    fn sweep_sphere_down(
        &self,
        character: CharacterId,
        origin: Point3<f32>,
        radius: f32,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<GroundHit>;

    /// Current position of the character body (capsule centre).
    fn character_position(&self, character: CharacterId) -> Option<Point3<f32>>;

    /// Gap the world's move keeps between a capsule and the surface it rests on.
    /// A body resting inside this gap is treated as penetrating.
    fn skin_width(&self) -> f32 {
        0.0
    }

    /// Places the body without collision resolution. Used once by the spawn snap.
    fn teleport_character(&mut self, character: CharacterId, position: Point3<f32>) -> bool;

    /// Moves the capsule by `desired` with collision resolution and sliding.
    /// Called exactly once per character per frame.
    fn move_character(
        &mut self,
        character: CharacterId,
        desired: Vector3<f32>,
        dt: f32,
    ) -> Option<MoveOutcome>;

    /// Sets the body's facing around +Y.
    fn set_character_yaw(&mut self, character: CharacterId, yaw: f32) -> bool;
}
