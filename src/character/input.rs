//! Per-frame input snapshot and the camera heading collaborator.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Input for one frame, already normalized by the device layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Strafe axis in [-1, 1], positive to the right.
    pub strafe: f32,
    /// Forward axis in [-1, 1], positive away from the camera.
    pub forward: f32,
    /// Sprint is held this frame.
    #[serde(default)]
    pub sprint_held: bool,
    /// Roll button went down this frame (edge, not hold).
    #[serde(default)]
    pub roll_pressed: bool,
}

impl InputSnapshot {
    pub fn new(strafe: f32, forward: f32) -> Self {
        Self {
            strafe,
            forward,
            ..Default::default()
        }
    }

    pub fn with_sprint(mut self, held: bool) -> Self {
        self.sprint_held = held;
        self
    }

    pub fn with_roll(mut self, pressed: bool) -> Self {
        self.roll_pressed = pressed;
        self
    }

    /// Raw axes with each component clamped to [-1, 1].
    pub fn axes(&self) -> Vector2<f32> {
        Vector2::new(self.strafe.clamp(-1.0, 1.0), self.forward.clamp(-1.0, 1.0))
    }

    /// Stick deflection in [0, 1].
    pub fn magnitude(&self) -> f32 {
        self.axes().norm().min(1.0)
    }

    /// Unit input direction, or `None` for a centered stick.
    pub fn direction(&self) -> Option<Vector2<f32>> {
        self.axes().try_normalize(f32::EPSILON)
    }
}

/// Read-only view of the active camera's horizontal heading.
pub trait CameraHeading {
    /// Camera yaw in radians (same convention as the character's facing).
    fn yaw(&self) -> f32;
}

/// A camera that never turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedHeading(pub f32);

impl FixedHeading {
    pub fn from_degrees(degrees: f32) -> Self {
        Self(degrees.to_radians())
    }
}

impl CameraHeading for FixedHeading {
    fn yaw(&self) -> f32 {
        self.0
    }
}

/// Heading shared with a camera rig living on the same thread.
/// The rig writes through its clone; the controller only reads.
#[derive(Debug, Clone, Default)]
pub struct SharedHeading(Rc<Cell<f32>>);

impl SharedHeading {
    pub fn new(yaw: f32) -> Self {
        Self(Rc::new(Cell::new(yaw)))
    }

    pub fn set(&self, yaw: f32) {
        self.0.set(yaw);
    }
}

impl CameraHeading for SharedHeading {
    fn yaw(&self) -> f32 {
        self.0.get()
    }
}
