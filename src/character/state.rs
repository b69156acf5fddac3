use nalgebra::{Point3, UnitQuaternion, Vector3};

use super::steering::rotation_from_yaw;

/// Progress of an in-flight dodge roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollState {
    /// Unit horizontal direction captured at roll start.
    pub direction: Vector3<f32>,
    /// Normalized roll time in [0, 1]; never decreases within one roll.
    pub elapsed_fraction: f32,
    /// Simulation time the roll started at.
    pub started_at: f64,
}

/// Horizontal motion mode. Grounded covers idle, walking and sprinting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocomotionMode {
    #[default]
    Grounded,
    Rolling(RollState),
}

impl LocomotionMode {
    pub fn is_rolling(&self) -> bool {
        matches!(self, LocomotionMode::Rolling(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            LocomotionMode::Grounded => "grounded",
            LocomotionMode::Rolling(_) => "rolling",
        }
    }
}

/// Everything the controller carries between frames for one character.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterState {
    pub position: Point3<f32>,
    /// Facing yaw in radians.
    pub facing_yaw: f32,
    pub vertical_velocity: f32,
    /// Smoothing state for the facing yaw.
    pub turn_smoothing_velocity: f32,
    pub mode: LocomotionMode,
    /// When the last roll finished; `None` until the first roll completes.
    pub last_roll_completed_at: Option<f64>,
    /// Result of the most recent grounding probe.
    pub grounded: bool,
}

impl CharacterState {
    pub fn new(position: Point3<f32>, facing_yaw: f32) -> Self {
        Self {
            position,
            facing_yaw,
            vertical_velocity: 0.0,
            turn_smoothing_velocity: 0.0,
            mode: LocomotionMode::Grounded,
            last_roll_completed_at: None,
            grounded: false,
        }
    }

    pub fn facing(&self) -> UnitQuaternion<f32> {
        rotation_from_yaw(self.facing_yaw)
    }

    pub fn roll(&self) -> Option<&RollState> {
        match &self.mode {
            LocomotionMode::Rolling(roll) => Some(roll),
            LocomotionMode::Grounded => None,
        }
    }

    /// Seconds left before another roll may start, measured at `now`.
    pub fn roll_cooldown_remaining(&self, now: f64, cooldown: f32) -> f32 {
        match self.last_roll_completed_at {
            Some(completed) => (f64::from(cooldown) - (now - completed)).max(0.0) as f32,
            None => 0.0,
        }
    }
}

impl Default for CharacterState {
    fn default() -> Self {
        Self::new(Point3::origin(), 0.0)
    }
}
