//! Locomotion and physics defaults.

/// Physics constants
pub mod physics {
    /// Default gravity acceleration along Y in m/s²
    pub const DEFAULT_GRAVITY: f32 = -9.81;

    /// Character capsule radius
    pub const CHARACTER_RADIUS: f32 = 0.5;

    /// Character capsule total height
    pub const CHARACTER_HEIGHT: f32 = 2.0;

    /// Gap the kinematic controller keeps between the capsule and obstacles
    pub const CHARACTER_OFFSET: f32 = 0.05;

    /// Character controller autostep max height
    pub const AUTOSTEP_MAX_HEIGHT: f32 = 0.3;

    /// Character controller autostep min width
    pub const AUTOSTEP_MIN_WIDTH: f32 = 0.2;

    /// Character controller snap to ground distance
    pub const SNAP_TO_GROUND: f32 = 0.2;

    /// Steepest slope the capsule may walk up (degrees)
    pub const MAX_SLOPE_CLIMB_DEG: f32 = 45.0;

    /// Slope angle from which the capsule starts sliding down (degrees)
    pub const MIN_SLOPE_SLIDE_DEG: f32 = 30.0;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Grounded locomotion defaults
pub mod movement {
    /// Walk speed in m/s
    pub const DEFAULT_WALK_SPEED: f32 = 5.0;

    /// Sprint speed in m/s
    pub const DEFAULT_SPRINT_SPEED: f32 = 9.0;

    /// Time constant of the critically-damped facing smoothing (seconds)
    pub const DEFAULT_TURN_SMOOTH_TIME: f32 = 0.1;

    /// Input magnitude below which the stick counts as released
    pub const DEFAULT_INPUT_DEAD_ZONE: f32 = 0.1;

    /// Vertical velocity held while grounded (m/s), keeps the capsule pressed to the floor
    pub const DEFAULT_GROUNDED_FLOOR: f32 = -2.0;
}

/// Grounding probe defaults
pub mod probe {
    /// Radius of the per-frame ground sphere
    pub const DEFAULT_RADIUS: f32 = 0.4;

    /// How far the per-frame sphere is swept downward
    pub const DEFAULT_CAST_DISTANCE: f32 = 0.15;

    /// Height of the sphere's bottom above the capsule's feet when the sweep starts
    pub const DEFAULT_ORIGIN_HEIGHT: f32 = 0.1;

    /// Radius of the one-time spawn snap sphere
    pub const SPAWN_RADIUS: f32 = 0.45;

    /// Maximum downward gap the spawn snap closes
    pub const SPAWN_MAX_DISTANCE: f32 = 5.0;

    /// How far above the feet the spawn sweep starts, so slightly sunken spawns lift out
    pub const SPAWN_LIFT: f32 = 0.5;

    /// Collision layer bits every static collider belongs to by default
    pub const DEFAULT_GROUND_LAYERS: u32 = 0x0000_0001;
}

/// Dodge roll defaults
pub mod roll {
    /// Peak roll speed in m/s (multiplied by the speed curve)
    pub const DEFAULT_SPEED: f32 = 12.0;

    /// Wall-clock length of one roll in seconds
    pub const DEFAULT_DURATION: f32 = 0.6;

    /// Minimum time between the end of one roll and the start of the next
    pub const DEFAULT_COOLDOWN: f32 = 1.0;
}
