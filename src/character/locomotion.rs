//! Locomotion state machine.
//!
//! One handler per [`LocomotionMode`]. Each handler returns the frame's
//! horizontal velocity and animation parameters; gravity is integrated
//! afterwards unless the handler pins the vertical velocity (rolls do).
//! The machine is a pure function of the input snapshot, the character state,
//! the probe result and the frame time.

use nalgebra::{Vector2, Vector3};

use super::animation::AnimationParams;
use super::input::InputSnapshot;
use super::state::{CharacterState, LocomotionMode, RollState};
use super::steering::{
    camera_relative_yaw, direction_from_yaw, smooth_damp_angle, wrap_angle_signed_pi,
};
use crate::config::{ControllerConfig, GravityConfig, MovementConfig, RollConfig, RollTiming};

/// Everything the machine reads for one frame besides its own state.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub input: &'a InputSnapshot,
    /// Heading of the active camera in radians.
    pub camera_yaw: f32,
    /// Grounding probe result for this frame.
    pub grounded: bool,
    /// Simulation time at the end of this frame.
    pub now: f64,
    pub dt: f32,
    /// Roll clip progress read back from the animation sink, if any.
    pub animation_roll_progress: Option<f32>,
}

/// Output of one frame of the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    /// Combined horizontal and vertical displacement for the single move call.
    pub displacement: Vector3<f32>,
    pub horizontal_velocity: Vector3<f32>,
    pub vertical_velocity: f32,
    pub facing_yaw: f32,
    pub animation: AnimationParams,
    pub roll_started: bool,
    pub roll_finished: bool,
}

/// Why a roll request was dropped. Not an error: rejected rolls are no-ops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RollRejection {
    AlreadyRolling,
    CoolingDown { remaining: f32 },
    NoDirection,
}

struct ModeFrame {
    horizontal_velocity: Vector3<f32>,
    animation: AnimationParams,
    pinned_vertical_velocity: Option<f32>,
    roll_started: bool,
    roll_finished: bool,
}

/// Vertical velocity after one frame of gravity.
///
/// Gravity applies on every frame. Grounded characters are then clamped so
/// they never drop below `grounded_floor`, which keeps a resting character
/// pressed against the ground; airborne ones accelerate without limit.
pub fn integrate_vertical_velocity(velocity: f32, grounded: bool, gravity: &GravityConfig, dt: f32) -> f32 {
    let integrated = velocity + gravity.acceleration * dt.max(0.0);
    if grounded {
        integrated.max(gravity.grounded_floor)
    } else {
        integrated
    }
}

#[derive(Debug, Clone)]
pub struct LocomotionMachine {
    movement: MovementConfig,
    gravity: GravityConfig,
    roll: RollConfig,
}

impl LocomotionMachine {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            movement: config.movement.clone(),
            gravity: config.gravity.clone(),
            roll: config.roll.clone(),
        }
    }

    pub fn step(&self, state: &mut CharacterState, frame: &FrameInput<'_>) -> FramePlan {
        state.grounded = frame.grounded;

        let mode_frame = match state.mode {
            LocomotionMode::Grounded => self.grounded_frame(state, frame),
            LocomotionMode::Rolling(roll) => {
                if frame.input.roll_pressed {
                    log::debug!("roll ignored: {:?}", RollRejection::AlreadyRolling);
                }
                self.rolling_frame(state, roll, frame, false)
            }
        };

        state.vertical_velocity = match mode_frame.pinned_vertical_velocity {
            Some(pinned) => pinned,
            None => integrate_vertical_velocity(state.vertical_velocity, frame.grounded, &self.gravity, frame.dt),
        };

        let dt = frame.dt.max(0.0);
        let displacement =
            mode_frame.horizontal_velocity * dt + Vector3::y() * (state.vertical_velocity * dt);

        FramePlan {
            displacement,
            horizontal_velocity: mode_frame.horizontal_velocity,
            vertical_velocity: state.vertical_velocity,
            facing_yaw: state.facing_yaw,
            animation: mode_frame.animation,
            roll_started: mode_frame.roll_started,
            roll_finished: mode_frame.roll_finished,
        }
    }

    /// Checks whether a roll could start now, ignoring the button edge.
    pub fn roll_rejection(&self, state: &CharacterState, input: &InputSnapshot, now: f64) -> Option<RollRejection> {
        if state.mode.is_rolling() {
            return Some(RollRejection::AlreadyRolling);
        }
        let remaining = state.roll_cooldown_remaining(now, self.roll.cooldown);
        if remaining > 0.0 {
            return Some(RollRejection::CoolingDown { remaining });
        }
        if self.steering_direction(input).is_none() {
            return Some(RollRejection::NoDirection);
        }
        None
    }

    /// Unit input direction once the stick clears the dead zone.
    fn steering_direction(&self, input: &InputSnapshot) -> Option<Vector2<f32>> {
        if input.magnitude() <= self.movement.input_dead_zone {
            return None;
        }
        input.direction()
    }

    fn grounded_frame(&self, state: &mut CharacterState, frame: &FrameInput<'_>) -> ModeFrame {
        let input = frame.input;
        let steering = self.steering_direction(input);

        if input.roll_pressed {
            match (self.roll_rejection(state, input, frame.now), steering) {
                (None, Some(direction)) => return self.start_roll(state, direction, frame),
                (reason, _) => log::debug!(
                    "roll ignored: {:?}",
                    reason.unwrap_or(RollRejection::NoDirection)
                ),
            }
        }

        let mut animation = AnimationParams {
            input_x: input.strafe,
            input_y: input.forward,
            ..AnimationParams::neutral()
        };

        let Some(direction) = steering else {
            state.turn_smoothing_velocity = 0.0;
            return ModeFrame {
                horizontal_velocity: Vector3::zeros(),
                animation,
                pinned_vertical_velocity: None,
                roll_started: false,
                roll_finished: false,
            };
        };

        let target_yaw = camera_relative_yaw(direction, frame.camera_yaw);
        state.facing_yaw = wrap_angle_signed_pi(smooth_damp_angle(
            state.facing_yaw,
            target_yaw,
            &mut state.turn_smoothing_velocity,
            self.movement.turn_smooth_time,
            frame.dt,
        ));

        let speed = if input.sprint_held {
            self.movement.sprint_speed
        } else {
            self.movement.walk_speed
        };
        animation.forward_magnitude = input.magnitude();
        animation.sprinting = input.sprint_held;

        ModeFrame {
            horizontal_velocity: direction_from_yaw(state.facing_yaw) * speed,
            animation,
            pinned_vertical_velocity: None,
            roll_started: false,
            roll_finished: false,
        }
    }

    fn start_roll(
        &self,
        state: &mut CharacterState,
        direction: Vector2<f32>,
        frame: &FrameInput<'_>,
    ) -> ModeFrame {
        let roll_yaw = wrap_angle_signed_pi(camera_relative_yaw(direction, frame.camera_yaw));
        state.facing_yaw = roll_yaw;
        state.turn_smoothing_velocity = 0.0;

        let roll = RollState {
            direction: direction_from_yaw(roll_yaw),
            elapsed_fraction: 0.0,
            started_at: frame.now,
        };
        log::debug!(
            "roll started at t={:.3} yaw={:.1}°",
            frame.now,
            roll_yaw.to_degrees()
        );
        self.rolling_frame(state, roll, frame, true)
    }

    fn rolling_frame(
        &self,
        state: &mut CharacterState,
        roll: RollState,
        frame: &FrameInput<'_>,
        starting: bool,
    ) -> ModeFrame {
        let progress = if starting {
            0.0
        } else {
            match self.roll.timing {
                RollTiming::Timer => ((frame.now - roll.started_at) / f64::from(self.roll.duration)) as f32,
                RollTiming::Animation => frame.animation_roll_progress.unwrap_or_else(|| {
                    log::warn!("roll timed by animation but the sink reports no roll clip; ending roll");
                    1.0
                }),
            }
        };
        let elapsed_fraction = progress.clamp(0.0, 1.0).max(roll.elapsed_fraction);
        let multiplier = self.roll.curve.evaluate(elapsed_fraction);
        let horizontal_velocity = roll.direction * (self.roll.speed * multiplier);

        let finished = elapsed_fraction >= 1.0;
        if finished {
            state.mode = LocomotionMode::Grounded;
            state.last_roll_completed_at = Some(frame.now);
            log::debug!("roll finished at t={:.3}", frame.now);
        } else {
            state.mode = LocomotionMode::Rolling(RollState {
                elapsed_fraction,
                ..roll
            });
        }

        ModeFrame {
            horizontal_velocity,
            animation: if starting {
                AnimationParams::roll_start()
            } else {
                AnimationParams::neutral()
            },
            pinned_vertical_velocity: Some(self.gravity.grounded_floor),
            roll_started: starting,
            roll_finished: finished,
        }
    }
}
