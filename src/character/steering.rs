//! Yaw math for camera-relative steering.
//!
//! Yaw is measured in radians around +Y. Yaw 0 faces +Z and positive yaw turns
//! toward +X, so a yaw of 90° faces +X.

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use std::f32::consts::{PI, TAU};

const MIN_SMOOTH_TIME: f32 = 1.0e-4;

/// Wraps an angle into [-PI, PI).
pub fn wrap_angle_signed_pi(angle: f32) -> f32 {
    ((angle + PI).rem_euclid(TAU)) - PI
}

/// Shortest signed angular difference from `current` to `target`.
pub fn delta_angle(current: f32, target: f32) -> f32 {
    wrap_angle_signed_pi(target - current)
}

/// Yaw of a 2D input (strafe, forward) in the movement plane.
/// Forward-only input is yaw 0, right-only input is +90°.
pub fn input_yaw(input: Vector2<f32>) -> f32 {
    input.x.atan2(input.y)
}

/// Target facing for an input direction seen through a camera with the given heading.
pub fn camera_relative_yaw(input: Vector2<f32>, camera_yaw: f32) -> f32 {
    input_yaw(input) + camera_yaw
}

/// Unit horizontal direction for a yaw.
pub fn direction_from_yaw(yaw: f32) -> Vector3<f32> {
    Vector3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Yaw of a horizontal vector; the vertical component is ignored.
pub fn yaw_from_direction(direction: &Vector3<f32>) -> f32 {
    direction.x.atan2(direction.z)
}

/// World rotation for a yaw around +Y.
pub fn rotation_from_yaw(yaw: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_euler_angles(0.0, yaw, 0.0)
}

/// Critically-damped approach of `current` toward `target`.
///
/// `velocity` is the smoothing state carried between calls. The update is the
/// closed-form solution of a critically damped spring over `dt`, so splitting a
/// time span into more frames lands on the same value. The result never passes
/// the target; if it would, it stops on the target and the velocity is zeroed.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let omega = 2.0 / smooth_time.max(MIN_SMOOTH_TIME);
    let decay = (-omega * dt).exp();
    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        *velocity = 0.0;
        return target;
    }
    output
}

/// [`smooth_damp`] for angles: approaches along the shortest arc.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let unwrapped_target = current + delta_angle(current, target);
    smooth_damp(current, unwrapped_target, velocity, smooth_time, dt)
}
