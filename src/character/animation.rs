//! Animation parameters emitted each frame and the sinks that consume them.
//!
//! The controller never drives playback itself. It hands a parameter set to an
//! [`AnimationSink`] every frame and, when the roll is timed by the animation,
//! reads the roll clip's normalized progress back.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

const DEBUG_ROLL_CLIP: bool = false;

/// Parameters for the animation graph for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnimationParams {
    /// Raw strafe axis.
    pub input_x: f32,
    /// Raw forward axis.
    pub input_y: f32,
    /// Locomotion blend in [0, 1], scaled by stick deflection.
    pub forward_magnitude: f32,
    pub sprinting: bool,
    /// True only on the frame a roll starts.
    pub roll_triggered: bool,
}

impl AnimationParams {
    /// Idle parameters; also what a roll forces for its whole duration.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn roll_start() -> Self {
        Self {
            roll_triggered: true,
            ..Self::neutral()
        }
    }
}

/// External animation collaborator.
pub trait AnimationSink {
    /// Receives this frame's parameters. `dt` lets sinks advance their own clips.
    fn apply(&mut self, params: &AnimationParams, dt: f32);

    /// Normalized time of the roll clip, if one is playing.
    fn roll_progress(&self) -> Option<f32> {
        None
    }
}

/// Sink that keeps every parameter set it receives.
/// Clones share the same log so a host can keep one handle for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Rc<RefCell<Vec<AnimationParams>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<AnimationParams> {
        self.frames.borrow().clone()
    }

    pub fn last(&self) -> Option<AnimationParams> {
        self.frames.borrow().last().copied()
    }

    pub fn len(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }
}

impl AnimationSink for RecordingSink {
    fn apply(&mut self, params: &AnimationParams, _dt: f32) {
        self.frames.borrow_mut().push(*params);
    }
}

#[derive(Debug, Default)]
struct RollClipData {
    length: f32,
    speed: f32,
    time_position: f32,
    is_playing: bool,
    last_params: AnimationParams,
}

/// Sink owning a one-shot roll clip, used when the animation times the roll.
///
/// A roll trigger (re)starts the clip at time 0. Each applied frame advances
/// the clip by `dt * speed`; at the end of the clip it stops and reports no
/// further progress.
#[derive(Debug, Clone)]
pub struct RollClipSink {
    data: Rc<RefCell<RollClipData>>,
}

impl RollClipSink {
    pub fn new(length: f32) -> Self {
        Self {
            data: Rc::new(RefCell::new(RollClipData {
                length: length.max(0.01),
                speed: 1.0,
                ..Default::default()
            })),
        }
    }

    pub fn with_speed(self, speed: f32) -> Self {
        self.data.borrow_mut().speed = speed.max(0.0);
        self
    }

    pub fn length(&self) -> f32 {
        self.data.borrow().length
    }

    pub fn is_playing(&self) -> bool {
        self.data.borrow().is_playing
    }

    pub fn last_params(&self) -> AnimationParams {
        self.data.borrow().last_params
    }
}

impl AnimationSink for RollClipSink {
    fn apply(&mut self, params: &AnimationParams, dt: f32) {
        let mut data = self.data.borrow_mut();
        data.last_params = *params;

        if params.roll_triggered {
            data.time_position = 0.0;
            data.is_playing = true;
            return;
        }
        if !data.is_playing {
            return;
        }

        data.time_position += dt.max(0.0) * data.speed;
        if data.time_position >= data.length {
            data.time_position = data.length;
            data.is_playing = false;
        }
        if DEBUG_ROLL_CLIP {
            log::trace!(
                "roll clip t={:.3}/{:.3} playing={}",
                data.time_position,
                data.length,
                data.is_playing
            );
        }
    }

    fn roll_progress(&self) -> Option<f32> {
        let data = self.data.borrow();
        if data.is_playing {
            Some((data.time_position / data.length).clamp(0.0, 1.0))
        } else if data.time_position >= data.length {
            // Finished clips report completion until the next trigger.
            Some(1.0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_shares_log_between_clones() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.apply(&AnimationParams::roll_start(), 0.016);
        assert_eq!(sink.len(), 1);
        assert!(sink.last().unwrap().roll_triggered);
    }

    #[test]
    fn test_roll_clip_reports_progress_then_completion() {
        let mut clip = RollClipSink::new(0.5);
        assert_eq!(clip.roll_progress(), None);

        clip.apply(&AnimationParams::roll_start(), 0.1);
        assert_eq!(clip.roll_progress(), Some(0.0));

        clip.apply(&AnimationParams::neutral(), 0.25);
        let progress = clip.roll_progress().unwrap();
        assert!((progress - 0.5).abs() < 1e-6);

        clip.apply(&AnimationParams::neutral(), 0.5);
        assert!(!clip.is_playing());
        assert_eq!(clip.roll_progress(), Some(1.0));
    }

    #[test]
    fn test_roll_clip_speed_scales_progress() {
        let mut clip = RollClipSink::new(1.0).with_speed(2.0);
        clip.apply(&AnimationParams::roll_start(), 0.0);
        clip.apply(&AnimationParams::neutral(), 0.25);
        let progress = clip.roll_progress().unwrap();
        assert!((progress - 0.5).abs() < 1e-6);
    }
}
