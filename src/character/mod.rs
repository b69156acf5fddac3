//! Character controller: grounding probe, locomotion state machine and
//! motion integrator wired into a single per-frame update.

pub mod animation;
pub mod constants;
pub mod grounding;
pub mod input;
pub mod integrator;
pub mod locomotion;
pub mod roll_curve;
pub mod state;
pub mod steering;

use nalgebra::{Point3, Vector3};
use thiserror::Error;

use crate::collision::{CharacterId, CollisionWorld};
use crate::config::{ConfigError, ControllerConfig};
use crate::physics::CapsuleShape;

pub use animation::{AnimationParams, AnimationSink, RecordingSink, RollClipSink};
pub use grounding::{GroundProbe, SpawnSnap};
pub use input::{CameraHeading, FixedHeading, InputSnapshot, SharedHeading};
pub use integrator::MotionIntegrator;
pub use locomotion::{FrameInput, FramePlan, LocomotionMachine, RollRejection};
pub use state::{CharacterState, LocomotionMode, RollState};

const MAX_MISSING_BODY_WARNINGS: u32 = 3;

/// Errors surfaced by the controller. Ordinary gameplay outcomes (no input,
/// roll on cooldown) are not errors.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0} has no body in the collision world")]
    BodyNotFound(CharacterId),
    #[error("{0} must be spawned before it is updated")]
    NotSpawned(CharacterId),
    #[error("{0} was already spawned")]
    AlreadySpawned(CharacterId),
}

/// What happened to the character during one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Simulation time at the end of the frame.
    pub now: f64,
    pub position: Point3<f32>,
    pub facing_yaw: f32,
    /// Displacement requested from the world.
    pub displacement: Vector3<f32>,
    /// Displacement the world applied after collision resolution.
    pub applied: Vector3<f32>,
    pub grounded: bool,
    pub vertical_velocity: f32,
    pub mode: LocomotionMode,
    pub animation: AnimationParams,
    pub roll_started: bool,
    pub roll_finished: bool,
}

/// Builder that refuses to produce a controller with missing collaborators.
pub struct CharacterControllerBuilder {
    config: ControllerConfig,
    character: Option<CharacterId>,
    shape: Option<CapsuleShape>,
    camera: Option<Box<dyn CameraHeading>>,
    animation: Option<Box<dyn AnimationSink>>,
}

impl CharacterControllerBuilder {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            character: None,
            shape: None,
            camera: None,
            animation: None,
        }
    }

    /// Body in the collision world this controller drives, and its capsule.
    pub fn body(mut self, character: CharacterId, shape: CapsuleShape) -> Self {
        self.character = Some(character);
        self.shape = Some(shape);
        self
    }

    pub fn camera(mut self, camera: impl CameraHeading + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn animation_sink(mut self, sink: impl AnimationSink + 'static) -> Self {
        self.animation = Some(Box::new(sink));
        self
    }

    pub fn build(self) -> Result<CharacterController, ControllerError> {
        let result = self.try_build();
        if let Err(e) = &result {
            log::error!("character controller not created: {}", e);
        }
        result
    }

    fn try_build(self) -> Result<CharacterController, ControllerError> {
        self.config.validate()?;
        let character = self
            .character
            .ok_or(ControllerError::MissingCollaborator("character body"))?;
        let shape = self
            .shape
            .ok_or(ControllerError::MissingCollaborator("collision shape"))?;
        let camera = self.camera.ok_or(ControllerError::MissingCollaborator("camera"))?;
        let animation = self
            .animation
            .ok_or(ControllerError::MissingCollaborator("animation sink"))?;

        Ok(CharacterController {
            probe: GroundProbe::new(shape, &self.config.ground_probe),
            machine: LocomotionMachine::new(&self.config),
            integrator: MotionIntegrator::new(character),
            state: CharacterState::default(),
            config: self.config,
            character,
            camera,
            animation,
            now: 0.0,
            spawned: false,
            missing_body_warnings: 0,
        })
    }
}

/// Kinematic locomotion controller for one character.
pub struct CharacterController {
    config: ControllerConfig,
    character: CharacterId,
    camera: Box<dyn CameraHeading>,
    animation: Box<dyn AnimationSink>,
    probe: GroundProbe,
    machine: LocomotionMachine,
    integrator: MotionIntegrator,
    state: CharacterState,
    now: f64,
    spawned: bool,
    missing_body_warnings: u32,
}

impl CharacterController {
    pub fn builder(config: ControllerConfig) -> CharacterControllerBuilder {
        CharacterControllerBuilder::new(config)
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn probe(&self) -> &GroundProbe {
        &self.probe
    }

    /// Simulation time accumulated from frame deltas.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    /// Places the character flush with the ground and resets its state.
    ///
    /// Runs once, before the first [`CharacterController::update`]. Returns the
    /// applied snap, or `None` if no ground was within reach (the character
    /// then starts airborne where it is).
    pub fn spawn<W: CollisionWorld + ?Sized>(
        &mut self,
        world: &mut W,
        facing_yaw: f32,
    ) -> Result<Option<SpawnSnap>, ControllerError> {
        if self.spawned {
            return Err(ControllerError::AlreadySpawned(self.character));
        }
        let position = world
            .character_position(self.character)
            .ok_or(ControllerError::BodyNotFound(self.character))?;

        let snap = self
            .probe
            .snap_to_ground(world, self.character, position, &self.config.spawn_snap);
        let start = snap.map(|s| s.position).unwrap_or(position);
        match snap {
            Some(s) => log::info!(
                "{} spawned at ({:.2}, {:.2}, {:.2}), snapped {:+.3}",
                self.character,
                start.x,
                start.y,
                start.z,
                s.offset
            ),
            None => log::warn!(
                "{} spawned with no ground within {:.1} below",
                self.character,
                self.config.spawn_snap.max_distance
            ),
        }

        self.state = CharacterState::new(start, facing_yaw);
        world.set_character_yaw(self.character, facing_yaw);
        self.animation.apply(&AnimationParams::neutral(), 0.0);
        self.spawned = true;
        Ok(snap)
    }

    /// Runs one frame: probe, state machine, single move, animation parameters.
    pub fn update<W: CollisionWorld + ?Sized>(
        &mut self,
        world: &mut W,
        input: &InputSnapshot,
        dt: f32,
    ) -> Result<FrameReport, ControllerError> {
        if !self.spawned {
            return Err(ControllerError::NotSpawned(self.character));
        }
        let dt = dt.max(0.0);
        self.now += f64::from(dt);

        let grounded = self
            .probe
            .is_grounded(world, self.character, &self.state.position);
        let frame = FrameInput {
            input,
            camera_yaw: self.camera.yaw(),
            grounded,
            now: self.now,
            dt,
            animation_roll_progress: self.animation.roll_progress(),
        };
        let plan = self.machine.step(&mut self.state, &frame);

        let Some(outcome) = self
            .integrator
            .apply(world, &mut self.state, plan.displacement, dt)
        else {
            self.warn_missing_body();
            return Err(ControllerError::BodyNotFound(self.character));
        };
        self.animation.apply(&plan.animation, dt);

        log::trace!(
            "{} t={:.3} mode={} grounded={} applied=({:.3}, {:.3}, {:.3})",
            self.character,
            self.now,
            self.state.mode.name(),
            grounded,
            outcome.applied.x,
            outcome.applied.y,
            outcome.applied.z
        );

        Ok(FrameReport {
            now: self.now,
            position: self.state.position,
            facing_yaw: self.state.facing_yaw,
            displacement: plan.displacement,
            applied: outcome.applied,
            grounded,
            vertical_velocity: plan.vertical_velocity,
            mode: self.state.mode,
            animation: plan.animation,
            roll_started: plan.roll_started,
            roll_finished: plan.roll_finished,
        })
    }

    fn warn_missing_body(&mut self) {
        if self.missing_body_warnings < MAX_MISSING_BODY_WARNINGS {
            log::warn!("{} has no body; no motion applied", self.character);
            self.missing_body_warnings += 1;
        }
    }
}
