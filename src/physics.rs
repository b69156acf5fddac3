use nalgebra::{Point3, Vector3};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;
use std::collections::HashMap;

use crate::character::constants::physics as consts;
use crate::character::steering::{rotation_from_yaw, yaw_from_direction};
use crate::collision::{CharacterId, CollisionWorld, GroundHit, LayerMask, MoveOutcome};

// Characters live on their own group and never collide with each other,
// only with level geometry on any of the remaining groups.
const GROUP_CHARACTER: Group = Group::GROUP_32;

/// Capsule dimensions of a character body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    pub radius: f32,
    /// Total height including both hemispheres.
    pub height: f32,
}

impl CapsuleShape {
    pub fn new(radius: f32, height: f32) -> Self {
        Self { radius, height }
    }

    /// Half-height of the cylindrical part.
    pub fn half_segment(&self) -> f32 {
        (self.height - 2.0 * self.radius).max(0.0) / 2.0
    }

    /// Distance from the capsule centre down to its lowest point.
    pub fn half_height(&self) -> f32 {
        self.half_segment() + self.radius
    }
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self::new(consts::CHARACTER_RADIUS, consts::CHARACTER_HEIGHT)
    }
}

/// Rapier handles backing one character.
#[derive(Debug, Clone, Copy)]
pub struct CharacterBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
    pub shape: CapsuleShape,
}

fn layer_group(layers: LayerMask) -> Group {
    Group::from_bits_truncate(layers.0) & !GROUP_CHARACTER
}

fn build_kinematic_controller() -> KinematicCharacterController {
    KinematicCharacterController {
        offset: CharacterLength::Absolute(consts::CHARACTER_OFFSET),
        autostep: Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(consts::AUTOSTEP_MAX_HEIGHT),
            min_width: CharacterLength::Absolute(consts::AUTOSTEP_MIN_WIDTH),
            include_dynamic_bodies: false,
        }),
        max_slope_climb_angle: consts::MAX_SLOPE_CLIMB_DEG.to_radians(),
        min_slope_slide_angle: consts::MIN_SLOPE_SLIDE_DEG.to_radians(),
        snap_to_ground: Some(CharacterLength::Absolute(consts::SNAP_TO_GROUND)),
        ..Default::default()
    }
}

/// Rapier3D world holding level geometry and kinematic character capsules.
///
/// Characters are kinematic position-based bodies: a move schedules the next
/// translation and [`PhysicsWorld::step`] applies it, so the host steps the
/// world once per frame after every controller has updated.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    controller: KinematicCharacterController,
    characters: HashMap<CharacterId, CharacterBody>,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, consts::DEFAULT_GRAVITY, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            controller: build_kinematic_controller(),
            characters: HashMap::new(),
        }
    }

    /// Steps the pipeline by `dt`, applying scheduled kinematic moves and
    /// refreshing the query pipeline.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Adds a fixed box of level geometry on the given layers.
    pub fn add_static_box(
        &mut self,
        center: [f32; 3],
        half_extents: [f32; 3],
        layers: LayerMask,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents[0], half_extents[1], half_extents[2])
            .translation(vector![center[0], center[1], center[2]])
            .collision_groups(InteractionGroups::new(layer_group(layers), Group::ALL))
            .build();
        self.collider_set.insert(collider)
    }

    /// Adds a fixed slab rotated around +Z by `angle` radians (a ramp).
    pub fn add_static_ramp(
        &mut self,
        center: [f32; 3],
        half_extents: [f32; 3],
        angle: f32,
        layers: LayerMask,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents[0], half_extents[1], half_extents[2])
            .position(Isometry::new(
                vector![center[0], center[1], center[2]],
                vector![0.0, 0.0, angle],
            ))
            .collision_groups(InteractionGroups::new(layer_group(layers), Group::ALL))
            .build();
        self.collider_set.insert(collider)
    }

    /// Adds a trigger-only box. Probes and moves pass through it.
    pub fn add_trigger_box(
        &mut self,
        center: [f32; 3],
        half_extents: [f32; 3],
        layers: LayerMask,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents[0], half_extents[1], half_extents[2])
            .translation(vector![center[0], center[1], center[2]])
            .sensor(true)
            .collision_groups(InteractionGroups::new(layer_group(layers), Group::ALL))
            .build();
        self.collider_set.insert(collider)
    }

    /// Adds a kinematic capsule for a character, centred at `position`.
    pub fn add_character(&mut self, id: CharacterId, position: [f32; 3], shape: CapsuleShape) -> CharacterBody {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::capsule_y(shape.half_segment(), shape.radius)
            .collision_groups(InteractionGroups::new(GROUP_CHARACTER, Group::ALL & !GROUP_CHARACTER))
            .build();
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        let character = CharacterBody {
            body_handle,
            collider_handle,
            shape,
        };
        if let Some(previous) = self.characters.insert(id, character) {
            log::warn!("{} re-added; dropping its previous body", id);
            self.remove_body(previous);
        }
        character
    }

    pub fn remove_character(&mut self, id: CharacterId) -> bool {
        match self.characters.remove(&id) {
            Some(character) => {
                self.remove_body(character);
                true
            }
            None => false,
        }
    }

    fn remove_body(&mut self, character: CharacterBody) {
        self.rigid_body_set.remove(
            character.body_handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    pub fn has_character(&self, id: CharacterId) -> bool {
        self.characters.contains_key(&id)
    }

    /// Current yaw of the character body.
    pub fn character_yaw(&self, id: CharacterId) -> Option<f32> {
        let character = self.characters.get(&id)?;
        let body = self.rigid_body_set.get(character.body_handle)?;
        Some(yaw_from_direction(&(body.rotation() * Vector3::z())))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld for PhysicsWorld {
    fn sweep_sphere_down(
        &self,
        character: CharacterId,
        origin: Point3<f32>,
        radius: f32,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<GroundHit> {
        let mut filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(Group::ALL, layer_group(layers)));
        if let Some(body) = self.characters.get(&character) {
            filter = filter.exclude_rigid_body(body.body_handle);
        }

        let ball = Ball::new(radius);
        let shape_pos = Isometry::translation(origin.x, origin.y, origin.z);
        let shape_vel = vector![0.0, -1.0, 0.0];

        let (_, hit) = self.query_pipeline.cast_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &shape_pos,
            &shape_vel,
            &ball,
            ShapeCastOptions::with_max_time_of_impact(max_distance),
            filter,
        )?;

        let distance = hit.time_of_impact.max(0.0);
        Some(GroundHit {
            distance,
            point: Point3::new(origin.x, origin.y - distance - radius, origin.z),
        })
    }

    fn skin_width(&self) -> f32 {
        consts::CHARACTER_OFFSET
    }

    fn character_position(&self, character: CharacterId) -> Option<Point3<f32>> {
        let character = self.characters.get(&character)?;
        let body = self.rigid_body_set.get(character.body_handle)?;
        let pos = body.translation();
        Some(Point3::new(pos.x, pos.y, pos.z))
    }

    fn teleport_character(&mut self, character: CharacterId, position: Point3<f32>) -> bool {
        let Some(character) = self.characters.get(&character) else {
            return false;
        };
        let Some(body) = self.rigid_body_set.get_mut(character.body_handle) else {
            return false;
        };
        body.set_translation(position.coords, true);
        true
    }

    fn move_character(
        &mut self,
        character: CharacterId,
        desired: Vector3<f32>,
        dt: f32,
    ) -> Option<MoveOutcome> {
        let character = *self.characters.get(&character)?;
        let body = self.rigid_body_set.get(character.body_handle)?;
        let collider = self.collider_set.get(character.collider_handle)?;
        let current_pos = *body.position();

        let filter = QueryFilter::default()
            .exclude_rigid_body(character.body_handle)
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_CHARACTER, Group::ALL & !GROUP_CHARACTER));

        let movement = self.controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            collider.shape(),
            &current_pos,
            desired,
            filter,
            |_collision| {},
        );

        let new_pos = current_pos.translation.vector + movement.translation;
        let body = self.rigid_body_set.get_mut(character.body_handle)?;
        body.set_next_kinematic_translation(new_pos);

        Some(MoveOutcome {
            applied: movement.translation,
            grounded: movement.grounded,
        })
    }

    fn set_character_yaw(&mut self, character: CharacterId, yaw: f32) -> bool {
        let Some(character) = self.characters.get(&character) else {
            return false;
        };
        let Some(body) = self.rigid_body_set.get_mut(character.body_handle) else {
            return false;
        };
        body.set_next_kinematic_rotation(rotation_from_yaw(yaw));
        true
    }
}
