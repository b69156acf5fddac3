//! End-to-end controller tests against the rapier3d-backed PhysicsWorld.
//! Each frame the controller updates first, then the world steps, the same
//! order a game loop uses.
//!
//! Run with: cargo test --test controller_physics_test -- --nocapture

use approx::assert_relative_eq;

use locomotor::character::{
    CharacterController, FixedHeading, FrameReport, InputSnapshot, LocomotionMode, RecordingSink,
};
use locomotor::collision::{CharacterId, CollisionWorld, GroundHit, LayerMask, MoveOutcome};
use nalgebra::{Point3, Vector3};
use locomotor::config::ControllerConfig;
use locomotor::physics::{CapsuleShape, PhysicsWorld};

const DT: f32 = 1.0 / 60.0;
const GROUND: LayerMask = LayerMask::layer(0);

// ---------------------------------------------------------------------------
// Shared scene helpers
// ---------------------------------------------------------------------------

/// 40 x 40 floor whose top face is at y = 0.
fn world_with_floor() -> PhysicsWorld {
    let mut world = PhysicsWorld::new();
    world.add_static_box([0.0, -0.5, 0.0], [20.0, 0.5, 20.0], GROUND);
    world
}

fn spawn_character(world: &mut PhysicsWorld, id: CharacterId, at: [f32; 3]) -> CharacterController {
    world.add_character(id, at, CapsuleShape::default());
    world.step(DT);

    let mut controller = CharacterController::builder(ControllerConfig::default())
        .body(id, CapsuleShape::default())
        .camera(FixedHeading(0.0))
        .animation_sink(RecordingSink::new())
        .build()
        .expect("controller");
    controller.spawn(world, 0.0).expect("spawn");
    world.step(DT);
    controller
}

fn run(
    world: &mut PhysicsWorld,
    controller: &mut CharacterController,
    input: &InputSnapshot,
    frames: usize,
) -> FrameReport {
    let mut last = None;
    for _ in 0..frames {
        last = Some(controller.update(world, input, DT).expect("update"));
        world.step(DT);
    }
    last.expect("at least one frame")
}

// ===========================================================================
// Spawn snap
// ===========================================================================
#[test]
fn test_spawn_snaps_character_onto_floor() {
    let mut world = world_with_floor();
    let id = CharacterId(1);
    let controller = spawn_character(&mut world, id, [0.0, 3.0, 0.0]);

    // Capsule half height is 1.0; the feet keep the controller's skin gap.
    let y = controller.state().position.y;
    assert!((y - (1.0 + world.skin_width())).abs() < 0.01, "centre at {}", y);
    let body_y = world.character_position(id).unwrap().y;
    assert!((body_y - y).abs() < 1e-4);
}

#[test]
fn test_idle_character_stays_put_after_spawn_snap() {
    let mut world = world_with_floor();
    let id = CharacterId(11);
    let mut controller = spawn_character(&mut world, id, [0.0, 3.0, 0.0]);
    let rest_y = controller.state().position.y;

    for frame in 0..120 {
        let report = controller.update(&mut world, &InputSnapshot::default(), DT).unwrap();
        world.step(DT);
        assert!(report.grounded, "airborne on frame {}", frame);
        let body_y = world.character_position(id).unwrap().y;
        assert!(
            (body_y - rest_y).abs() < 1e-3,
            "frame {}: y = {}, rest at {}",
            frame,
            body_y,
            rest_y
        );
    }
}

#[test]
fn test_spawn_without_ground_starts_airborne() {
    let mut world = PhysicsWorld::new();
    let id = CharacterId(2);
    let mut controller = spawn_character(&mut world, id, [0.0, 30.0, 0.0]);
    let report = run(&mut world, &mut controller, &InputSnapshot::default(), 30);
    assert!(!report.grounded);
    assert!(report.position.y < 30.0);
    assert!(report.vertical_velocity < -4.0);
}

// ===========================================================================
// Walking
// ===========================================================================
#[test]
fn test_walks_forward_on_flat_floor() {
    let mut world = world_with_floor();
    let id = CharacterId(3);
    let mut controller = spawn_character(&mut world, id, [0.0, 1.0, 0.0]);

    let report = run(&mut world, &mut controller, &InputSnapshot::new(0.0, 1.0), 60);
    assert!(report.grounded);
    assert_eq!(report.mode, LocomotionMode::Grounded);
    // One second at 5 m/s along +Z.
    assert!((report.position.z - 5.0).abs() < 0.3, "z = {}", report.position.z);
    assert!(report.position.x.abs() < 0.05);
    assert!((report.position.y - 1.05).abs() < 0.02, "sank or floated: {}", report.position.y);
    assert_relative_eq!(report.vertical_velocity, -2.0);
}

#[test]
fn test_sprint_outpaces_walk() {
    let mut world = world_with_floor();
    let walker_id = CharacterId(4);
    let sprinter_id = CharacterId(5);
    let mut walker = spawn_character(&mut world, walker_id, [-5.0, 1.0, 0.0]);
    let mut sprinter = spawn_character(&mut world, sprinter_id, [5.0, 1.0, 0.0]);

    let walk = InputSnapshot::new(0.0, 1.0);
    let sprint = walk.with_sprint(true);
    for _ in 0..60 {
        walker.update(&mut world, &walk, DT).unwrap();
        sprinter.update(&mut world, &sprint, DT).unwrap();
        world.step(DT);
    }
    let walked = walker.state().position.z;
    let sprinted = sprinter.state().position.z;
    assert!(sprinted > walked * 1.5, "walk {} sprint {}", walked, sprinted);
}

#[test]
fn test_wall_stops_walking_character() {
    let mut world = world_with_floor();
    world.add_static_box([0.0, 2.0, 3.0], [5.0, 2.0, 0.25], GROUND);
    let id = CharacterId(6);
    let mut controller = spawn_character(&mut world, id, [0.0, 1.0, 0.0]);

    let report = run(&mut world, &mut controller, &InputSnapshot::new(0.0, 1.0), 120);
    // Wall face at z = 2.75, capsule radius 0.5.
    assert!(report.position.z < 2.3, "walked into the wall: z = {}", report.position.z);
    assert!(report.position.z > 2.0);
}

#[test]
fn test_walks_off_ledge_and_lands() {
    let mut world = PhysicsWorld::new();
    // Upper platform ends at z = 2, lower floor top is 3 m below.
    world.add_static_box([0.0, -0.5, 0.0], [5.0, 0.5, 2.0], GROUND);
    world.add_static_box([0.0, -3.5, 10.0], [5.0, 0.5, 10.0], GROUND);
    let id = CharacterId(7);
    let mut controller = spawn_character(&mut world, id, [0.0, 1.0, 0.0]);

    let forward = InputSnapshot::new(0.0, 1.0);
    let mut went_airborne = false;
    for _ in 0..180 {
        let report = controller.update(&mut world, &forward, DT).unwrap();
        world.step(DT);
        if !report.grounded {
            went_airborne = true;
        }
    }
    assert!(went_airborne);

    let report = run(&mut world, &mut controller, &InputSnapshot::default(), 30);
    assert!(report.grounded);
    assert!((report.position.y - -2.0).abs() < 0.15, "landed at y = {}", report.position.y);
    assert_relative_eq!(report.vertical_velocity, -2.0);
}

#[test]
fn test_trigger_volume_is_not_ground() {
    let mut world = PhysicsWorld::new();
    world.add_trigger_box([0.0, -0.5, 0.0], [5.0, 0.5, 5.0], GROUND);
    world.add_static_box([0.0, -10.5, 0.0], [5.0, 0.5, 5.0], GROUND);
    let id = CharacterId(8);
    let mut controller = spawn_character(&mut world, id, [0.0, 1.0, 0.0]);

    // The spawn snap looks through the trigger; nothing solid is in reach.
    let report = run(&mut world, &mut controller, &InputSnapshot::default(), 10);
    assert!(!report.grounded);
    assert!(report.position.y < 1.0);
}

#[test]
fn test_ground_on_excluded_layer_is_not_probed() {
    let mut world = PhysicsWorld::new();
    world.add_static_box([0.0, -0.5, 0.0], [5.0, 0.5, 5.0], LayerMask::layer(2));
    let id = CharacterId(9);
    // Clear of the skin gap; the spawn snap does not see this layer.
    let mut controller = spawn_character(&mut world, id, [0.0, 1.2, 0.0]);

    // The box still blocks movement but never counts as ground.
    let report = run(&mut world, &mut controller, &InputSnapshot::default(), 60);
    assert!(!report.grounded);
    assert!(report.position.y > 1.0, "fell through solid geometry: {}", report.position.y);
    assert!(report.vertical_velocity < -5.0);
}

// ===========================================================================
// Dodge roll
// ===========================================================================
#[test]
fn test_roll_travels_curve_distance() {
    let mut world = world_with_floor();
    let id = CharacterId(10);
    let mut controller = spawn_character(&mut world, id, [0.0, 1.0, -5.0]);
    let config = controller.config().clone();
    let expected = config.roll.speed * config.roll.duration * config.roll.curve.integrate_unit(1000);

    let start = controller.state().position;
    let report = controller
        .update(&mut world, &InputSnapshot::new(1.0, 0.0).with_roll(true), DT)
        .unwrap();
    world.step(DT);
    assert!(report.roll_started);

    let mut finished = false;
    for _ in 0..120 {
        let report = controller.update(&mut world, &InputSnapshot::default(), DT).unwrap();
        world.step(DT);
        if report.roll_finished {
            finished = true;
            break;
        }
    }
    assert!(finished);
    let end = controller.state().position;
    assert!((end.x - start.x - expected).abs() < 0.15, "rolled {}", end.x - start.x);
    assert!((end.z - start.z).abs() < 0.05);
    let yaw = world.character_yaw(id).unwrap();
    assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
}

// ===========================================================================
// Slopes
// ===========================================================================

/// Rapier world that counts move calls per frame.
struct CountingWorld {
    inner: PhysicsWorld,
    moves: usize,
}

impl CollisionWorld for CountingWorld {
    fn sweep_sphere_down(
        &self,
        character: CharacterId,
        origin: Point3<f32>,
        radius: f32,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<GroundHit> {
        self.inner.sweep_sphere_down(character, origin, radius, max_distance, layers)
    }

    fn skin_width(&self) -> f32 {
        self.inner.skin_width()
    }

    fn character_position(&self, character: CharacterId) -> Option<Point3<f32>> {
        self.inner.character_position(character)
    }

    fn teleport_character(&mut self, character: CharacterId, position: Point3<f32>) -> bool {
        self.inner.teleport_character(character, position)
    }

    fn move_character(&mut self, character: CharacterId, desired: Vector3<f32>, dt: f32) -> Option<MoveOutcome> {
        self.moves += 1;
        self.inner.move_character(character, desired, dt)
    }

    fn set_character_yaw(&mut self, character: CharacterId, yaw: f32) -> bool {
        self.inner.set_character_yaw(character, yaw)
    }
}

/// Flat floor with a 20 degree ramp rising along +X, starting at x ~ 2.15.
fn world_with_ramp() -> CountingWorld {
    let mut inner = world_with_floor();
    let angle = 20f32.to_radians();
    let (half_length, half_thickness) = (4.0, 0.25);
    // Lower end of the top face flush with the floor.
    let center_y = half_length * angle.sin() - half_thickness * angle.cos();
    inner.add_static_ramp([6.0, center_y, 0.0], [half_length, half_thickness, 3.0], angle, GROUND);
    CountingWorld { inner, moves: 0 }
}

fn step_counted(
    world: &mut CountingWorld,
    controller: &mut CharacterController,
    input: &InputSnapshot,
) -> FrameReport {
    let before = world.moves;
    let report = controller.update(world, input, DT).unwrap();
    assert_eq!(world.moves, before + 1, "exactly one move per frame");
    world.inner.step(DT);
    report
}

#[test]
fn test_walk_up_and_roll_down_ramp_without_jitter() {
    let mut world = world_with_ramp();
    let id = CharacterId(12);
    let mut controller = spawn_character(&mut world.inner, id, [-2.0, 1.0, 0.0]);
    let start_y = controller.state().position.y;

    // Uphill along +X: height never drops between frames.
    let uphill = InputSnapshot::new(1.0, 0.0);
    let mut previous_y = start_y;
    for frame in 0..120 {
        let report = step_counted(&mut world, &mut controller, &uphill);
        let y = report.position.y;
        assert!(y > previous_y - 0.01, "frame {}: dropped from {} to {}", frame, previous_y, y);
        previous_y = y;
    }
    let top = controller.state().position;
    assert!(top.y - start_y > 0.8, "climbed only {}", top.y - start_y);
    assert!(top.x > 3.5 && top.x < 9.0, "x = {}", top.x);
    assert!(controller.state().grounded);

    // Roll back downhill: height never rises between frames.
    let report = step_counted(&mut world, &mut controller, &InputSnapshot::new(-1.0, 0.0).with_roll(true));
    assert!(report.roll_started);
    let mut previous_y = report.position.y;
    let mut finished = false;
    for frame in 0..60 {
        let report = step_counted(&mut world, &mut controller, &InputSnapshot::default());
        let y = report.position.y;
        assert!(y < previous_y + 0.01, "frame {}: popped from {} to {}", frame, previous_y, y);
        previous_y = y;
        if report.roll_finished {
            finished = true;
            break;
        }
    }
    assert!(finished);
    assert!(controller.state().position.x < top.x - 2.5);
    assert!(controller.state().position.y < top.y);
}
