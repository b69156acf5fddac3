//! Grounding probe: per-frame ground test and the one-time spawn snap.

use nalgebra::{Point3, Vector3};

use crate::collision::{CharacterId, CollisionWorld, LayerMask};
use crate::config::{GroundProbeConfig, SpawnSnapConfig};
use crate::physics::CapsuleShape;

/// Sphere swept by the probe, for debug drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSphere {
    pub center: Point3<f32>,
    pub radius: f32,
    pub cast_distance: f32,
}

/// Result of the spawn snap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSnap {
    /// Vertical correction applied (negative moves down).
    pub offset: f32,
    pub position: Point3<f32>,
}

/// Stateless ground test for one character capsule.
#[derive(Debug, Clone)]
pub struct GroundProbe {
    shape: CapsuleShape,
    radius: f32,
    cast_distance: f32,
    origin_height: f32,
    layers: LayerMask,
}

impl GroundProbe {
    pub fn new(shape: CapsuleShape, config: &GroundProbeConfig) -> Self {
        Self {
            shape,
            radius: config.radius,
            cast_distance: config.cast_distance,
            origin_height: config.origin_height,
            layers: config.layers,
        }
    }

    pub fn shape(&self) -> CapsuleShape {
        self.shape
    }

    /// Lowest point of the capsule centred at `position`.
    pub fn feet(&self, position: &Point3<f32>) -> Point3<f32> {
        position - Vector3::y() * self.shape.half_height()
    }

    pub fn probe_sphere(&self, position: &Point3<f32>) -> ProbeSphere {
        ProbeSphere {
            center: self.feet(position) + Vector3::y() * (self.origin_height + self.radius),
            radius: self.radius,
            cast_distance: self.cast_distance,
        }
    }

    /// Whether ground on the configured layers lies within reach below the feet.
    pub fn is_grounded<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        character: CharacterId,
        position: &Point3<f32>,
    ) -> bool {
        let sphere = self.probe_sphere(position);
        world
            .sweep_sphere_down(
                character,
                sphere.center,
                sphere.radius,
                self.origin_height + sphere.cast_distance,
                self.layers,
            )
            .is_some()
    }

    /// Moves a freshly spawned character vertically so its feet rest on the ground,
    /// separated from it by the world's skin width.
    ///
    /// The sweep starts `lift` above the feet so a capsule spawned slightly
    /// inside the floor is raised out of it. Returns `None` and leaves the body
    /// alone when no ground is found within reach.
    pub fn snap_to_ground<W: CollisionWorld + ?Sized>(
        &self,
        world: &mut W,
        character: CharacterId,
        position: Point3<f32>,
        config: &SpawnSnapConfig,
    ) -> Option<SpawnSnap> {
        let feet = self.feet(&position);
        let origin = feet + Vector3::y() * (config.lift + config.radius);
        let hit = world.sweep_sphere_down(
            character,
            origin,
            config.radius,
            config.lift + config.max_distance,
            self.layers,
        )?;

        let offset = world.skin_width() - (hit.distance - config.lift);
        let snapped = position + Vector3::y() * offset;
        if !world.teleport_character(character, snapped) {
            return None;
        }
        Some(SpawnSnap {
            offset,
            position: snapped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{GroundHit, MoveOutcome};
    use std::cell::Cell;

    /// Flat infinite floor at a fixed height.
    struct FlatFloor {
        top: f32,
        skin: f32,
        layers: LayerMask,
        teleported: Option<Point3<f32>>,
        sweeps: Cell<usize>,
    }

    impl FlatFloor {
        fn new(top: f32) -> Self {
            Self {
                top,
                skin: 0.0,
                layers: LayerMask::layer(0),
                teleported: None,
                sweeps: Cell::new(0),
            }
        }
    }

    impl CollisionWorld for FlatFloor {
        fn sweep_sphere_down(
            &self,
            _character: CharacterId,
            origin: Point3<f32>,
            radius: f32,
            max_distance: f32,
            layers: LayerMask,
        ) -> Option<GroundHit> {
            self.sweeps.set(self.sweeps.get() + 1);
            if !layers.contains(self.layers) {
                return None;
            }
            let gap = (origin.y - radius - self.top).max(0.0);
            (gap <= max_distance).then(|| GroundHit {
                distance: gap,
                point: Point3::new(origin.x, self.top, origin.z),
            })
        }

        fn skin_width(&self) -> f32 {
            self.skin
        }

        fn character_position(&self, _character: CharacterId) -> Option<Point3<f32>> {
            self.teleported
        }

        fn teleport_character(&mut self, _character: CharacterId, position: Point3<f32>) -> bool {
            self.teleported = Some(position);
            true
        }

        fn move_character(&mut self, _: CharacterId, desired: Vector3<f32>, _: f32) -> Option<MoveOutcome> {
            Some(MoveOutcome { applied: desired, grounded: false })
        }

        fn set_character_yaw(&mut self, _: CharacterId, _: f32) -> bool {
            true
        }
    }

    fn probe() -> GroundProbe {
        GroundProbe::new(CapsuleShape::new(0.5, 2.0), &GroundProbeConfig::default())
    }

    #[test]
    fn test_grounded_when_feet_touch_floor() {
        let floor = FlatFloor::new(0.0);
        // Feet at y = 0.05, the controller's resting gap.
        assert!(probe().is_grounded(&floor, CharacterId(1), &Point3::new(0.0, 1.05, 0.0)));
    }

    #[test]
    fn test_airborne_above_reach() {
        let floor = FlatFloor::new(0.0);
        assert!(!probe().is_grounded(&floor, CharacterId(1), &Point3::new(0.0, 1.5, 0.0)));
    }

    #[test]
    fn test_other_layers_are_not_ground() {
        let mut floor = FlatFloor::new(0.0);
        floor.layers = LayerMask::layer(4);
        assert!(!probe().is_grounded(&floor, CharacterId(1), &Point3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_probe_sphere_sits_above_feet() {
        let sphere = probe().probe_sphere(&Point3::new(0.0, 1.0, 0.0));
        assert!((sphere.center.y - (0.1 + 0.4)).abs() < 1e-6);
        assert_eq!(sphere.radius, 0.4);
    }

    #[test]
    fn test_snap_removes_floating_gap() {
        let mut floor = FlatFloor::new(0.0);
        let snap = probe()
            .snap_to_ground(&mut floor, CharacterId(1), Point3::new(0.0, 3.0, 0.0), &SpawnSnapConfig::default())
            .unwrap();
        assert!((snap.offset + 2.0).abs() < 1e-5);
        assert!((snap.position.y - 1.0).abs() < 1e-5);
        assert_eq!(floor.teleported, Some(snap.position));
    }

    #[test]
    fn test_snap_leaves_skin_gap_under_feet() {
        let mut floor = FlatFloor::new(0.0);
        floor.skin = 0.05;
        let snap = probe()
            .snap_to_ground(&mut floor, CharacterId(1), Point3::new(0.0, 3.0, 0.0), &SpawnSnapConfig::default())
            .unwrap();
        assert!((snap.offset + 1.95).abs() < 1e-5);
        assert!((probe().feet(&snap.position).y - 0.05).abs() < 1e-5);
        assert!(probe().is_grounded(&floor, CharacterId(1), &snap.position));

        // Already resting at the gap: nothing to correct.
        let again = probe()
            .snap_to_ground(&mut floor, CharacterId(1), snap.position, &SpawnSnapConfig::default())
            .unwrap();
        assert!(again.offset.abs() < 1e-5);
    }

    #[test]
    fn test_snap_lifts_sunken_spawn() {
        let mut floor = FlatFloor::new(0.0);
        let snap = probe()
            .snap_to_ground(&mut floor, CharacterId(1), Point3::new(0.0, 0.8, 0.0), &SpawnSnapConfig::default())
            .unwrap();
        assert!((snap.offset - 0.2).abs() < 1e-5);
        assert!((snap.position.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_snap_without_ground_leaves_body() {
        let mut floor = FlatFloor::new(-100.0);
        let snap = probe().snap_to_ground(
            &mut floor,
            CharacterId(1),
            Point3::new(0.0, 3.0, 0.0),
            &SpawnSnapConfig::default(),
        );
        assert!(snap.is_none());
        assert!(floor.teleported.is_none());
        assert_eq!(floor.sweeps.get(), 1);
    }
}
