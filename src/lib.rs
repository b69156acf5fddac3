//! Locomotor character controller library
//!
//! Kinematic third-person locomotion: grounding probe, a two-mode locomotion
//! state machine (grounded walking/sprinting and curve-driven dodge rolls) and
//! a single-call motion integrator on top of a rapier3d world.

pub mod character;
pub mod collision;
pub mod config;
pub mod physics;
