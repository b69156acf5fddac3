//! Locomotor CLI - run a scripted character on a flat floor and print what it does

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use locomotor::character::{
    AnimationParams, CharacterController, FrameReport, InputSnapshot, RollClipSink, SharedHeading,
};
use locomotor::collision::{CharacterId, LayerMask};
use locomotor::config::ControllerConfig;
use locomotor::physics::{CapsuleShape, PhysicsWorld};

const PLAYER: CharacterId = CharacterId(1);

#[derive(Parser)]
#[command(name = "locomotor")]
#[command(about = "Kinematic character locomotion sandbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted walk / sprint / roll / camera-turn timeline
    Simulate {
        /// Controller configuration (TOML). Omit for defaults.
        #[arg(short, long, env = "LOCOMOTOR_CONFIG")]
        config: Option<PathBuf>,
        /// Simulated duration in seconds
        #[arg(short, long, default_value = "6.0")]
        seconds: f32,
        /// Frames per second
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Print every Nth frame (frames where a roll starts or ends are always printed)
        #[arg(long, default_value = "6")]
        every: u32,
        /// One JSON object per line instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the default configuration as TOML
    PrintConfig,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            seconds,
            fps,
            every,
            json,
        } => simulate(config, seconds, fps, every, json),
        Commands::PrintConfig => print_config(),
    }
}

fn print_config() {
    match ControllerConfig::default().to_toml_string() {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted timeline
// ---------------------------------------------------------------------------

/// Input and camera heading for a frame.
fn scripted_input(frame: u32, fps: u32) -> (InputSnapshot, f32) {
    let t = frame as f32 / fps as f32;
    let camera_yaw = if t >= 3.0 { 90f32.to_radians() } else { 0.0 };
    // Single-frame press at two seconds, dodging to the right
    if frame == 2 * fps {
        return (InputSnapshot::new(1.0, 0.0).with_roll(true), camera_yaw);
    }
    let input = match t {
        t if t < 0.5 => InputSnapshot::default(),
        t if t < 1.5 => InputSnapshot::new(0.0, 1.0),
        t if t < 2.0 => InputSnapshot::new(0.0, 1.0).with_sprint(true),
        t if t < 4.5 => InputSnapshot::new(0.0, 1.0),
        _ => InputSnapshot::default(),
    };
    (input, camera_yaw)
}

#[derive(Serialize)]
struct FrameRow {
    frame: u32,
    time: f64,
    position: [f32; 3],
    facing_deg: f32,
    mode: &'static str,
    grounded: bool,
    vertical_velocity: f32,
    roll_started: bool,
    roll_finished: bool,
    animation: AnimationParams,
}

impl FrameRow {
    fn new(frame: u32, report: &FrameReport) -> Self {
        Self {
            frame,
            time: report.now,
            position: [report.position.x, report.position.y, report.position.z],
            facing_deg: report.facing_yaw.to_degrees(),
            mode: report.mode.name(),
            grounded: report.grounded,
            vertical_velocity: report.vertical_velocity,
            roll_started: report.roll_started,
            roll_finished: report.roll_finished,
            animation: report.animation,
        }
    }
}

fn load_config(path: Option<PathBuf>) -> ControllerConfig {
    let Some(path) = path else {
        return ControllerConfig::default();
    };
    match ControllerConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn simulate(config: Option<PathBuf>, seconds: f32, fps: u32, every: u32, json: bool) {
    if fps == 0 || !seconds.is_finite() || seconds <= 0.0 {
        eprintln!("Error: --fps and --seconds must be positive");
        std::process::exit(1);
    }
    let config = load_config(config);
    let dt = 1.0 / fps as f32;
    let frames = (seconds * fps as f32).ceil() as u32;
    let every = every.max(1);

    let mut world = PhysicsWorld::new();
    world.add_static_box([0.0, -0.5, 0.0], [100.0, 0.5, 100.0], LayerMask::layer(0));
    world.add_character(PLAYER, [0.0, 1.5, 0.0], CapsuleShape::default());
    world.step(dt);

    let camera = SharedHeading::new(0.0);
    let controller = CharacterController::builder(config.clone())
        .body(PLAYER, CapsuleShape::default())
        .camera(camera.clone())
        .animation_sink(RollClipSink::new(config.roll.duration))
        .build();
    let mut controller = match controller {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = controller.spawn(&mut world, 0.0) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    world.step(dt);

    if !json {
        println!(
            "{:>5} {:>7} {:>8} {:>8} {:>8} {:>8} {:>8} {:>4} {:>7}",
            "frame", "time", "x", "y", "z", "facing", "mode", "gnd", "vy"
        );
    }

    for frame in 0..frames {
        let (input, camera_yaw) = scripted_input(frame, fps);
        camera.set(camera_yaw);

        let report = match controller.update(&mut world, &input, dt) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Error: frame {}: {}", frame, e);
                std::process::exit(1);
            }
        };
        world.step(dt);

        if frame % every != 0 && !report.roll_started && !report.roll_finished {
            continue;
        }
        let row = FrameRow::new(frame, &report);
        if json {
            match serde_json::to_string(&row) {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        } else {
            println!(
                "{:>5} {:>7.3} {:>8.3} {:>8.3} {:>8.3} {:>8.1} {:>8} {:>4} {:>7.2}",
                row.frame,
                row.time,
                row.position[0],
                row.position[1],
                row.position[2],
                row.facing_deg,
                row.mode,
                if row.grounded { "yes" } else { "no" },
                row.vertical_velocity
            );
        }
    }
}
