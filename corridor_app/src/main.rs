//! Corridor flight demo
//!
//! Runs the engine headless against a logging backend. A scripted pilot
//! steers the bird through a procedural corridor, restarting after every
//! game over, until the frame budget is spent.
//!
//! Usage: `corridor_demo [config.toml|config.ron] [frames]`

mod backend;
mod world;

use flight_engine::config::Config;
use flight_engine::core::EngineConfig;
use flight_engine::foundation::logging;
use flight_engine::foundation::math::Vec2;
use flight_engine::game::{FrameInput, GameState, InputActions};
use flight_engine::{AppError, Application, Engine, FrameReport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use backend::LoggingBackend;

const DEFAULT_FRAMES: u64 = 1800;
const ROCK_COUNT: usize = 40;
const FRAME_STEP: f32 = 1.0 / 60.0;

/// Scripted pilot
struct CorridorApp {
    rng: StdRng,
    frame_budget: u64,
    frames: u64,
    steering: InputActions,
    steer_frames_left: u32,
    pending: InputActions,
    best_score: u64,
    runs: u32,
}

impl CorridorApp {
    fn new(frame_budget: u64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            frame_budget,
            frames: 0,
            steering: InputActions::empty(),
            steer_frames_left: 0,
            pending: InputActions::empty(),
            best_score: 0,
            runs: 0,
        }
    }

    /// Hold a random steering direction for a random number of frames
    fn next_steering(&mut self) -> InputActions {
        if self.steer_frames_left == 0 {
            self.steering = match self.rng.gen_range(0..6) {
                0 => InputActions::MOVE_LEFT,
                1 => InputActions::MOVE_RIGHT,
                2 => InputActions::MOVE_UP,
                3 => InputActions::MOVE_DOWN,
                _ => InputActions::empty(),
            };
            self.steer_frames_left = self.rng.gen_range(5..30);
        }
        self.steer_frames_left -= 1;
        self.steering
    }
}

impl Application for CorridorApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let animation = engine.config().animation.clone();
        let world = world::build(engine.scene_mut(), &mut self.rng, ROCK_COUNT, &animation)?;
        for &segment in &world.segments {
            engine.add_track(segment)?;
        }
        engine.set_player(world.bird)?;
        engine.play_animation(world.flap);
        log::debug!("Corridor root {:?} with {} rocks", world.corridor, world.rocks.len());
        self.pending = InputActions::ENTER;
        log::info!("Corridor demo ready, flying for {} frames", self.frame_budget);
        Ok(())
    }

    fn poll_input(&mut self, engine: &Engine) -> FrameInput {
        let mut actions = std::mem::take(&mut self.pending);
        if engine.context().state == GameState::Active {
            actions |= self.next_steering();
        }
        if self.frames + 1 >= self.frame_budget {
            actions |= InputActions::QUIT;
        }
        FrameInput {
            actions,
            mouse_delta: Vec2::new(self.rng.gen_range(-0.5..0.5), 0.0),
            scroll: 0.0,
        }
    }

    fn on_frame(&mut self, _engine: &mut Engine, report: &FrameReport) -> Result<(), AppError> {
        self.frames += 1;
        self.best_score = self.best_score.max(report.score);
        match report.state {
            GameState::GameOver => {
                self.runs += 1;
                log::info!("Run {} over with score {}, restarting", self.runs, report.score);
                self.pending = InputActions::ENTER;
            }
            GameState::Active if self.frames % 60 == 0 => {
                log::info!(
                    "HUD: health {} score {} ({}/{} drawn)",
                    report.health,
                    report.score,
                    report.counters.displayed,
                    report.counters.total
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn fixed_delta(&self) -> Option<f32> {
        Some(FRAME_STEP)
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!(
            "Flew {} frames over {} finished run(s), best score {}, last health {}",
            self.frames,
            self.runs,
            self.best_score,
            engine.context().status.health()
        );
    }
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, AppError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = EngineConfig::load_from_file(path).map_err(|e| AppError::Config(format!("{path}: {e}")))?;
    config.validate().map_err(|e| AppError::Config(e.to_string()))?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    logging::init_with_level(&config.log_level);

    let frames = match args.get(1) {
        Some(text) => text.parse::<u64>().map_err(|e| AppError::Config(format!("frame count '{text}': {e}")))?,
        None => DEFAULT_FRAMES,
    };

    log::info!("Starting corridor demo");
    let mut backend = LoggingBackend::new(config.animation.max_bones);
    let mut app = CorridorApp::new(frames, 0x00b1_7d5e);
    let mut engine = Engine::new(config)?;

    if let Err(e) = engine.run(&mut app, &mut backend) {
        log::error!("Application error: {e}");
        return Err(e.into());
    }

    let stats = backend.stats();
    log::info!(
        "Backend: {} frames, {} draws, {} bone matrices uploaded",
        stats.frames,
        stats.draws,
        stats.bone_matrices
    );
    if let Some(camera) = backend.camera() {
        log::debug!("Last view-projection: {:?}", camera.view_projection);
    }
    Ok(())
}
