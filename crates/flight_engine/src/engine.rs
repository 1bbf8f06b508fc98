//! Core engine implementation
//!
//! The [`Engine`] owns the scene graph, the camera, the player's animator and
//! the game rules, and steps them once per frame in [`Engine::tick`].

use std::sync::Arc;

use thiserror::Error;

use crate::animation::{Animation, AnimationError, Animator};
use crate::application::Application;
use crate::assets::ModelError;
use crate::config::ConfigError;
use crate::core::EngineConfig;
use crate::foundation::math::Mat4Ext;
use crate::foundation::time::FrameTimer;
use crate::game::{FrameInput, GameState, InputActions, PlayerStatus};
use crate::physics::collision;
use crate::render::{BonePalette, Camera, RenderBackend, RenderError};
use crate::scene::{DrawCounters, EntityId, Frustum, GeometryError, SceneError, SceneGraph};

/// Per-run state the frame driver reads and mutates every tick
#[derive(Debug, Clone)]
pub struct FrameContext {
    /// Player camera, also used for culling
    pub camera: Camera,
    /// Detached camera the scene can be viewed through
    pub spy_camera: Camera,
    /// Whether frames are rendered through `spy_camera`
    pub spy_view: bool,
    /// Health and score
    pub status: PlayerStatus,
    /// Game flow
    pub state: GameState,
}

impl FrameContext {
    /// Context at the start of the game
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            camera: Camera::from_config(&config.camera),
            spy_camera: Camera::spy_from_config(&config.camera),
            spy_view: false,
            status: PlayerStatus::new(&config.gameplay),
            state: GameState::default(),
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Entities drawn and visited
    pub counters: DrawCounters,
    /// Game state after the tick
    pub state: GameState,
    /// Score after the tick
    pub score: u64,
    /// Health after the tick
    pub health: i32,
    /// Whether the player touched the track; `false` when nothing was checked
    ///
    /// Contact is only tested while a run is active and both a player and at
    /// least one track entity are registered.
    pub collided: bool,
    /// Whether this frame was rendered through the spy camera
    pub spy_view: bool,
    /// The player asked the window layer to switch fullscreen this frame
    pub toggle_fullscreen: bool,
}

/// Main engine struct
///
/// Applications build the world through [`Engine::scene_mut`], then register
/// the player and the track it has to stay inside.
pub struct Engine {
    config: EngineConfig,
    scene: SceneGraph,
    context: FrameContext,
    animator: Animator,
    palette: BonePalette,
    player: Option<EntityId>,
    track: Vec<EntityId>,
    timer: FrameTimer,
    running: bool,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!(
            "Initializing engine ({}x{}, clip {}..{})",
            config.view.screen_width,
            config.view.screen_height,
            config.view.near,
            config.view.far
        );

        Ok(Self {
            context: FrameContext::new(&config),
            config,
            scene: SceneGraph::new(),
            animator: Animator::new(),
            palette: BonePalette::default(),
            player: None,
            track: Vec::new(),
            timer: FrameTimer::new(),
            running: true,
        })
    }

    /// Run the main loop until the application closes or the engine quits
    pub fn run<A: Application>(&mut self, app: &mut A, backend: &mut dyn RenderBackend) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::Application(format!("App initialization: {e}")))?;
        self.finish_loading();

        log::info!("Starting main loop...");
        while self.running && !app.should_close(self) {
            let delta_time = match app.fixed_delta() {
                Some(step) => self.timer.advance(step),
                None => self.timer.update(),
            };
            let input = app.poll_input(self);
            let report = self.tick(delta_time, &input, backend)?;
            app.on_frame(self, &report)
                .map_err(|e| EngineError::Application(format!("App frame: {e}")))?;
        }

        app.cleanup(self);
        log::info!(
            "Engine shutdown complete after {} frames ({:.1} fps)",
            self.timer.frame_count(),
            self.timer.average_fps()
        );
        Ok(())
    }

    /// Step one frame
    ///
    /// Outside the `Active` state only the animator advances and the scene
    /// is drawn as it stands. A negative or non-finite `delta_time` is
    /// treated as zero.
    pub fn tick(
        &mut self,
        delta_time: f32,
        input: &FrameInput,
        backend: &mut dyn RenderBackend,
    ) -> Result<FrameReport, EngineError> {
        let delta_time = if delta_time.is_finite() && delta_time >= 0.0 {
            delta_time
        } else {
            log::warn!("Ignoring invalid frame delta {delta_time}");
            0.0
        };
        self.handle_actions(input.actions);
        let simulating = self.context.state.is_simulating();

        let steps = if simulating {
            self.context.status.tick(delta_time);
            input.apply_look(&mut self.context.spy_camera);
            input.apply_to_camera(&mut self.context.camera, delta_time)
        } else {
            Vec::new()
        };

        if let (true, Some(player)) = (simulating, self.player) {
            let gameplay = &self.config.gameplay;
            self.scene.loc_and_scale(
                player,
                self.context.camera.position + gameplay.player_offset,
                gameplay.player_scale,
            )?;
        }
        self.scene.update_all();

        self.animator.update(delta_time);
        if let Some(player) = self.player {
            if !self.animator.final_bone_matrices().is_empty() {
                self.palette.update(self.animator.final_bone_matrices());
                let handle = self.scene.model(player)?.handle();
                backend.upload_bone_matrices(handle, self.palette.as_slice())?;
            }
        }

        let view = &self.config.view;
        let camera = &self.context.camera;
        let aspect = view.aspect_ratio();
        let frustum = Frustum::from_camera(camera, aspect, camera.fov_y(), view.near, view.far)?;
        // The spy camera only changes the viewpoint; culling stays with the player
        let (eye, far) = if self.context.spy_view {
            (&self.context.spy_camera, view.spy_far)
        } else {
            (camera, view.far)
        };
        backend.begin_frame(
            &eye.view_matrix().to_raw(),
            &eye.projection_matrix(aspect, view.near, far).to_raw(),
        )?;
        let mut counters = DrawCounters::default();
        for &root in self.scene.roots() {
            self.scene.draw_self_and_child(root, &frustum, backend, &mut counters)?;
        }

        let mut collided = false;
        if let (true, Some(player), false) = (simulating, self.player, self.track.is_empty()) {
            collided = !collision::colliding_entities(&self.scene, player, self.track.iter().copied())?.is_empty();
            if collided {
                self.context.status.on_track();
            } else {
                let knockback = delta_time * self.config.gameplay.knockback_factor;
                for step in &steps {
                    self.context.camera.process_movement(step.opposite(), knockback);
                }
                self.context.status.off_track();
                if self.context.status.is_dead() {
                    log::info!("Game over with score {}", self.context.status.score());
                    self.context.state = GameState::GameOver;
                }
            }
        }
        backend.end_frame()?;

        log::debug!(
            "Frame: {}/{} drawn, score {}, health {}, {:?}",
            counters.displayed,
            counters.total,
            self.context.status.score(),
            self.context.status.health(),
            self.context.state
        );
        Ok(FrameReport {
            counters,
            state: self.context.state,
            score: self.context.status.score(),
            health: self.context.status.health(),
            collided,
            spy_view: self.context.spy_view,
            toggle_fullscreen: input.pressed(InputActions::TOGGLE_FULLSCREEN),
        })
    }

    fn handle_actions(&mut self, actions: InputActions) {
        if actions.contains(InputActions::QUIT) {
            self.quit();
        }
        if actions.contains(InputActions::TOGGLE_SPY_VIEW) {
            self.context.spy_view = !self.context.spy_view;
            log::info!("Spy view {}", if self.context.spy_view { "on" } else { "off" });
        }
        let previous = self.context.state;
        let next = previous.next(actions);
        if next == previous {
            return;
        }
        if previous.starts_run(next) {
            self.context.status.reset();
            self.context.camera = Camera::from_config(&self.config.camera);
            self.context.spy_camera = Camera::spy_from_config(&self.config.camera);
            log::info!("New run started");
        }
        log::info!("Game state: {:?} -> {:?}", previous, next);
        self.context.state = next;
    }

    /// Leave the loading state
    pub fn finish_loading(&mut self) {
        let loaded = self.context.state.loaded();
        if loaded != self.context.state {
            log::info!("Loading finished, {} entities in scene", self.scene.len());
            self.context.state = loaded;
        }
    }

    /// Entity pinned in front of the camera and tested against the track
    pub fn set_player(&mut self, id: EntityId) -> Result<(), EngineError> {
        if !self.scene.contains(id) {
            return Err(SceneError::UnknownEntity(id).into());
        }
        self.player = Some(id);
        Ok(())
    }

    /// Add an entity the player must stay in contact with
    pub fn add_track(&mut self, id: EntityId) -> Result<(), EngineError> {
        if !self.scene.contains(id) {
            return Err(SceneError::UnknownEntity(id).into());
        }
        self.track.push(id);
        Ok(())
    }

    /// Loop `clip` on the player's animator
    pub fn play_animation(&mut self, clip: Arc<Animation>) {
        self.animator.play(clip);
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scene graph
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene graph
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Camera, health, score and game state
    pub fn context(&self) -> &FrameContext {
        &self.context
    }

    /// Mutable frame context
    pub fn context_mut(&mut self) -> &mut FrameContext {
        &mut self.context
    }

    /// Player's animator
    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Registered player entity
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Registered track entities
    pub fn track(&self) -> &[EntityId] {
        &self.track
    }

    /// Frame timing used by [`Engine::run`]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene graph error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Degenerate camera or frustum
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Model import error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Animation clip error
    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    /// Rendering error
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MeshSource, Model, ModelHandle};
    use crate::foundation::math::{RawMat4, Vec3};
    use crate::render::BackendResult;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct CountingBackend {
        frames: usize,
        draws: Vec<ModelHandle>,
        uploads: usize,
        view: Option<RawMat4>,
    }

    impl RenderBackend for CountingBackend {
        fn begin_frame(&mut self, view: &RawMat4, _projection: &RawMat4) -> BackendResult<()> {
            self.view = Some(*view);
            self.draws.clear();
            Ok(())
        }

        fn draw_model(&mut self, model: ModelHandle, _model_matrix: &RawMat4) -> BackendResult<()> {
            self.draws.push(model);
            Ok(())
        }

        fn upload_bone_matrices(&mut self, _model: ModelHandle, _matrices: &[RawMat4]) -> BackendResult<()> {
            self.uploads += 1;
            Ok(())
        }

        fn end_frame(&mut self) -> BackendResult<()> {
            self.frames += 1;
            Ok(())
        }
    }

    fn cube(handle: u64, half: f32) -> Arc<Model> {
        let source = MeshSource::cuboid(Vec3::new(half, half, half));
        Arc::new(Model::from_meshes(ModelHandle(handle), "cube", vec![source]).unwrap())
    }

    /// Player pinned at (0, -1, -1) inside a track box around the origin
    fn engine_with_track(track_center: Vec3) -> Engine {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let track = engine.scene_mut().spawn(cube(1, 5.0)).unwrap();
        engine.scene_mut().set_local_position(track, track_center).unwrap();
        let player = engine.scene_mut().spawn(cube(2, 1.0)).unwrap();
        engine.add_track(track).unwrap();
        engine.set_player(player).unwrap();
        engine.finish_loading();
        engine
    }

    fn start_run(engine: &mut Engine, backend: &mut CountingBackend) {
        engine.tick(0.0, &FrameInput::from_actions(InputActions::ENTER), backend).unwrap();
        assert_eq!(engine.context().state, GameState::Active);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig::new().with_clip_distances(5.0, 1.0);
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_unknown_player_is_rejected() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let id = engine.scene_mut().spawn(cube(1, 1.0)).unwrap();
        engine.scene_mut().despawn(id).unwrap();
        assert!(matches!(engine.set_player(id), Err(EngineError::Scene(SceneError::UnknownEntity(_)))));
    }

    #[test]
    fn test_menu_frame_draws_without_simulating() {
        let mut engine = engine_with_track(Vec3::zeros());
        let mut backend = CountingBackend::default();
        let report = engine.tick(0.1, &FrameInput::from_actions(InputActions::MOVE_LEFT), &mut backend).unwrap();

        assert_eq!(report.state, GameState::Menu);
        assert_eq!(report.score, 0);
        assert!(!report.collided);
        assert_eq!(backend.frames, 1);
        assert_eq!(report.counters.total, 2);
        assert_relative_eq!(engine.context().camera.position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_active_frame_pins_player_and_scores() {
        let mut engine = engine_with_track(Vec3::zeros());
        let mut backend = CountingBackend::default();
        start_run(&mut engine, &mut backend);

        let report = engine.tick(0.016, &FrameInput::default(), &mut backend).unwrap();
        assert!(report.collided);
        assert_eq!(report.score, 2);
        assert_eq!(report.health, 3);

        let player = engine.player().unwrap();
        let transform = engine.scene().transform(player).unwrap();
        assert_relative_eq!(transform.global_position(), Vec3::new(0.0, -1.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(transform.global_scale(), Vec3::new(0.1, 0.1, 0.1), epsilon = 1e-6);
    }

    #[test]
    fn test_leaving_track_knocks_back_and_costs_health() {
        let mut engine = engine_with_track(Vec3::new(50.0, 0.0, 0.0));
        let mut backend = CountingBackend::default();
        start_run(&mut engine, &mut backend);

        let report = engine.tick(0.1, &FrameInput::from_actions(InputActions::MOVE_LEFT), &mut backend).unwrap();
        assert!(!report.collided);
        // One life for the starting frame, one for this one
        assert_eq!(report.health, 1);
        // Left by 20 * 0.1, then right by 20 * 0.1 * 7
        assert_relative_eq!(engine.context().camera.position.x, 12.0, epsilon = 1e-4);
    }

    #[test]
    fn test_health_runs_out_into_game_over() {
        let mut engine = Engine::new(EngineConfig::default().with_starting_health(2)).unwrap();
        let player = engine.scene_mut().spawn(cube(2, 1.0)).unwrap();
        let wall = engine.scene_mut().spawn(cube(1, 1.0)).unwrap();
        engine.scene_mut().set_local_position(wall, Vec3::new(0.0, 40.0, 0.0)).unwrap();
        engine.set_player(player).unwrap();
        engine.add_track(wall).unwrap();
        engine.finish_loading();

        let mut backend = CountingBackend::default();
        start_run(&mut engine, &mut backend);
        let report = engine.tick(0.016, &FrameInput::default(), &mut backend).unwrap();
        assert_eq!(report.state, GameState::GameOver);
        assert_eq!(report.health, 0);

        // Enter restarts with full health
        let report = engine.tick(0.016, &FrameInput::from_actions(InputActions::ENTER), &mut backend).unwrap();
        assert_eq!(report.state, GameState::Active);
        assert_eq!(report.health, 1);
    }

    #[test]
    fn test_quit_stops_the_engine() {
        let mut engine = engine_with_track(Vec3::zeros());
        let mut backend = CountingBackend::default();
        engine.tick(0.016, &FrameInput::from_actions(InputActions::QUIT), &mut backend).unwrap();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_infinite_far_plane_is_rejected_up_front() {
        let config = EngineConfig::new().with_clip_distances(0.1, f32::INFINITY);
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_invalid_delta_does_not_advance_the_run() {
        let mut engine = engine_with_track(Vec3::zeros());
        let mut backend = CountingBackend::default();
        start_run(&mut engine, &mut backend);

        for delta_time in [f32::NAN, -1.0, f32::INFINITY] {
            let report = engine
                .tick(delta_time, &FrameInput::from_actions(InputActions::MOVE_UP), &mut backend)
                .unwrap();
            assert_eq!(report.state, GameState::Active);
        }
        assert_relative_eq!(engine.context().camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert!(engine.context().camera.position.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_spy_view_and_fullscreen_requests() {
        let mut engine = engine_with_track(Vec3::zeros());
        let mut backend = CountingBackend::default();
        start_run(&mut engine, &mut backend);
        let player_view = backend.view;

        let input = FrameInput::from_actions(InputActions::TOGGLE_SPY_VIEW | InputActions::TOGGLE_FULLSCREEN);
        let report = engine.tick(0.016, &input, &mut backend).unwrap();
        assert!(report.spy_view);
        assert!(report.toggle_fullscreen);
        assert_eq!(backend.view, Some(engine.context().spy_camera.view_matrix().to_raw()));
        assert_ne!(backend.view, player_view);
        // Culling still follows the player camera
        assert_eq!(report.counters.displayed, 2);

        let report = engine.tick(0.016, &FrameInput::default(), &mut backend).unwrap();
        assert!(report.spy_view);
        assert!(!report.toggle_fullscreen);

        let report = engine.tick(0.016, &FrameInput::from_actions(InputActions::TOGGLE_SPY_VIEW), &mut backend).unwrap();
        assert!(!report.spy_view);
        assert_eq!(backend.view, player_view);
    }
}
