//! Application trait and lifecycle management

use crate::engine::{Engine, EngineError, FrameReport};
use crate::game::FrameInput;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive the engine from a window layer or a script.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the main loop. Build the scene, register the player
    /// and the track, and start the player's animation here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Collect this frame's input
    fn poll_input(&mut self, engine: &Engine) -> FrameInput;

    /// Inspect the outcome of a tick
    ///
    /// Called after every frame. HUD updates and scripted checks go here.
    fn on_frame(&mut self, _engine: &mut Engine, _report: &FrameReport) -> Result<(), AppError> {
        Ok(())
    }

    /// Whether the window layer asked to close
    fn should_close(&self, _engine: &Engine) -> bool {
        false
    }

    /// Fixed frame step in seconds; `None` samples the wall clock
    fn fixed_delta(&self) -> Option<f32> {
        None
    }

    /// Cleanup the application
    ///
    /// Called once after the main loop exits.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),

    /// Asset building error
    #[error("Asset error: {0}")]
    Asset(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelHandle;
    use crate::core::EngineConfig;
    use crate::foundation::math::RawMat4;
    use crate::game::{GameState, InputActions};
    use crate::render::{BackendResult, RenderBackend};

    struct NullBackend;

    impl RenderBackend for NullBackend {
        fn begin_frame(&mut self, _view: &RawMat4, _projection: &RawMat4) -> BackendResult<()> {
            Ok(())
        }

        fn draw_model(&mut self, _model: ModelHandle, _model_matrix: &RawMat4) -> BackendResult<()> {
            Ok(())
        }

        fn upload_bone_matrices(&mut self, _model: ModelHandle, _matrices: &[RawMat4]) -> BackendResult<()> {
            Ok(())
        }

        fn end_frame(&mut self) -> BackendResult<()> {
            Ok(())
        }
    }

    /// Starts a run, then quits after a fixed number of frames
    struct Scripted {
        frames: u32,
        seen: Vec<GameState>,
        cleaned_up: bool,
    }

    impl Application for Scripted {
        fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
            Ok(())
        }

        fn poll_input(&mut self, _engine: &Engine) -> FrameInput {
            self.frames += 1;
            match self.frames {
                1 => FrameInput::from_actions(InputActions::ENTER),
                4 => FrameInput::from_actions(InputActions::QUIT),
                _ => FrameInput::default(),
            }
        }

        fn on_frame(&mut self, _engine: &mut Engine, report: &FrameReport) -> Result<(), AppError> {
            self.seen.push(report.state);
            Ok(())
        }

        fn fixed_delta(&self) -> Option<f32> {
            Some(1.0 / 60.0)
        }

        fn cleanup(&mut self, _engine: &mut Engine) {
            self.cleaned_up = true;
        }
    }

    #[test]
    fn test_run_drives_application_until_quit() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mut app = Scripted {
            frames: 0,
            seen: Vec::new(),
            cleaned_up: false,
        };
        engine.run(&mut app, &mut NullBackend).unwrap();

        assert_eq!(app.seen.len(), 4);
        assert_eq!(app.seen[0], GameState::Active);
        assert!(app.cleaned_up);
        assert_eq!(engine.timer().frame_count(), 4);
    }

    #[test]
    fn test_initialization_failure_stops_run() {
        struct Broken;
        impl Application for Broken {
            fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
                Err(AppError::Asset("missing corridor".to_string()))
            }
            fn poll_input(&mut self, _engine: &Engine) -> FrameInput {
                FrameInput::default()
            }
            fn cleanup(&mut self, _engine: &mut Engine) {}
        }

        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let result = engine.run(&mut Broken, &mut NullBackend);
        assert!(matches!(result, Err(EngineError::Application(_))));
    }
}
