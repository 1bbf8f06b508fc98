//! # Flight Engine
//!
//! Scene and animation core for a 3D corridor flying game.
//!
//! ## Features
//!
//! - **Scene Graph**: slotmap arena of entities with hierarchical transforms
//! - **Frustum Culling**: sphere and box bounding volumes tested against six planes
//! - **Collision**: axis-aligned overlap between entities
//! - **Skeletal Animation**: keyframe sampling into a flat bone matrix palette
//! - **Backend Agnostic**: drawing goes through the [`render::RenderBackend`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flight_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         // Build the scene, register the player and the track
//!         Ok(())
//!     }
//!
//!     fn poll_input(&mut self, _engine: &Engine) -> FrameInput {
//!         FrameInput::from_actions(InputActions::QUIT)
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn run(backend: &mut dyn RenderBackend) -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.run(&mut MyApp, backend)
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;
pub mod foundation;

// Scene and simulation
pub mod scene;
pub mod physics;
pub mod assets;
pub mod animation;
pub mod render;
pub mod game;

mod application;
mod engine;

#[cfg(test)]
mod tests;

pub use application::{Application, AppError};
pub use engine::{Engine, EngineError, FrameContext, FrameReport};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Engine, EngineError, FrameContext, FrameReport,
        foundation::{
            math::{Vec2, Vec3, Mat4, Quat, RawMat4},
            time::FrameTimer,
        },
        core::{Config, EngineConfig},
        scene::{BoundingKind, DrawCounters, EntityId, Frustum, SceneGraph, Transform},
        physics::collision::check_collision,
        assets::{BoneInfluence, MeshSource, Model, ModelHandle, Vertex, VertexWeight},
        animation::{Animation, AnimationNode, Animator, BoneChannel, Keyframe},
        render::{BackendResult, BonePalette, Camera, CameraMovement, CameraUniform, RenderBackend, RenderError},
        game::{FrameInput, GameState, InputActions, PlayerStatus},
    };
}
