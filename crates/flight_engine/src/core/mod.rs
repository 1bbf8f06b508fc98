//! # Core Engine Module
//!
//! Shared configuration for every subsystem of the scene core.
//!
//! ## Organization
//!
//! - **Config**: the serializable [`EngineConfig`] tree and its sections

pub mod config;

pub use crate::config::{Config, ConfigError, ConfigFormat};
pub use config::{
    AnimationConfig,
    CameraConfig,
    EngineConfig,
    GameplayConfig,
    ViewConfig,
};
