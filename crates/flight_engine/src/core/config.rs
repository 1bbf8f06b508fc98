//! # Engine Configuration
//!
//! All tunables for the scene core in one serializable tree. Every section has
//! defaults matching the shipped game, so a config file only needs the keys it
//! overrides.
//!
//! ## Sections
//!
//! - **View**: screen size and the culling frustum's clip distances
//! - **Camera**: spawn position and input response
//! - **Gameplay**: health, player placement relative to the camera
//! - **Animation**: bone budget and clip defaults

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::{utils, Vec3};

/// Screen and frustum settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Framebuffer width in pixels
    pub screen_width: u32,
    /// Framebuffer height in pixels
    pub screen_height: u32,
    /// Near clip distance used for culling
    pub near: f32,
    /// Far clip distance used for culling
    pub far: f32,
    /// Far clip distance of the spy camera's projection
    pub spy_far: f32,
}

impl ViewConfig {
    /// Width / height
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.screen_width as f32 / self.screen_height as f32
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 920,
            near: 0.1,
            far: 10.0,
            spy_far: 100.0,
        }
    }
}

/// Camera spawn and input response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial camera position
    pub start_position: Vec3,
    /// Units per second for keyboard movement
    pub movement_speed: f32,
    /// Degrees per pixel of mouse motion
    pub mouse_sensitivity: f32,
    /// Initial vertical field of view in degrees
    pub zoom: f32,
    /// Where the spy camera watches the corridor from
    pub spy_position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: Vec3::new(0.0, 0.0, 3.0),
            movement_speed: 20.0,
            mouse_sensitivity: 0.1,
            zoom: 45.0,
            spy_position: Vec3::new(0.0, 0.0, -30.0),
        }
    }
}

/// Health, scoring and player placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Lives at the start of a run
    pub starting_health: i32,
    /// Player model offset from the camera position
    pub player_offset: Vec3,
    /// Uniform scale applied to the player model
    pub player_scale: f32,
    /// Seconds of immunity after losing a life; zero costs a life every
    /// frame spent off the track
    pub damage_grace_period: f32,
    /// Multiplier on the frame delta when bouncing the camera back off a wall
    pub knockback_factor: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            starting_health: 3,
            player_offset: Vec3::new(0.0, -1.0, -4.0),
            player_scale: 0.1,
            damage_grace_period: 0.0,
            knockback_factor: 7.0,
        }
    }
}

/// Skeletal animation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Size of the skinning shader's bone matrix array
    pub max_bones: usize,
    /// Tick rate used when a clip does not declare one
    pub default_ticks_per_second: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            max_bones: 100,
            default_ticks_per_second: 25.0,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration that applications load from `.toml` or `.ron`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter
    pub log_level: String,
    /// View and frustum settings
    pub view: ViewConfig,
    /// Camera settings
    pub camera: CameraConfig,
    /// Gameplay rules
    pub gameplay: GameplayConfig,
    /// Animation limits
    pub animation: AnimationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            view: ViewConfig::default(),
            camera: CameraConfig::default(),
            gameplay: GameplayConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with defaults and the `info` log level
    pub fn new() -> Self {
        Self::default()
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the culling clip distances
    pub fn with_clip_distances(mut self, near: f32, far: f32) -> Self {
        self.view.near = near;
        self.view.far = far;
        self
    }

    /// Set starting health
    pub fn with_starting_health(mut self, health: i32) -> Self {
        self.gameplay.starting_health = health;
        self
    }

    /// Validate the configuration
    ///
    /// Every float must be finite, so a bad file fails here instead of on
    /// every frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let view = &self.view;
        if view.screen_width == 0 || view.screen_height == 0 {
            return Err(ConfigError::Invalid("screen dimensions must be non-zero".to_string()));
        }
        if !(positive(view.near) && view.far.is_finite() && view.far > view.near) {
            return Err(ConfigError::Invalid(format!(
                "clip distances must satisfy 0 < near < far < inf (near = {}, far = {})",
                view.near, view.far
            )));
        }
        if !(view.spy_far.is_finite() && view.spy_far > view.near) {
            return Err(ConfigError::Invalid(format!("spy far distance {} must be finite and beyond near", view.spy_far)));
        }

        let camera = &self.camera;
        if !(1.0..=45.0).contains(&camera.zoom) {
            return Err(ConfigError::Invalid(format!("zoom {} outside [1, 45]", camera.zoom)));
        }
        if !(utils::is_finite(&camera.start_position) && utils::is_finite(&camera.spy_position)) {
            return Err(ConfigError::Invalid("camera positions must be finite".to_string()));
        }
        if !(non_negative(camera.movement_speed) && non_negative(camera.mouse_sensitivity)) {
            return Err(ConfigError::Invalid("camera speed and sensitivity must be finite and not negative".to_string()));
        }

        let gameplay = &self.gameplay;
        if gameplay.starting_health <= 0 {
            return Err(ConfigError::Invalid("starting health must be positive".to_string()));
        }
        if !positive(gameplay.player_scale) {
            return Err(ConfigError::Invalid(format!("player scale {} must be positive", gameplay.player_scale)));
        }
        if !utils::is_finite(&gameplay.player_offset) {
            return Err(ConfigError::Invalid("player offset must be finite".to_string()));
        }
        if !(non_negative(gameplay.damage_grace_period) && non_negative(gameplay.knockback_factor)) {
            return Err(ConfigError::Invalid(
                "grace period and knockback must be finite and not negative".to_string(),
            ));
        }

        if self.animation.max_bones == 0 {
            return Err(ConfigError::Invalid("max bones must be at least 1".to_string()));
        }
        if !positive(self.animation.default_ticks_per_second) {
            return Err(ConfigError::Invalid("default ticks per second must be positive".to_string()));
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

impl Config for EngineConfig {}
