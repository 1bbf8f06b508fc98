//! Game flow and the player's run statistics

use serde::{Deserialize, Serialize};

use crate::core::GameplayConfig;

use super::input::InputActions;

/// Top-level game flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Assets are still being built
    #[default]
    Loading,
    /// Waiting in the menu
    Menu,
    /// A run is in progress
    Active,
    /// A run is frozen
    Paused,
    /// Health ran out
    GameOver,
}

impl GameState {
    /// State after the actions pressed this frame
    ///
    /// `Loading` only ends through [`GameState::loaded`].
    pub fn next(self, actions: InputActions) -> Self {
        match self {
            Self::Loading => Self::Loading,
            Self::Menu | Self::GameOver if actions.contains(InputActions::ENTER) => Self::Active,
            Self::Active if actions.contains(InputActions::PAUSE) => Self::Paused,
            Self::Paused if actions.contains(InputActions::PAUSE) => Self::Active,
            Self::Active | Self::Paused | Self::GameOver if actions.contains(InputActions::MENU) => Self::Menu,
            other => other,
        }
    }

    /// State once loading has finished
    pub fn loaded(self) -> Self {
        match self {
            Self::Loading => Self::Menu,
            other => other,
        }
    }

    /// Whether moving from `self` to `next` begins a fresh run
    pub fn starts_run(self, next: Self) -> bool {
        next == Self::Active && matches!(self, Self::Menu | Self::GameOver)
    }

    /// Whether the world is simulated in this state
    pub fn is_simulating(self) -> bool {
        self == Self::Active
    }
}

/// Health, score and damage immunity for the current run
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatus {
    health: i32,
    score: u64,
    damage_cooldown: f32,
    starting_health: i32,
    grace_period: f32,
}

impl PlayerStatus {
    /// Fresh run with the configured health
    pub fn new(config: &GameplayConfig) -> Self {
        Self {
            health: config.starting_health,
            score: 0,
            damage_cooldown: 0.0,
            starting_health: config.starting_health,
            grace_period: config.damage_grace_period,
        }
    }

    /// Restore health and clear the score
    pub fn reset(&mut self) {
        self.health = self.starting_health;
        self.score = 0;
        self.damage_cooldown = 0.0;
    }

    /// Count down the damage immunity
    pub fn tick(&mut self, delta_time: f32) {
        self.damage_cooldown = (self.damage_cooldown - delta_time).max(0.0);
    }

    /// The player stayed inside the track this frame
    pub fn on_track(&mut self) {
        self.score += 1;
    }

    /// The player left the track this frame; returns whether a life was lost
    ///
    /// A grace period of zero costs a life every frame spent off the track.
    pub fn off_track(&mut self) -> bool {
        if self.damage_cooldown > 0.0 || self.is_dead() {
            return false;
        }
        self.health -= 1;
        self.damage_cooldown = self.grace_period;
        log::info!("Player hit the wall, {} lives left", self.health);
        true
    }

    /// Remaining lives
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Frames spent on the track this run
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Whether the run is lost
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}
