//! Tunables for the whole game. Defaults reproduce the hand-tuned values the levels were built
//! around; a RON file under `assets/config/` can override any subset of them.
//!
//! The loaded `GameConfig` is inserted once as a Bevy resource and read by every plugin. Nothing
//! mutates it at runtime.

use std::path::Path;
use std::time::Duration;
use std::{fs, io};

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

/// Default location of the optional override file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/config/game.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Read(#[from] io::Error),
    #[error("parse RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl ConfigError {
    /// A missing override file is the normal case, not a problem worth a warning.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, ConfigError::Read(err) if err.kind() == io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub pickups: PickupConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
            title: "A Trip to the Moon".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fastest downward speed any body may reach.
    pub terminal_velocity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            terminal_velocity: 900.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub speed: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    pub body_size: Vec2,
    /// Invincibility window granted after a side hit, in milliseconds.
    pub hit_invincibility_ms: u64,
    pub knockback: Vec2,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 180.0,
            jump_velocity: 360.0,
            gravity: 700.0,
            body_size: Vec2::new(28.0, 40.0),
            hit_invincibility_ms: 1000,
            knockback: Vec2::new(220.0, 220.0),
        }
    }
}

impl PlayerConfig {
    pub fn hit_invincibility(&self) -> Duration {
        Duration::from_millis(self.hit_invincibility_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EnemyConfig {
    pub gravity: f32,
    pub body_size: Vec2,
    /// Minimum downward player speed for a contact to count as a stomp.
    pub stomp_threshold: f32,
    /// How far the player's feet may sink below the enemy's head and still stomp.
    pub stomp_tolerance: f32,
    pub stomp_bounce: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            gravity: 700.0,
            body_size: Vec2::new(24.0, 28.0),
            stomp_threshold: 60.0,
            stomp_tolerance: 8.0,
            stomp_bounce: 300.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PickupConfig {
    pub star_points: u32,
    pub boots_multiplier: f32,
    pub boots_ms: u64,
    pub invincibility_ms: u64,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            star_points: 100,
            boots_multiplier: 1.2,
            boots_ms: 1000,
            invincibility_ms: 4000,
        }
    }
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(ron::from_str(&data)?)
    }

    /// Falls back to defaults on any failure and hands the error back so the caller can log it
    /// once logging is up.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::load_from_file(path) {
            Ok(cfg) => (cfg, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    /// Soft validation; returns one message per suspicious value.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            warnings.push(format!(
                "window size must be positive (got {}x{})",
                self.window.width, self.window.height
            ));
        }
        if self.physics.terminal_velocity <= 0.0 {
            warnings.push("physics.terminal_velocity must be > 0".to_owned());
        }
        if self.player.speed <= 0.0 {
            warnings.push("player.speed must be > 0".to_owned());
        }
        if self.player.jump_velocity <= 0.0 {
            warnings.push("player.jump_velocity must be > 0 (upward)".to_owned());
        }
        if self.enemy.stomp_tolerance < 0.0 {
            warnings.push("enemy.stomp_tolerance negative".to_owned());
        }
        if self.pickups.boots_multiplier <= 0.0 {
            warnings.push("pickups.boots_multiplier must be > 0".to_owned());
        }
        warnings
    }
}

/// Load outcome kept around until the log plugin is running.
#[derive(Resource, Default)]
pub struct ConfigReport {
    pub error: Option<String>,
    pub missing: bool,
}

/// Inserts an already loaded config. Loading happens before the `App` exists because the window
/// settings come from it.
pub struct ConfigPlugin {
    pub config: GameConfig,
    pub report: Option<ConfigError>,
}

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        let report = match &self.report {
            Some(err) => ConfigReport {
                missing: err.is_missing_file(),
                error: Some(err.to_string()),
            },
            None => ConfigReport::default(),
        };
        app.insert_resource(self.config.clone())
            .insert_resource(report)
            .add_systems(Startup, log_config_report);
    }
}

fn log_config_report(report: Res<ConfigReport>, config: Res<GameConfig>) {
    match (&report.error, report.missing) {
        (Some(_), true) => info!("No {CONFIG_PATH} found; using built-in tuning."),
        (Some(err), false) => warn!("Ignoring {CONFIG_PATH}: {err}. Using built-in tuning."),
        (None, _) => info!("Loaded tuning overrides from {CONFIG_PATH}."),
    }

    for warning in config.validate() {
        warn!("config: {warning}");
    }
}
