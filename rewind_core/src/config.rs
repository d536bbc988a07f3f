//! Configuration for the rewind engine and the game glue around it.
//!
//! Loaded from `backtrack_config.json` with support for an environment variable override.

use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::{Color, Resource};
use serde::Deserialize;
use thiserror::Error;

use crate::audio::Cue;

pub const BUILTIN_GAME_CONFIG: &str = include_str!("data/backtrack_config.json");

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub fixed_hz: f64,
    pub rewind: RewindSettings,
    pub audio: AudioConfig,
    pub player: PlayerConfig,
    pub physics: PhysicsConfig,
    pub death_tint: [f32; 4],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 50.0,
            rewind: RewindSettings::default(),
            audio: AudioConfig::default(),
            player: PlayerConfig::default(),
            physics: PhysicsConfig::default(),
            death_tint: [1.0, 0.35, 0.35, 1.0],
        }
    }
}

impl GameConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_GAME_CONFIG).expect("builtin game config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, GameConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| GameConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = GameConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn death_color(&self) -> Color {
        let [r, g, b, a] = self.death_tint;
        Color::rgba(r, g, b, a)
    }
}

/// Per-body rewind tuning.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewindSettings {
    /// Seconds of history kept while recording.
    pub record_seconds: f64,
    /// Rate at which the rewind effect eases toward its target, per second.
    pub transition_rate: f64,
}

impl Default for RewindSettings {
    fn default() -> Self {
        Self {
            record_seconds: 5.0,
            transition_rate: 5.0,
        }
    }
}

impl RewindSettings {
    pub fn validate(&self) -> Result<(), RewindError> {
        if !(self.record_seconds.is_finite() && self.record_seconds > 0.0) {
            return Err(RewindError::NonPositiveRecordSeconds(self.record_seconds));
        }
        if !(self.transition_rate.is_finite() && self.transition_rate > 0.0) {
            return Err(RewindError::NonPositiveTransitionRate(
                self.transition_rate,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub master_volume: f32,
    pub bgm_volume: f32,
    pub sfx_volume: f32,
    pub rewind_loop_volume: f32,
    /// Fraction of the music volume kept while rewinding.
    pub duck_factor: f32,
    pub bgm: Option<String>,
    pub clips: HashMap<String, String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            bgm_volume: 0.5,
            sfx_volume: 1.0,
            rewind_loop_volume: 0.8,
            duck_factor: 0.3,
            bgm: None,
            clips: HashMap::new(),
        }
    }
}

impl AudioConfig {
    pub fn clip_path(&self, cue: Cue) -> Option<&str> {
        self.clips.get(cue.as_str()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub move_speed: f32,
    pub jump_speed: f32,
    pub fall_multiplier: f32,
    pub low_jump_multiplier: f32,
    pub coyote_seconds: f32,
    pub jump_buffer_seconds: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            jump_speed: 16.0,
            fall_multiplier: 2.5,
            low_jump_multiplier: 2.0,
            coyote_seconds: 0.1,
            jump_buffer_seconds: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { gravity: 30.0 }
    }
}

/// Misconfiguration that keeps a body from recording or rewinding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RewindError {
    #[error("record_seconds must be positive, got {0}")]
    NonPositiveRecordSeconds(f64),
    #[error("fixed tick duration must be positive, got {0}s")]
    NonPositiveTick(f64),
    #[error("transition_rate must be positive, got {0}")]
    NonPositiveTransitionRate(f64),
    #[error("history capacity rounds to zero ({record_seconds}s of history at {tick_seconds}s per tick)")]
    ZeroCapacity {
        record_seconds: f64,
        tick_seconds: f64,
    },
}

#[derive(Debug, Error)]
pub enum GameConfigError {
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read game config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle for accessing the game configuration.
#[derive(Resource, Debug, Clone)]
pub struct GameConfigHandle(pub Arc<GameConfig>);

impl GameConfigHandle {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<GameConfig> {
        Arc::clone(&self.0)
    }
}

impl Default for GameConfigHandle {
    fn default() -> Self {
        Self::new(GameConfig::builtin())
    }
}

/// Load the game configuration from `BACKTRACK_CONFIG_PATH` or the crate data file,
/// falling back to the compiled-in copy.
pub fn load_game_config_from_env() -> Arc<GameConfig> {
    let override_path = env::var("BACKTRACK_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/backtrack_config.json");

    let candidates: Vec<PathBuf> = match override_path {
        Some(ref path) => vec![path.clone()],
        None => vec![default_path.clone()],
    };

    for path in candidates {
        match GameConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "backtrack::config",
                    path = %path.display(),
                    "game_config.loaded=file"
                );
                return Arc::new(config);
            }
            Err(err) => {
                tracing::warn!(
                    target: "backtrack::config",
                    path = %path.display(),
                    error = %err,
                    "game_config.load_failed"
                );
            }
        }
    }

    let config = GameConfig::builtin();
    tracing::info!(target: "backtrack::config", "game_config.loaded=builtin");
    config
}
