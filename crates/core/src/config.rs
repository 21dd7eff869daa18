//! Rig configuration loaded from TOML

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::session::Difficulty;

/// Engine strength settings for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DifficultyProfile {
    /// Passed to the engine as `UCI_Elo`.
    pub elo: u32,
    pub movetime_ms: u64,
    /// Probability of swapping the engine's move for a random legal one.
    #[serde(default)]
    pub blunder_chance: f64,
}

impl DifficultyProfile {
    pub fn easy() -> Self {
        Self {
            elo: 1320,
            movetime_ms: 500,
            blunder_chance: 0.75,
        }
    }

    pub fn hard() -> Self {
        Self {
            elo: 2000,
            movetime_ms: 1500,
            blunder_chance: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Stockfish binary, or "stockfish" if in PATH.
    pub engine_path: String,
    /// Address the controller bridge connects to.
    pub listen_addr: String,
    /// JSON file the vision process keeps up to date.
    pub snapshot_path: PathBuf,
    /// How long to wait for an `ASK_*` pacing token before giving up.
    pub pacing_timeout_secs: u64,
    pub max_replacement_attempts: u32,
    pub easy: DifficultyProfile,
    pub hard: DifficultyProfile,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            engine_path: "stockfish".to_string(),
            listen_addr: "127.0.0.1:7878".to_string(),
            snapshot_path: PathBuf::from("snapshot.json"),
            pacing_timeout_secs: 60,
            max_replacement_attempts: 5,
            easy: DifficultyProfile::easy(),
            hard: DifficultyProfile::hard(),
        }
    }
}

impl RigConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RigConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, profile) in [("easy", &self.easy), ("hard", &self.hard)] {
            if !(0.0..=1.0).contains(&profile.blunder_chance) {
                return Err(Error::Config(format!(
                    "{}.blunder_chance must be between 0 and 1, got {}",
                    name, profile.blunder_chance
                )));
            }
            if profile.movetime_ms == 0 {
                return Err(Error::Config(format!("{}.movetime_ms must be positive", name)));
            }
        }
        if self.pacing_timeout_secs == 0 {
            return Err(Error::Config("pacing_timeout_secs must be positive".into()));
        }
        if self.max_replacement_attempts == 0 {
            return Err(Error::Config("max_replacement_attempts must be positive".into()));
        }
        Ok(())
    }

    pub fn profile(&self, difficulty: Difficulty) -> DifficultyProfile {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Hard => self.hard,
        }
    }

    pub fn pacing_timeout(&self) -> Duration {
        Duration::from_secs(self.pacing_timeout_secs)
    }
}
