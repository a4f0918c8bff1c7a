//! Game configuration (window, movement, machine tuning). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Mouse sensitivity multiplier (1.0 = default).
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// Walk speed in units per second.
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    /// Speed multiplier while sprinting.
    #[serde(default = "default_sprint_multiplier")]
    pub sprint_multiplier: f32,
    /// Number of prize capsules stocked into each machine.
    #[serde(default = "default_prize_amount")]
    pub prize_amount: u32,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_sensitivity() -> f32 {
    1.0
}
fn default_move_speed() -> f32 {
    5.0
}
fn default_sprint_multiplier() -> f32 {
    3.0
}
fn default_prize_amount() -> u32 {
    30
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            sensitivity: default_sensitivity(),
            move_speed: default_move_speed(),
            sprint_multiplier: default_sprint_multiplier(),
            prize_amount: default_prize_amount(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns defaults.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
            return Self::default();
        }
        // First run: write the defaults so they can be edited
        let config = Self::default();
        config.save();
        config
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("config.ron")
}
