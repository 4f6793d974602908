//! Configuration loading and types for scribekey
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/scribekey/config.toml)
//! 3. Environment variables (SCRIBEKEY_*)
//! 4. CLI arguments (highest priority)
//!
//! A missing or unparseable config file is logged and falls back to the
//! defaults; it never aborts startup. Runtime rebinds write the full
//! mapping back through `save_config`.

use crate::error::ScribekeyError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Scribekey Configuration
#
# Location: ~/.config/scribekey/config.toml
# All settings can be overridden via CLI flags

[hotkey]
# Trigger held for push-to-talk recording.
# Format: "+"-joined lowercase tokens, last token is the trigger key or
# pointer button, preceding ctrl/shift/alt tokens are required modifiers.
# Keyboard triggers need at least one modifier; pointer buttons
# (left, right, middle, x, x2) may stand alone.
# Examples: "ctrl+`", "ctrl+shift+r", "x2"
recording_trigger = "ctrl+`"

# Chord that enters interactive capture mode to define a new
# recording trigger.
settings_trigger = "ctrl+shift+h"

[audio]
# Audio input device ("default" uses system default)
# List devices with: pactl list sources short
device = "default"

# Sample rate in Hz (the engine expects 16000)
sample_rate = 16000

# Maximum recording duration in seconds (safety limit)
max_duration_secs = 60

[engine]
# Path to the recognition engine binary (whisper-cli compatible).
# Leave empty to search PATH and common install locations.
# path = "/usr/local/bin/whisper-cli"

# Path to the model file passed to the engine with -m
model = "~/.local/share/scribekey/models/ggml-small.en.bin"

# Kill the engine and fail the session if it runs longer than this
timeout_secs = 30

[overlay]
# Show the status overlay (recording / transcribing / result feedback)
enabled = true
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub hotkey: HotkeyConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Trigger binding configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    /// Spec string for the push-to-talk trigger, e.g. "ctrl+`" or "x2"
    #[serde(default = "default_recording_trigger")]
    pub recording_trigger: String,

    /// Spec string for the chord that opens interactive capture mode
    #[serde(default = "default_settings_trigger")]
    pub settings_trigger: String,
}

/// Audio capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// PipeWire/PulseAudio device name, or "default"
    #[serde(default = "default_device")]
    pub device: String,

    /// Sample rate in Hz (the engine expects 16000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Maximum recording duration in seconds (safety limit)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u32,
}

/// Recognition engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Path to the engine binary; None means search PATH and common locations
    #[serde(default)]
    pub path: Option<String>,

    /// Path to the model file passed with -m
    #[serde(default = "default_model")]
    pub model: String,

    /// Engine invocation timeout in seconds
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

/// Overlay presentation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    /// Show the status overlay
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_recording_trigger() -> String {
    "ctrl+`".to_string()
}

fn default_settings_trigger() -> String {
    "ctrl+shift+h".to_string()
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_max_duration() -> u32 {
    60
}

fn default_model() -> String {
    "~/.local/share/scribekey/models/ggml-small.en.bin".to_string()
}

fn default_engine_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            recording_trigger: default_recording_trigger(),
            settings_trigger: default_settings_trigger(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            max_duration_secs: default_max_duration(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            model: default_model(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: HotkeyConfig::default(),
            audio: AudioConfig::default(),
            engine: EngineConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "scribekey")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "scribekey")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path (for models)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "scribekey")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the models directory path
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }

    /// Ensure the config and models directories exist
    pub fn ensure_directories() -> std::io::Result<()> {
        if let Some(config_dir) = Self::config_dir() {
            std::fs::create_dir_all(&config_dir)?;
            tracing::debug!("Ensured config directory exists: {:?}", config_dir);
        }

        let models_dir = Self::models_dir();
        std::fs::create_dir_all(&models_dir)?;
        tracing::debug!("Ensured models directory exists: {:?}", models_dir);

        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
///
/// A missing file uses pure defaults. An unreadable or unparseable file is
/// logged as a warning and also falls back to defaults, so a broken config
/// never keeps the daemon from starting.
pub fn load_config(path: Option<&Path>) -> Result<Config, ScribekeyError> {
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(parsed) => config = parsed,
                    Err(e) => {
                        tracing::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config {:?}: {}, using defaults", path, e);
                }
            }
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(trigger) = std::env::var("SCRIBEKEY_TRIGGER") {
        config.hotkey.recording_trigger = trigger;
    }
    if let Ok(model) = std::env::var("SCRIBEKEY_MODEL") {
        config.engine.model = model;
    }

    Ok(config)
}

/// Save configuration to file
///
/// Persists the full mapping; used when a rebind changes the recording
/// trigger at runtime.
pub fn save_config(config: &Config, path: &Path) -> Result<(), ScribekeyError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ScribekeyError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| ScribekeyError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| ScribekeyError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base) = directories::BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hotkey.recording_trigger, "ctrl+`");
        assert_eq!(config.hotkey.settings_trigger, "ctrl+shift+h");
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.engine.timeout_secs, 30);
        assert!(config.overlay.enabled);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
            [hotkey]
            recording_trigger = "x2"
            settings_trigger = "ctrl+alt+s"

            [audio]
            device = "pipewire"
            sample_rate = 16000
            max_duration_secs = 30

            [engine]
            path = "/opt/whisper/whisper-cli"
            model = "/opt/whisper/ggml-base.en.bin"
            timeout_secs = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.hotkey.recording_trigger, "x2");
        assert_eq!(config.hotkey.settings_trigger, "ctrl+alt+s");
        assert_eq!(config.audio.device, "pipewire");
        assert_eq!(config.audio.max_duration_secs, 30);
        assert_eq!(config.engine.path.as_deref(), Some("/opt/whisper/whisper-cli"));
        assert_eq!(config.engine.timeout_secs, 10);
        assert!(config.overlay.enabled); // default
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.hotkey.recording_trigger, "ctrl+`");
        assert_eq!(config.audio.max_duration_secs, 60);
    }

    #[test]
    fn test_default_config_text_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.hotkey.recording_trigger, "ctrl+`");
        assert_eq!(config.engine.timeout_secs, 30);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.hotkey.recording_trigger = "right".to_string();
        save_config(&config, &path).unwrap();

        let reloaded = load_config(Some(&path)).unwrap();
        assert_eq!(reloaded.hotkey.recording_trigger, "right");
        assert_eq!(reloaded.hotkey.settings_trigger, "ctrl+shift+h");
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [ valid toml").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.hotkey.recording_trigger, "ctrl+`");
    }
}
