use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

mod posture;
mod store;

pub use posture::{resolve, validate, PostureConfig, ValidationError, DEFAULT_ALERT_INTERVAL_MS};
pub use store::ConfigStore;

/// Application settings, kept in ~/.posture-sentinel/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub capture: CaptureSettings,

    #[serde(default)]
    pub alerts: AlertSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Time between two capture ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// A cycle still in flight after this long is discarded
    #[serde(default = "default_cycle_timeout_ms")]
    pub cycle_timeout_ms: u64,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Program and arguments that write one encoded frame to stdout
    #[serde(default = "default_capture_command")]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Player invoked with `sound_file` appended; empty rings the terminal bell
    #[serde(default)]
    pub sound_command: Vec<String>,

    #[serde(default = "default_sound_file")]
    pub sound_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Slot holding the saved posture thresholds
    #[serde(default = "default_slot")]
    pub slot: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_cycle_timeout_ms() -> u64 {
    5000
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_capture_command() -> Vec<String> {
    [
        "ffmpeg",
        "-loglevel",
        "error",
        "-f",
        "v4l2",
        "-i",
        "/dev/video0",
        "-frames:v",
        "1",
        "-f",
        "image2pipe",
        "-vcodec",
        "mjpeg",
        "-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_sound_file() -> String {
    "sounds/soft-alert.mp3".to_string()
}

fn default_slot() -> String {
    "postureConfig".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            cycle_timeout_ms: default_cycle_timeout_ms(),
            jpeg_quality: default_jpeg_quality(),
            command: default_capture_command(),
        }
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sound_command: Vec::new(),
            sound_file: default_sound_file(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            slot: default_slot(),
        }
    }
}

impl Settings {
    /// Get config directory path (~/.posture-sentinel/), `POSTURE_SENTINEL_HOME` overrides
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("POSTURE_SENTINEL_HOME") {
            return Ok(PathBuf::from(dir));
        }

        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".posture-sentinel"))
    }

    /// Get config file path (~/.posture-sentinel/config.toml)
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get log file path used while the dashboard owns the terminal
    pub fn log_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("posture.log"))
    }

    /// Load settings from file
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file()?;

        if !config_file.exists() {
            tracing::info!("Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_file).context("Failed to read settings file")?;

        let settings: Settings =
            toml::from_str(&contents).context("Failed to parse settings file")?;

        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        let config_file = Self::config_file()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(&config_file, contents).context("Failed to write settings file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, "http://localhost:8000");
        assert_eq!(settings.capture.interval_ms, 1000);
        assert!(settings.alerts.enabled);
        assert_eq!(settings.storage.slot, "postureConfig");
        assert_eq!(settings.capture.command[0], "ffmpeg");
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let serialized = toml::to_string(&settings).unwrap();
        let deserialized: Settings = toml::from_str(&serialized).unwrap();

        assert_eq!(settings.api.base_url, deserialized.api.base_url);
        assert_eq!(settings.capture.command, deserialized.capture.command);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [api]
            base_url = "http://posture.local:9000"

            [alerts]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.api.base_url, "http://posture.local:9000");
        assert_eq!(settings.api.timeout_seconds, 10);
        assert!(!settings.alerts.enabled);
        assert_eq!(settings.capture.cycle_timeout_ms, 5000);
    }
}
