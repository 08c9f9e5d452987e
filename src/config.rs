//! Configuration management for sentrycam
//!
//! Provides configuration loading, saving, and validation for camera capture,
//! motion detection, encoder invocation, and output storage.

use crate::errors::RecorderError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentryCamConfig {
    pub capture: CaptureSettings,
    pub motion: MotionSettings,
    pub encoder: EncoderSettings,
    pub storage: StorageSettings,
}

/// Camera capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Camera device index (V4L2 index on Linux)
    pub device_index: u32,
    /// Capture width in pixels
    pub width: u32,
    /// Capture height in pixels
    pub height: u32,
    /// Target frame rate
    pub fps: u32,
    /// Settle time after opening the device, before the first usable frame
    pub warmup_ms: u64,
}

/// Motion detection and segment policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSettings {
    /// Seconds of lookback flushed at the start of each segment (pre-roll)
    pub pre_roll_seconds: u32,
    /// Grace period after the last motion before a segment closes (post-roll)
    pub post_roll_ms: u64,
    /// Minimum per-pixel grayscale delta counted as a change
    pub delta_threshold: u8,
    /// Minimum number of changed pixels for a positive motion verdict
    pub min_changed_pixels: u32,
}

/// External encoder process configuration
///
/// The defaults target software encoding. On a Raspberry Pi 4, set
/// `codec = "h264_v4l2m2m"` and `bitrate = "2M"` to use the hardware encoder
/// (rate control switches from preset/crf to a fixed bitrate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Encoder executable, resolved via PATH
    pub program: String,
    /// Output video codec passed as `-c:v`
    pub codec: String,
    /// Software-encoder preset (ignored when `bitrate` is set)
    pub preset: String,
    /// Software-encoder constant rate factor (ignored when `bitrate` is set)
    pub crf: u32,
    /// Fixed output bitrate, e.g. "2M"; switches rate control away from crf
    pub bitrate: Option<String>,
}

/// Output storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory segment files are written into (created on startup)
    pub output_directory: String,
}

impl Default for SentryCamConfig {
    fn default() -> Self {
        Self {
            capture: CaptureSettings {
                device_index: 0,
                width: 1280,
                height: 720,
                fps: 30,
                warmup_ms: 3000,
            },
            motion: MotionSettings {
                pre_roll_seconds: 3,
                post_roll_ms: 3000,
                delta_threshold: 25,
                min_changed_pixels: 500,
            },
            encoder: EncoderSettings {
                program: "ffmpeg".to_string(),
                codec: "libx264".to_string(),
                preset: "veryfast".to_string(),
                crf: 23,
                bitrate: None,
            },
            storage: StorageSettings {
                output_directory: "./recordings".to_string(),
            },
        }
    }
}

impl SentryCamConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecorderError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            RecorderError::Initialization(format!("Failed to read config file: {}", e))
        })?;

        let config: SentryCamConfig = toml::from_str(&contents).map_err(|e| {
            RecorderError::Initialization(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), RecorderError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RecorderError::Initialization(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            RecorderError::Initialization(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            RecorderError::Initialization(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("sentrycam.toml")
    }

    /// Load from default location or create with defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Number of lookback frames kept for pre-roll
    pub fn pre_roll_frames(&self) -> usize {
        (self.capture.fps as usize) * (self.motion.pre_roll_seconds as usize)
    }

    /// Post-roll grace period
    pub fn post_roll(&self) -> Duration {
        Duration::from_millis(self.motion.post_roll_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err("Invalid capture resolution".to_string());
        }
        // yuv420p output subsamples chroma in 2x2 blocks
        if self.capture.width % 2 != 0 || self.capture.height % 2 != 0 {
            return Err("Capture dimensions must be even".to_string());
        }
        if self.capture.fps == 0 || self.capture.fps > 240 {
            return Err("Invalid FPS (must be 1-240)".to_string());
        }

        if self.pre_roll_frames() > 100_000 {
            return Err("Pre-roll buffer too large (fps * pre_roll_seconds)".to_string());
        }

        if self.encoder.program.is_empty() {
            return Err("Encoder program must not be empty".to_string());
        }
        if self.encoder.codec.is_empty() {
            return Err("Encoder codec must not be empty".to_string());
        }
        if self.encoder.crf > 51 {
            return Err("CRF must be between 0 and 51".to_string());
        }

        if self.storage.output_directory.is_empty() {
            return Err("Output directory must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SentryCamConfig::default();
        assert_eq!(config.capture.width, 1280);
        assert_eq!(config.capture.fps, 30);
        assert_eq!(config.motion.pre_roll_seconds, 3);
        assert_eq!(config.pre_roll_frames(), 90);
        assert_eq!(config.post_roll(), Duration::from_millis(3000));
    }

    #[test]
    fn test_config_validation() {
        let config = SentryCamConfig::default();
        assert!(config.validate().is_ok());

        let mut bad_config = config.clone();
        bad_config.capture.width = 0;
        assert!(bad_config.validate().is_err());

        let mut odd_config = SentryCamConfig::default();
        odd_config.capture.height = 721;
        assert!(odd_config.validate().is_err());

        let mut bad_crf = SentryCamConfig::default();
        bad_crf.encoder.crf = 99;
        assert!(bad_crf.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("sentrycam.toml");

        let mut config = SentryCamConfig::default();
        config.motion.post_roll_ms = 1000;
        assert!(config.save_to_file(&config_path).is_ok());

        let loaded = SentryCamConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.motion.post_roll_ms, 1000);
        assert_eq!(loaded.capture.fps, config.capture.fps);
    }

    #[test]
    fn test_config_toml_format() {
        let config = SentryCamConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[capture]"));
        assert!(toml_string.contains("[motion]"));
        assert!(toml_string.contains("[encoder]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("pre_roll_seconds"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SentryCamConfig::load_from_file("nonexistent_file.toml");
        assert!(result.is_ok()); // Should return default
        assert_eq!(result.unwrap().capture.fps, 30);
    }
}
