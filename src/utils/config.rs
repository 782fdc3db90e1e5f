//! Configuration management
//!
//! Provides unified configuration for the entire training pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data configuration
    pub data: DataConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Training configuration
    pub training: TrainingConfigFile,
}

/// Data-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory of cover images
    pub covers_dir: String,
    /// Square size covers are resized to
    pub image_size: i64,
    /// Batch size
    pub batch_size: usize,
    /// Whether to reshuffle covers each epoch
    pub shuffle: bool,
}

/// Model-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of payload channels
    pub payload_channels: i64,
    /// Base filters for encoder and decoder
    pub base_filters: i64,
    /// Base filters for the adversary
    pub adv_base_filters: i64,
    /// Path to the frozen feature extractor weights
    pub feature_weights: String,
}

/// Training-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfigFile {
    /// Number of epochs
    pub epochs: usize,
    /// Learning rate for both optimizers
    pub lr: f64,
    /// Weight of the perceptual loss term
    pub perceptual_weight: f64,
    /// Weight of the structural loss term
    pub structural_weight: f64,
    /// SSIM window size in pixels
    pub ssim_window: i64,
    /// Checkpoint save frequency
    pub checkpoint_every: usize,
    /// Checkpoint directory
    pub checkpoint_dir: String,
    /// Device: "cpu" or "cuda"
    pub device: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                covers_dir: "data/covers".to_string(),
                image_size: 64,
                batch_size: 32,
                shuffle: true,
            },
            model: ModelConfig {
                payload_channels: 3,
                base_filters: 32,
                adv_base_filters: 16,
                feature_weights: "weights/features.pt".to_string(),
            },
            training: TrainingConfigFile {
                epochs: 50,
                lr: 1e-3,
                perceptual_weight: 0.5,
                structural_weight: 0.5,
                ssim_window: 11,
                checkpoint_every: 10,
                checkpoint_dir: "checkpoints".to_string(),
                device: "cpu".to_string(),
            },
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml(&self, path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get device from configuration
    pub fn get_device(&self) -> tch::Device {
        match self.training.device.to_lowercase().as_str() {
            "cuda" | "gpu" => {
                if tch::Cuda::is_available() {
                    tch::Device::Cuda(0)
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                    tch::Device::Cpu
                }
            }
            _ => tch::Device::Cpu,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.data.image_size <= 0 {
            anyhow::bail!("Image size must be > 0");
        }
        if self.data.batch_size == 0 {
            anyhow::bail!("Batch size must be > 0");
        }
        if self.model.payload_channels <= 0 {
            anyhow::bail!("Payload channels must be > 0");
        }
        if self.training.epochs == 0 {
            anyhow::bail!("Number of epochs must be > 0");
        }
        if self.training.ssim_window <= 0 || self.training.ssim_window % 2 == 0 {
            anyhow::bail!("SSIM window must be a positive odd number");
        }
        Ok(())
    }
}

/// Create default configuration file if it doesn't exist
pub fn ensure_config_exists(path: &str) -> anyhow::Result<Config> {
    if Path::new(path).exists() {
        if path.ends_with(".toml") {
            Config::from_toml(path)
        } else {
            Config::from_json(path)
        }
    } else {
        let config = Config::default();
        if path.ends_with(".toml") {
            config.save_toml(path)?;
        } else {
            config.save_json(path)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.data.batch_size, 32);
        assert_eq!(config.training.epochs, 50);
        assert_eq!(config.training.lr, 1e-3);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let loaded: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.data.covers_dir, loaded.data.covers_dir);
        assert_eq!(config.model.payload_channels, loaded.model.payload_channels);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let config = Config::default();
        config.save_toml(path).unwrap();
        let loaded = Config::from_toml(path).unwrap();

        assert_eq!(config.training.checkpoint_dir, loaded.training.checkpoint_dir);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.data.batch_size = 0;
        assert!(config.validate().is_err());

        config.data.batch_size = 32;
        config.training.ssim_window = 10;
        assert!(config.validate().is_err());
    }
}
