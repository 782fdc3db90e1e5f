//! Training module for the steganographic GAN
//!
//! This module provides:
//! - Training loop implementation
//! - Loss composition (reconstruction and discrimination objectives)
//! - Structural similarity metric
//! - Training configuration and metrics

mod losses;
mod metrics;
mod ssim;
mod trainer;

pub use losses::{LossComposer, LossWeights, ReconstructionLoss};
pub use metrics::{EpochRecord, TrainingMetrics};
pub use ssim::{ssim_map, structural_distance, DEFAULT_SSIM_WINDOW};
pub use trainer::{train_step, StepLosses, Trainer, TrainerConfig};
