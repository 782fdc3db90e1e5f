//! # Steganographic GAN for Images
//!
//! This crate provides a modular implementation of a steganographic GAN:
//! an Encoder hides a random payload inside a cover image, a Decoder
//! recovers the payload from the encoded image, and an Adversary learns to
//! tell cover images apart from encoded ones.
//!
//! ## Modules
//!
//! - `data`: Cover image loading/batching and payload generation
//! - `model`: Encoder, Decoder, Adversary and the frozen feature extractor
//! - `training`: Training loop, loss composition and the SSIM metric
//! - `utils`: Configuration and checkpoint handling

pub mod data;
pub mod model;
pub mod training;
pub mod utils;

pub use data::{CoverLoader, PayloadGenerator};
pub use model::{Adversary, Decoder, Encoder, FeatureExtractor, StegoModel};
pub use training::{
    structural_distance, LossComposer, LossWeights, Trainer, TrainerConfig, TrainingMetrics,
};
pub use utils::{load_checkpoint, save_checkpoint, Config};
