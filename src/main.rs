//! Binary for training the steganographic GAN
//!
//! Usage:
//!   cargo run -- --covers data/covers --epochs 50

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use stego_gan::{
    data::CoverLoader,
    model::{FeatureExtractor, StegoModel},
    training::{LossComposer, LossWeights, Trainer, TrainerConfig},
    utils::{load_checkpoint, Config},
};

/// Train the steganographic GAN on a directory of cover images
#[derive(Parser)]
#[command(name = "stego_gan")]
#[command(about = "Train an encoder/decoder/adversary to hide payloads in images")]
struct Args {
    /// Directory of cover images
    #[arg(short, long)]
    covers: Option<String>,

    /// Number of training epochs
    #[arg(short, long, default_value = "50")]
    epochs: usize,

    /// Batch size
    #[arg(short, long, default_value = "32")]
    batch_size: usize,

    /// Square size covers are resized to
    #[arg(long, default_value = "64")]
    image_size: i64,

    /// Number of payload channels
    #[arg(long, default_value = "3")]
    payload_channels: i64,

    /// Learning rate for both optimizers
    #[arg(long, default_value = "0.001")]
    lr: f64,

    /// Weight of the perceptual loss term
    #[arg(long, default_value = "0.5")]
    perceptual_weight: f64,

    /// Weight of the structural loss term
    #[arg(long, default_value = "0.5")]
    structural_weight: f64,

    /// Path to the frozen feature extractor weights
    #[arg(long, default_value = "weights/features.pt")]
    feature_weights: String,

    /// Use a randomly initialized (still frozen) feature extractor
    #[arg(long)]
    untrained_features: bool,

    /// Checkpoint directory
    #[arg(long, default_value = "checkpoints")]
    checkpoint_dir: String,

    /// Save checkpoint every N epochs
    #[arg(long, default_value = "10")]
    checkpoint_every: usize,

    /// Resume from checkpoint directory
    #[arg(long)]
    resume: Option<String>,

    /// Use GPU if available
    #[arg(long)]
    gpu: bool,

    /// Optional TOML configuration file (CLI flags are ignored if set)
    #[arg(long)]
    config: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        if let Some(path) = &self.config {
            info!("Loading configuration from {}", path);
            return Config::from_toml(path);
        }

        let mut config = Config::default();
        if let Some(covers) = self.covers {
            config.data.covers_dir = covers;
        }
        config.data.image_size = self.image_size;
        config.data.batch_size = self.batch_size;
        config.model.payload_channels = self.payload_channels;
        config.model.feature_weights = self.feature_weights;
        config.training.epochs = self.epochs;
        config.training.lr = self.lr;
        config.training.perceptual_weight = self.perceptual_weight;
        config.training.structural_weight = self.structural_weight;
        config.training.checkpoint_dir = self.checkpoint_dir;
        config.training.checkpoint_every = self.checkpoint_every;
        config.training.device = if self.gpu { "cuda".to_string() } else { "cpu".to_string() };
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Setup logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let untrained_features = args.untrained_features;
    let resume = args.resume.clone();

    let config = args.into_config()?;
    config.validate()?;

    let device = config.get_device();
    info!("Using device {:?}", device);

    // Load covers
    info!("Loading cover images from {}", config.data.covers_dir);
    let mut covers = CoverLoader::from_dir(
        &config.data.covers_dir,
        config.data.image_size,
        config.data.batch_size,
        config.data.shuffle,
        true,
    )?;
    info!(
        "CoverLoader: {} batches of size {}",
        covers.num_batches(),
        config.data.batch_size
    );

    // The frozen feature extractor is a hard startup dependency: a missing
    // weights file aborts before any epoch runs.
    let features = if untrained_features {
        info!("Using a randomly initialized frozen feature extractor");
        FeatureExtractor::untrained(device)
    } else {
        info!("Loading feature weights from {}", config.model.feature_weights);
        FeatureExtractor::load(&config.model.feature_weights, device)?
    };

    // Create model
    let mut model = StegoModel::with_defaults(config.model.payload_channels, device);
    info!(
        "Created model: cover_channels={}, payload_channels={}",
        model.cover_channels(),
        model.payload_channels()
    );

    // Resume from checkpoint if specified
    if let Some(checkpoint_path) = &resume {
        info!("Resuming from checkpoint: {}", checkpoint_path);
        let (epoch, metrics) = load_checkpoint(&mut model, checkpoint_path)?;
        info!(
            "Resumed from epoch {} (recon_loss: {:.4}, adv_loss: {:.4})",
            epoch,
            metrics.latest_recon_loss().unwrap_or(0.0),
            metrics.latest_adv_loss().unwrap_or(0.0)
        );
    }

    let losses = LossComposer::new(
        features,
        LossWeights {
            perceptual: config.training.perceptual_weight,
            structural: config.training.structural_weight,
        },
    )
    .with_ssim_window(config.training.ssim_window);

    let trainer_config = TrainerConfig {
        epochs: config.training.epochs,
        lr: config.training.lr,
        payload_channels: config.model.payload_channels,
        checkpoint_every: config.training.checkpoint_every,
        checkpoint_dir: config.training.checkpoint_dir.clone(),
    };

    let mut trainer = Trainer::new(trainer_config);

    info!("Starting training for {} epochs", config.training.epochs);
    info!("  Learning rate: {}", config.training.lr);
    info!(
        "  Loss weights: perceptual={}, structural={}",
        config.training.perceptual_weight, config.training.structural_weight
    );

    let metrics = trainer.train(&model, &mut covers, &losses)?;

    info!("Training complete!");
    info!(
        "Final metrics: recon_loss={:.4}, adv_loss={:.4}",
        metrics.latest_recon_loss().unwrap_or(0.0),
        metrics.latest_adv_loss().unwrap_or(0.0)
    );
    info!(
        "Model saved to {}/encoder_decoder_final.pt",
        config.training.checkpoint_dir
    );

    Ok(())
}
