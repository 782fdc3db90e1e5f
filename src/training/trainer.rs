//! Training loop implementation
//!
//! Runs the per-batch protocol: reconstruction forward/backward and joint
//! encoder/decoder step first, then discrimination forward/backward and
//! adversary step on a detached encoded image. The two optimizers never see
//! each other's parameters.

use anyhow::{ensure, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tch::{nn, Tensor};
use tracing::{info, warn};

use crate::data::{CoverLoader, PayloadGenerator};
use crate::model::StegoModel;
use super::losses::LossComposer;
use super::metrics::{EpochRecord, TrainingMetrics};

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Learning rate for both optimizers
    pub lr: f64,
    /// Number of payload channels
    pub payload_channels: i64,
    /// Save checkpoint every N epochs
    pub checkpoint_every: usize,
    /// Directory to save checkpoints
    pub checkpoint_dir: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            lr: 1e-3,
            payload_channels: 3,
            checkpoint_every: 10,
            checkpoint_dir: "checkpoints".to_string(),
        }
    }
}

/// Losses produced by one protocol iteration
#[derive(Debug, Clone, Copy)]
pub struct StepLosses {
    /// Composite reconstruction loss
    pub reconstruction: f64,
    /// Discrimination loss
    pub discrimination: f64,
    /// Payload MSE term of the reconstruction loss
    pub payload_mse: f64,
    /// Weighted perceptual term
    pub perceptual: f64,
    /// Weighted structural term
    pub structural: f64,
}

/// Running sums of every loss term, reset at epoch start
#[derive(Debug, Default)]
struct EpochSums {
    reconstruction: f64,
    discrimination: f64,
    payload_mse: f64,
    perceptual: f64,
    structural: f64,
    batches: usize,
}

impl EpochSums {
    fn add(&mut self, step: &StepLosses) {
        self.reconstruction += step.reconstruction;
        self.discrimination += step.discrimination;
        self.payload_mse += step.payload_mse;
        self.perceptual += step.perceptual;
        self.structural += step.structural;
        self.batches += 1;
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            sum / self.batches as f64
        }
    }
}

/// Trainer orchestrating the per-batch, per-epoch update protocol
pub struct Trainer {
    config: TrainerConfig,
    metrics: TrainingMetrics,
}

impl Trainer {
    /// Create a new trainer
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            metrics: TrainingMetrics::new(),
        }
    }

    /// Train the model
    ///
    /// # Arguments
    ///
    /// * `model` - Model whose encoder/decoder and adversary are updated
    /// * `covers` - Loader providing normalized cover batches
    /// * `losses` - Loss composer holding the frozen feature extractor
    ///
    /// # Returns
    ///
    /// Training metrics, one record per epoch
    pub fn train(
        &mut self,
        model: &StegoModel,
        covers: &mut CoverLoader,
        losses: &LossComposer,
    ) -> Result<&TrainingMetrics> {
        let mut enc_dec_opt = model.encoder_decoder_optimizer(self.config.lr);
        let mut adv_opt = model.adversary_optimizer(self.config.lr);

        let payloads = PayloadGenerator::new(self.config.payload_channels, model.device);
        let num_batches = covers.num_batches();

        info!(
            "Starting training for {} epochs, {} batches per epoch",
            self.config.epochs, num_batches
        );

        std::fs::create_dir_all(&self.config.checkpoint_dir).ok();

        for epoch in 0..self.config.epochs {
            let mut sums = EpochSums::default();
            let mut last_recon = 0.0;
            let mut last_adv = 0.0;

            let pb = ProgressBar::new(num_batches as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("##-"),
            );

            covers.reset();
            while let Some(batch) = covers.next_batch() {
                let cover = batch.to_device(model.device);

                let step = train_step(model, &cover, &payloads, losses, &mut enc_dec_opt, &mut adv_opt)
                    .with_context(|| format!("epoch {}, batch {}", epoch + 1, sums.batches + 1))?;

                sums.add(&step);
                last_recon = step.reconstruction;
                last_adv = step.discrimination;

                pb.set_message(format!("recon: {:.4}, adv: {:.4}", step.reconstruction, step.discrimination));
                pb.inc(1);
            }

            pb.finish_and_clear();

            self.metrics.record_epoch(EpochRecord {
                recon_loss: last_recon,
                adv_loss: last_adv,
                mean_recon_loss: sums.mean(sums.reconstruction),
                mean_adv_loss: sums.mean(sums.discrimination),
                mean_payload_mse: sums.mean(sums.payload_mse),
                mean_perceptual: sums.mean(sums.perceptual),
                mean_structural: sums.mean(sums.structural),
            });

            // The epoch line reports the final batch's losses; the running
            // sums only feed the metrics record.
            info!(
                "Epoch {}/{}: recon_loss={:.4}, adv_loss={:.4}",
                epoch + 1,
                self.config.epochs,
                last_recon,
                last_adv
            );

            if (epoch + 1) % self.config.checkpoint_every == 0 {
                let enc_dec_path = format!(
                    "{}/encoder_decoder_epoch_{}.pt",
                    self.config.checkpoint_dir,
                    epoch + 1
                );
                let adv_path =
                    format!("{}/adversary_epoch_{}.pt", self.config.checkpoint_dir, epoch + 1);

                if let Err(e) = model.save(&enc_dec_path, &adv_path) {
                    warn!("Failed to save checkpoint: {}", e);
                } else {
                    info!("Saved checkpoint at epoch {}", epoch + 1);
                }
            }
        }

        let enc_dec_path = format!("{}/encoder_decoder_final.pt", self.config.checkpoint_dir);
        let adv_path = format!("{}/adversary_final.pt", self.config.checkpoint_dir);
        if let Err(e) = model.save(&enc_dec_path, &adv_path) {
            warn!("Failed to save final model: {}", e);
        }

        let metrics_path = format!("{}/training_metrics.csv", self.config.checkpoint_dir);
        if let Err(e) = self.metrics.save_csv(&metrics_path) {
            warn!("Failed to save metrics: {}", e);
        }

        Ok(&self.metrics)
    }

    /// Get training metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Get configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }
}

/// Check the cover/payload batch contract before any forward pass
fn validate_batch(cover: &Tensor, payload: &Tensor, cover_channels: i64) -> Result<()> {
    ensure!(
        cover.dim() == 4 && payload.dim() == 4,
        "cover and payload must be rank-4 tensors"
    );

    let c = cover.size();
    let p = payload.size();
    ensure!(
        c[1] == cover_channels,
        "cover has {} channels, model expects {}",
        c[1],
        cover_channels
    );
    ensure!(
        c[0] == p[0] && c[2] == p[2] && c[3] == p[3],
        "cover {:?} and payload {:?} disagree on batch or spatial dimensions",
        c,
        p
    );

    Ok(())
}

/// Single protocol iteration
///
/// Strictly sequential: reconstruction forward, reconstruction backward and
/// joint step, discrimination forward on a detached encoded image,
/// discrimination backward and adversary step. A shape violation or a
/// non-finite loss aborts with an error; continuing would poison both models.
pub fn train_step(
    model: &StegoModel,
    cover: &Tensor,
    payloads: &PayloadGenerator,
    losses: &LossComposer,
    enc_dec_opt: &mut nn::Optimizer,
    adv_opt: &mut nn::Optimizer,
) -> Result<StepLosses> {
    let payload = payloads.generate_like(cover);
    validate_batch(cover, &payload, model.cover_channels())?;

    // ========== Reconstruction objective ==========
    let encoded = model.encode(cover, &payload);
    let recovered = model.decode(&encoded);

    let recon = losses.reconstruction(&recovered, &payload, cover, &encoded);
    let recon_value = recon.total.double_value(&[]);
    ensure!(recon_value.is_finite(), "non-finite reconstruction loss: {}", recon_value);

    enc_dec_opt.zero_grad();
    recon.total.backward();
    enc_dec_opt.step();

    // ========== Discrimination objective ==========
    // The detach severs the gradient link to the encoder: the adversary
    // learns to separate the two populations without training the encoder
    // to fool it.
    let real_map = model.discriminate(cover);
    let fake_map = model.discriminate(&encoded.detach());

    let adv_loss = losses.discrimination(&real_map, &fake_map);
    let adv_value = adv_loss.double_value(&[]);
    ensure!(adv_value.is_finite(), "non-finite discrimination loss: {}", adv_value);

    adv_opt.zero_grad();
    adv_loss.backward();
    adv_opt.step();

    Ok(StepLosses {
        reconstruction: recon_value,
        discrimination: adv_value,
        payload_mse: recon.payload_mse,
        perceptual: recon.perceptual,
        structural: recon.structural,
    })
}
