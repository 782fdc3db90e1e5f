//! Training metrics for monitoring progress
//!
//! One record is kept per epoch: the final batch's reconstruction and
//! discrimination losses (what the epoch log reports) plus the epoch means
//! of each reconstruction term, computed from the running sums.

use serde::{Deserialize, Serialize};

/// Per-epoch metric record
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Reconstruction loss of the epoch's final batch
    pub recon_loss: f64,
    /// Discrimination loss of the epoch's final batch
    pub adv_loss: f64,
    /// Epoch mean of the reconstruction loss
    pub mean_recon_loss: f64,
    /// Epoch mean of the discrimination loss
    pub mean_adv_loss: f64,
    /// Epoch mean of the payload MSE term
    pub mean_payload_mse: f64,
    /// Epoch mean of the weighted perceptual term
    pub mean_perceptual: f64,
    /// Epoch mean of the weighted structural term
    pub mean_structural: f64,
}

/// Metrics collected during training
#[derive(Debug, Clone, Default)]
pub struct TrainingMetrics {
    /// One record per completed epoch
    pub epochs: Vec<EpochRecord>,
}

impl TrainingMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record epoch metrics
    pub fn record_epoch(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }

    /// Get number of recorded epochs
    pub fn num_epochs(&self) -> usize {
        self.epochs.len()
    }

    /// Get latest reconstruction loss
    pub fn latest_recon_loss(&self) -> Option<f64> {
        self.epochs.last().map(|r| r.recon_loss)
    }

    /// Get latest discrimination loss
    pub fn latest_adv_loss(&self) -> Option<f64> {
        self.epochs.last().map(|r| r.adv_loss)
    }

    /// Save metrics to CSV file
    pub fn save_csv(&self, path: &str) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record([
            "epoch",
            "recon_loss",
            "adv_loss",
            "mean_recon_loss",
            "mean_adv_loss",
            "mean_payload_mse",
            "mean_perceptual",
            "mean_structural",
        ])?;

        for (i, record) in self.epochs.iter().enumerate() {
            writer.write_record([
                (i + 1).to_string(),
                record.recon_loss.to_string(),
                record.adv_loss.to_string(),
                record.mean_recon_loss.to_string(),
                record.mean_adv_loss.to_string(),
                record.mean_payload_mse.to_string(),
                record.mean_perceptual.to_string(),
                record.mean_structural.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Load metrics from CSV file
    pub fn load_csv(path: &str) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut metrics = Self::new();

        for result in reader.records() {
            let record = result?;
            metrics.epochs.push(EpochRecord {
                recon_loss: record[1].parse()?,
                adv_loss: record[2].parse()?,
                mean_recon_loss: record[3].parse()?,
                mean_adv_loss: record[4].parse()?,
                mean_payload_mse: record[5].parse()?,
                mean_perceptual: record[6].parse()?,
                mean_structural: record[7].parse()?,
            });
        }

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(recon: f64, adv: f64) -> EpochRecord {
        EpochRecord {
            recon_loss: recon,
            adv_loss: adv,
            mean_recon_loss: recon,
            mean_adv_loss: adv,
            mean_payload_mse: recon * 0.5,
            mean_perceptual: recon * 0.25,
            mean_structural: recon * 0.25,
        }
    }

    #[test]
    fn test_training_metrics() {
        let mut metrics = TrainingMetrics::new();

        metrics.record_epoch(record(1.5, 0.8));
        metrics.record_epoch(record(1.3, 0.75));

        assert_eq!(metrics.num_epochs(), 2);
        assert_eq!(metrics.latest_recon_loss(), Some(1.3));
        assert_eq!(metrics.latest_adv_loss(), Some(0.75));
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let path = path.to_str().unwrap();

        let mut metrics = TrainingMetrics::new();
        metrics.record_epoch(record(1.5, 0.8));
        metrics.record_epoch(record(1.2, 0.7));
        metrics.save_csv(path).unwrap();

        let loaded = TrainingMetrics::load_csv(path).unwrap();
        assert_eq!(loaded.num_epochs(), 2);
        assert_eq!(loaded.latest_recon_loss(), Some(1.2));
    }
}
