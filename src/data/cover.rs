//! CoverLoader for batching and iterating over cover images
//!
//! Provides efficient batching for training with support for:
//! - Random shuffling
//! - Drop last incomplete batch
//! - Iteration over batches
//!
//! Images are held in memory as a single (num_images, 3, H, W) float tensor
//! normalized to [-1, 1]. Batches are immutable once handed out.

use anyhow::{ensure, Context, Result};
use rand::seq::SliceRandom;
use tch::{Kind, Tensor};
use tracing::info;

/// Image file extensions accepted by [`CoverLoader::from_dir`]
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// CoverLoader for iterating over batched cover images
pub struct CoverLoader {
    /// Full dataset of shape (num_images, 3, H, W), values in [-1, 1]
    images: Tensor,
    /// Batch size
    batch_size: usize,
    /// Whether to shuffle data each epoch
    shuffle: bool,
    /// Whether to drop the last incomplete batch
    drop_last: bool,
    /// Current indices for iteration
    indices: Vec<usize>,
    /// Current position in iteration
    current_idx: usize,
}

impl CoverLoader {
    /// Create a new CoverLoader from an image tensor
    ///
    /// # Arguments
    ///
    /// * `images` - 4D tensor of shape (num_images, 3, H, W), normalized to [-1, 1]
    /// * `batch_size` - Number of images per batch
    /// * `shuffle` - Whether to shuffle data each epoch
    /// * `drop_last` - Whether to drop the incomplete final batch
    pub fn from_tensor(images: Tensor, batch_size: usize, shuffle: bool, drop_last: bool) -> Result<Self> {
        ensure!(images.dim() == 4, "cover images must be a rank-4 tensor, got rank {}", images.dim());
        ensure!(batch_size > 0, "batch size must be > 0");

        let num_images = images.size()[0] as usize;
        let indices: Vec<usize> = (0..num_images).collect();

        let mut loader = Self {
            images,
            batch_size,
            shuffle,
            drop_last,
            indices,
            current_idx: 0,
        };

        if shuffle {
            loader.shuffle_indices();
        }

        Ok(loader)
    }

    /// Load covers from a directory of image files
    ///
    /// Every image is resized to `image_size` x `image_size` and its pixel
    /// values are mapped from [0, 255] to [-1, 1].
    pub fn from_dir(
        dir: &str,
        image_size: i64,
        batch_size: usize,
        shuffle: bool,
        drop_last: bool,
    ) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read cover directory {}", dir))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        ensure!(!paths.is_empty(), "no image files found in {}", dir);

        let mut images = Vec::with_capacity(paths.len());
        for path in &paths {
            let image = tch::vision::image::load_and_resize(path, image_size, image_size)
                .with_context(|| format!("failed to load image {}", path.display()))?;
            images.push(normalize_pixels(&image));
        }

        info!("Loaded {} cover images from {}", images.len(), dir);

        Self::from_tensor(Tensor::stack(&images, 0), batch_size, shuffle, drop_last)
    }

    /// Get the number of batches per epoch
    pub fn num_batches(&self) -> usize {
        let num_images = self.num_images();
        if self.drop_last {
            num_images / self.batch_size
        } else {
            num_images.div_ceil(self.batch_size)
        }
    }

    /// Get total number of images
    pub fn num_images(&self) -> usize {
        self.images.size()[0] as usize
    }

    /// Get spatial dimensions (H, W)
    pub fn image_size(&self) -> (i64, i64) {
        let size = self.images.size();
        (size[2], size[3])
    }

    /// Shuffle indices for a new epoch
    fn shuffle_indices(&mut self) {
        let mut rng = rand::thread_rng();
        self.indices.shuffle(&mut rng);
    }

    /// Reset for new epoch
    pub fn reset(&mut self) {
        self.current_idx = 0;
        if self.shuffle {
            self.shuffle_indices();
        }
    }

    /// Get next batch
    ///
    /// Returns None when the epoch is complete
    pub fn next_batch(&mut self) -> Option<Tensor> {
        let num_images = self.indices.len();
        let start = self.current_idx;

        if start >= num_images {
            return None;
        }

        let end = (start + self.batch_size).min(num_images);
        let actual_batch_size = end - start;

        // Skip incomplete batch if drop_last
        if self.drop_last && actual_batch_size < self.batch_size {
            return None;
        }

        let batch_indices: Vec<i64> = self.indices[start..end].iter().map(|&i| i as i64).collect();
        let index = Tensor::from_slice(&batch_indices);
        let batch = self.images.index_select(0, &index);

        self.current_idx = end;
        Some(batch)
    }

    /// Iterate over all batches for one epoch
    pub fn iter(&mut self) -> CoverLoaderIter<'_> {
        self.reset();
        CoverLoaderIter { loader: self }
    }
}

/// Iterator adapter for CoverLoader
pub struct CoverLoaderIter<'a> {
    loader: &'a mut CoverLoader,
}

impl<'a> Iterator for CoverLoaderIter<'a> {
    type Item = Tensor;

    fn next(&mut self) -> Option<Self::Item> {
        self.loader.next_batch()
    }
}

/// Map u8 pixel values in [0, 255] to floats in [-1, 1]
fn normalize_pixels(image: &Tensor) -> Tensor {
    image.to_kind(Kind::Float) / 127.5 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    fn dummy_images(n: i64) -> Tensor {
        Tensor::zeros([n, 3, 8, 8], (Kind::Float, Device::Cpu))
    }

    #[test]
    fn test_loader_basic() {
        let mut loader = CoverLoader::from_tensor(dummy_images(10), 3, false, false).unwrap();

        assert_eq!(loader.num_batches(), 4); // ceil(10/3) = 4
        assert_eq!(loader.num_images(), 10);

        let mut batch_count = 0;
        while let Some(batch) = loader.next_batch() {
            batch_count += 1;
            if batch_count < 4 {
                assert_eq!(batch.size()[0], 3);
            } else {
                assert_eq!(batch.size()[0], 1); // Last batch has 1 image
            }
        }
        assert_eq!(batch_count, 4);
    }

    #[test]
    fn test_loader_drop_last() {
        let mut loader = CoverLoader::from_tensor(dummy_images(10), 3, false, true).unwrap();

        assert_eq!(loader.num_batches(), 3); // floor(10/3) = 3

        let mut batch_count = 0;
        while let Some(batch) = loader.next_batch() {
            batch_count += 1;
            assert_eq!(batch.size()[0], 3);
        }
        assert_eq!(batch_count, 3);
    }

    #[test]
    fn test_loader_iter() {
        let mut loader = CoverLoader::from_tensor(dummy_images(10), 5, false, true).unwrap();

        let batches: Vec<_> = loader.iter().collect();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_loader_rejects_bad_rank() {
        let images = Tensor::zeros([10, 8, 8], (Kind::Float, Device::Cpu));
        assert!(CoverLoader::from_tensor(images, 2, false, false).is_err());
    }

    #[test]
    fn test_normalize_pixels_range() {
        let pixels = Tensor::from_slice(&[0u8, 128, 255]);
        let normalized = normalize_pixels(&pixels);

        let min_val: f64 = normalized.min().double_value(&[]);
        let max_val: f64 = normalized.max().double_value(&[]);
        assert!(min_val >= -1.0 && max_val <= 1.0);
    }
}
