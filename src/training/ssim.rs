//! Structural similarity metric
//!
//! Stateless comparator between two images based on local statistics. A box
//! filter (all-ones kernel, stride 1, padding window/2) computes local means,
//! variances and covariance; the stabilized SSIM ratio combines them per
//! spatial location. `structural_distance` returns `1 - mean(ssim_map)`:
//! zero for locally identical images, positive otherwise.

use tch::{Kind, Tensor};

/// Default local averaging window (pixels per side)
pub const DEFAULT_SSIM_WINDOW: i64 = 11;

/// Stabilization constant C1 = (0.01)^2 against a unit dynamic range
const C1: f64 = 0.0001;
/// Stabilization constant C2 = (0.03)^2 against a unit dynamic range
const C2: f64 = 0.0009;

/// Local mean via a depthwise box filter, output same size as input
fn box_filter(x: &Tensor, window: i64) -> Tensor {
    let channels = x.size()[1];
    let weight = Tensor::ones([channels, 1, window, window], (Kind::Float, x.device()))
        / ((window * window) as f64);
    let pad = window / 2;

    x.conv2d(&weight, None::<Tensor>, [1, 1], [pad, pad], [1, 1], channels)
}

/// Per-location SSIM map between two images
///
/// Both tensors must share the full (batch, channels, H, W) shape. The map
/// has the same shape, with values in (-1, 1].
pub fn ssim_map(img1: &Tensor, img2: &Tensor, window: i64) -> Tensor {
    let mu1 = box_filter(img1, window);
    let mu2 = box_filter(img2, window);

    let mu1_sq = &mu1 * &mu1;
    let mu2_sq = &mu2 * &mu2;
    let mu1_mu2 = &mu1 * &mu2;

    let sigma1_sq = box_filter(&(img1 * img1), window) - &mu1_sq;
    let sigma2_sq = box_filter(&(img2 * img2), window) - &mu2_sq;
    let sigma12 = box_filter(&(img1 * img2), window) - &mu1_mu2;

    let numerator = (&mu1_mu2 * 2.0 + C1) * (&sigma12 * 2.0 + C2);
    let denominator = (mu1_sq + mu2_sq + C1) * (sigma1_sq + sigma2_sq + C2);

    numerator / denominator
}

/// Structural distance between two images
///
/// Returns `1 - mean(ssim_map)` as a scalar tensor: 0 when the images are
/// locally identical, positive otherwise. Never negative for inputs within
/// the normalized range.
pub fn structural_distance(img1: &Tensor, img2: &Tensor, window: i64) -> Tensor {
    1.0 - ssim_map(img1, img2, window).mean(Kind::Float)
}
