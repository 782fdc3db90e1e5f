//! Data module for cover images and payloads
//!
//! This module provides:
//! - CoverLoader for batching and shuffling normalized cover images
//! - PayloadGenerator for drawing a fresh random payload every batch

mod cover;
mod payload;

pub use cover::{CoverLoader, CoverLoaderIter};
pub use payload::PayloadGenerator;
