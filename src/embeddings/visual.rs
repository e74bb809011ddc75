//! Local image descriptors for guide illustrations
//!
//! Images referenced by the troubleshooting guides are embedded without a
//! hosted model: a 16x16 grayscale thumbnail concatenated with a per-channel
//! colour histogram, scaled to unit length. Two renderings of the same
//! diagram land close together under cosine similarity, which is all the
//! knowledge index needs to link and de-duplicate images.

use crate::embeddings::normalize_in_place;
use crate::error::{AuraError, Result};

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Side length of the grayscale thumbnail
pub const THUMBNAIL_SIDE: u32 = 16;

/// Histogram bins per RGB channel
pub const HISTOGRAM_BINS: usize = 8;

/// Length of every image embedding
pub const IMAGE_EMBEDDING_DIM: usize =
    (THUMBNAIL_SIDE * THUMBNAIL_SIDE) as usize + 3 * HISTOGRAM_BINS;

/// Image embedder with a per-run cache keyed by canonical path
#[derive(Debug, Default)]
pub struct ImageEmbedder {
    cache: HashMap<PathBuf, Vec<f32>>,
}

impl ImageEmbedder {
    /// Create an embedder with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed the image at `path`, reusing a cached vector when the same
    /// file was embedded before
    ///
    /// # Errors
    ///
    /// Returns `AuraError::Knowledge` if the file is missing or cannot be
    /// decoded
    pub fn embed_path(&mut self, path: &Path) -> Result<Vec<f32>> {
        let canonical = path
            .canonicalize()
            .map_err(|e| AuraError::Knowledge(format!("Image not found {}: {}", path.display(), e)))?;

        if let Some(vector) = self.cache.get(&canonical) {
            return Ok(vector.clone());
        }

        let img = image::open(&canonical).map_err(|e| {
            AuraError::Knowledge(format!("Failed to decode image {}: {}", path.display(), e))
        })?;
        let (width, height) = img.dimensions();
        tracing::debug!("Embedding image {} ({}x{})", canonical.display(), width, height);

        let vector = describe(&img);
        self.cache.insert(canonical, vector.clone());
        Ok(vector)
    }

    /// Number of distinct images embedded so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Compute the descriptor of a decoded image
pub fn describe(img: &DynamicImage) -> Vec<f32> {
    let mut vector = Vec::with_capacity(IMAGE_EMBEDDING_DIM);

    let thumb = img
        .resize_exact(THUMBNAIL_SIDE, THUMBNAIL_SIDE, FilterType::Triangle)
        .to_luma8();
    vector.extend(thumb.pixels().map(|p| p.0[0] as f32 / 255.0));

    let rgb = img.to_rgb8();
    let mut histogram = [0f32; 3 * HISTOGRAM_BINS];
    for pixel in rgb.pixels() {
        for (channel, value) in pixel.0.iter().enumerate() {
            let bin = (*value as usize * HISTOGRAM_BINS) / 256;
            histogram[channel * HISTOGRAM_BINS + bin] += 1.0;
        }
    }
    let total = (rgb.width() as f32 * rgb.height() as f32).max(1.0);
    vector.extend(histogram.iter().map(|count| count / total));

    normalize_in_place(&mut vector);
    vector
}
