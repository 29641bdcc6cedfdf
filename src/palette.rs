//! Global palette construction by 15-bit bucket popularity
//!
//! Every exported frame shares one 256-slot palette. Slots 0-254 hold the most
//! frequently seen colours; slot 255 is reserved for transparency.

use crate::frames::CompositedFrame;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

/// Number of palette slots.
pub const PALETTE_SIZE: usize = 256;

/// Slots available for content colours.
pub const CONTENT_SLOTS: usize = 255;

/// Palette slot reserved for transparent pixels.
pub const TRANSPARENT_INDEX: u8 = 255;

/// Pixels with alpha below this resolve to [`TRANSPARENT_INDEX`].
pub const ALPHA_THRESHOLD: u8 = 128;

/// Upper bound on pixels examined while building a palette.
pub const SAMPLE_BUDGET: u64 = 100_000;

/// Error while building a palette.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// No frames were supplied
    #[error("Cannot build a palette from zero frames")]
    NoFrames,
}

/// Exactly 256 RGB entries; entry 255 is the transparency sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 3]; PALETTE_SIZE],
}

impl Palette {
    /// A palette with the given leading colours, padded with black.
    ///
    /// Colours beyond the 255 content slots are ignored.
    pub fn from_colors(colors: &[[u8; 3]]) -> Self {
        let mut palette = [[0u8; 3]; PALETTE_SIZE];
        for (slot, color) in palette.iter_mut().zip(colors.iter().take(CONTENT_SLOTS)) {
            *slot = *color;
        }
        Self { colors: palette }
    }

    pub fn colors(&self) -> &[[u8; 3]; PALETTE_SIZE] {
        &self.colors
    }

    pub fn get(&self, index: u8) -> [u8; 3] {
        self.colors[index as usize]
    }

    /// Flattened `r, g, b, r, g, b, ...` bytes, 768 long.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }

    /// Index of the closest content colour by squared RGB distance.
    ///
    /// Scans slots 0-254 only; exact matches return immediately and ties keep
    /// the lowest index.
    pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (i, color) in self.colors[..CONTENT_SLOTS].iter().enumerate() {
            let dist = distance_sq(*color, rgb);
            if dist == 0 {
                return i as u8;
            }
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best as u8
    }
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Reduce a colour to its 5-bits-per-channel bucket key.
fn bucket_key(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 10) | ((g as u16 >> 3) << 5) | (b as u16 >> 3)
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    representative: [u8; 3],
}

/// Distance between examined pixels for the given workload.
pub fn sample_stride(frame_count: usize, width: u32, height: u32) -> usize {
    let total = frame_count as u64 * width as u64 * height as u64;
    (total / SAMPLE_BUDGET).max(1) as usize
}

/// Build the shared palette for a set of equally sized frames.
///
/// Samples every `sample_stride`-th pixel across all frames (frame order,
/// then raster order), skips pixels with alpha below [`ALPHA_THRESHOLD`],
/// and keeps the first-seen colour of each of the 255 most popular buckets.
pub fn build_palette(frames: &[CompositedFrame]) -> Result<Palette, PaletteError> {
    let first = frames.first().ok_or(PaletteError::NoFrames)?;
    let stride = sample_stride(frames.len(), first.width(), first.height());

    // Buckets in first-seen order so a stable sort breaks ties by discovery
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut lookup: HashMap<u16, usize> = HashMap::new();

    let mut pixels = frames.iter().flat_map(|frame| frame.image.pixels());
    let mut examined = 0usize;
    let mut next = pixels.next();
    while let Some(pixel) = next {
        examined += 1;
        let [r, g, b, a] = pixel.0;
        if a >= ALPHA_THRESHOLD {
            let key = bucket_key(r, g, b);
            match lookup.get(&key) {
                Some(&slot) => buckets[slot].count += 1,
                None => {
                    lookup.insert(key, buckets.len());
                    buckets.push(Bucket { count: 1, representative: [r, g, b] });
                }
            }
        }
        next = pixels.nth(stride - 1);
    }

    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    let colors: Vec<[u8; 3]> =
        buckets.iter().take(CONTENT_SLOTS).map(|bucket| bucket.representative).collect();

    debug!(
        "palette from {} frames: stride {}, {} samples, {} buckets, {} colours kept",
        frames.len(),
        stride,
        examined,
        buckets.len(),
        colors.len()
    );
    Ok(Palette::from_colors(&colors))
}
