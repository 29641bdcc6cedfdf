//! Mapping true-colour frames onto a shared palette

use crate::frames::CompositedFrame;
use crate::palette::{Palette, ALPHA_THRESHOLD, TRANSPARENT_INDEX};

/// One frame expressed as palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    /// One index per pixel, raster order
    pub indices: Vec<u8>,
    pub has_transparency: bool,
}

impl IndexedFrame {
    /// The sentinel index if any pixel in this frame is transparent.
    pub fn transparent_index(&self) -> Option<u8> {
        self.has_transparency.then_some(TRANSPARENT_INDEX)
    }
}

/// Map every pixel of `frame` to its palette index.
///
/// Pixels with alpha below 128 map to the sentinel; all others take the
/// nearest content colour.
pub fn encode_indexed(frame: &CompositedFrame, palette: &Palette) -> IndexedFrame {
    let mut has_transparency = false;
    let indices = frame
        .image
        .pixels()
        .map(|pixel| {
            let [r, g, b, a] = pixel.0;
            if a < ALPHA_THRESHOLD {
                has_transparency = true;
                TRANSPARENT_INDEX
            } else {
                palette.nearest([r, g, b])
            }
        })
        .collect();

    IndexedFrame { width: frame.width(), height: frame.height(), indices, has_transparency }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn frame(pixels: &[[u8; 4]]) -> CompositedFrame {
        let mut image = RgbaImage::new(pixels.len() as u32, 1);
        for (x, p) in pixels.iter().enumerate() {
            image.put_pixel(x as u32, 0, Rgba(*p));
        }
        CompositedFrame::new(image, 100)
    }

    #[test]
    fn test_opaque_pixels_map_to_nearest() {
        let palette = Palette::from_colors(&[[255, 0, 0], [0, 0, 255]]);
        let indexed = encode_indexed(&frame(&[[250, 5, 0, 255], [0, 0, 255, 128]]), &palette);
        assert_eq!(indexed.indices, vec![0, 1]);
        assert!(!indexed.has_transparency);
        assert_eq!(indexed.transparent_index(), None);
    }

    #[test]
    fn test_transparent_pixels_use_sentinel() {
        let palette = Palette::from_colors(&[[255, 0, 0]]);
        let indexed = encode_indexed(&frame(&[[255, 0, 0, 127], [255, 0, 0, 255]]), &palette);
        assert_eq!(indexed.indices, vec![TRANSPARENT_INDEX, 0]);
        assert!(indexed.has_transparency);
        assert_eq!(indexed.transparent_index(), Some(255));
    }

    #[test]
    fn test_dimensions_match_frame() {
        let palette = Palette::from_colors(&[]);
        let source = CompositedFrame::blank(3, 2, 100);
        let indexed = encode_indexed(&source, &palette);
        assert_eq!((indexed.width, indexed.height), (3, 2));
        assert_eq!(indexed.indices.len(), 6);
    }
}
