//! Disposal-aware frame compositing
//!
//! Animated sources store each frame as a rectangle drawn over whatever the
//! previous frame left behind. This module replays that state machine and
//! emits one full-canvas [`CompositedFrame`] per source frame.

use crate::frames::{CompositedFrame, DisposalMethod, RawSubFrame};
use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use log::{debug, warn};

/// Working state for one compositing pass.
///
/// The live canvas is owned here and only ever copied out, so emitted frames
/// never alias it.
#[derive(Debug)]
pub struct Compositor {
    canvas: RgbaImage,
    /// Set once the first sub-frame has been drawn
    drawn: bool,
}

impl Compositor {
    /// Start from a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self { canvas: RgbaImage::new(width, height), drawn: false }
    }

    /// The canvas the next frame will be drawn onto.
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Draw one sub-frame, emit the visible result, then apply its disposal.
    ///
    /// The first sub-frame has no previous state, so `RestorePrevious` on it
    /// leaves the canvas as drawn.
    pub fn push(&mut self, sub_frame: &RawSubFrame) -> CompositedFrame {
        let info = &sub_frame.info;

        let snapshot = match info.disposal {
            DisposalMethod::RestorePrevious if self.drawn => Some(self.canvas.clone()),
            _ => None,
        };

        self.draw(sub_frame);
        self.drawn = true;
        let emitted = CompositedFrame::new(self.canvas.clone(), sub_frame.delay_ms());

        match info.disposal {
            DisposalMethod::None | DisposalMethod::DoNotDispose => {}
            DisposalMethod::RestoreBackground => {
                self.clear_rect(info.x, info.y, info.width, info.height);
            }
            DisposalMethod::RestorePrevious => {
                if let Some(previous) = snapshot {
                    self.canvas = previous;
                }
            }
        }

        emitted
    }

    /// Copy the sub-frame's pixels over the canvas, clipped to its bounds.
    fn draw(&mut self, sub_frame: &RawSubFrame) {
        let info = &sub_frame.info;
        debug_assert_eq!(
            sub_frame.pixels.len() as u64,
            info.width as u64 * info.height as u64 * 4,
            "sub-frame {}x{} pixel bytes",
            info.width,
            info.height
        );
        let Some(patch) =
            ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(info.width, info.height, &sub_frame.pixels[..])
        else {
            warn!(
                "sub-frame {}x{} has {} pixel bytes, skipping draw",
                info.width,
                info.height,
                sub_frame.pixels.len()
            );
            return;
        };

        if info.x.saturating_add(info.width) > self.canvas.width()
            || info.y.saturating_add(info.height) > self.canvas.height()
        {
            warn!(
                "sub-frame at ({}, {}) {}x{} extends past {}x{} canvas, clipping",
                info.x,
                info.y,
                info.width,
                info.height,
                self.canvas.width(),
                self.canvas.height()
            );
        }

        // `replace` overwrites without blending and clips to the canvas
        imageops::replace(&mut self.canvas, &patch, info.x as i64, info.y as i64);
    }

    fn clear_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let x_end = x.saturating_add(width).min(self.canvas.width());
        let y_end = y.saturating_add(height).min(self.canvas.height());
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                self.canvas.put_pixel(px, py, Rgba([0, 0, 0, 0]));
            }
        }
    }
}

/// Composite a sequence of sub-frames onto a `width` x `height` canvas.
///
/// Returns exactly one frame per input, each the size of the canvas.
///
/// Each sub-frame must carry exactly `width * height * 4` RGBA bytes for its
/// rectangle, as [`FrameSource`](crate::decode::FrameSource) guarantees. A
/// sub-frame that does not is skipped with a warning (and asserts in debug
/// builds).
pub fn composite(sub_frames: &[RawSubFrame], width: u32, height: u32) -> Vec<CompositedFrame> {
    let mut compositor = Compositor::new(width, height);
    let frames: Vec<CompositedFrame> = sub_frames.iter().map(|sf| compositor.push(sf)).collect();
    debug!("composited {} frames at {}x{}", frames.len(), width, height);
    frames
}
