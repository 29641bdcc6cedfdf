//! GIF animation export
//!
//! Frames are quantized to one global palette, mapped to indices, and handed
//! to an [`AnimationSink`] that owns the actual bitstream.

use super::{check_counts, checked_dimensions, ExportError};
use crate::frames::{CompositedFrame, DisposalMethod};
use crate::indexed::{encode_indexed, IndexedFrame};
use crate::palette::{build_palette, Palette};
use log::debug;
use std::borrow::Cow;

/// Per-frame settings passed to an [`AnimationSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    pub delay_centiseconds: u16,
    pub disposal: DisposalMethod,
    pub transparent: Option<u8>,
}

/// GIF-wide export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifOptions {
    /// Number of loops; 0 loops forever
    pub loop_count: u16,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self { loop_count: 0 }
    }
}

/// Receives indexed frames and produces the finished bitstream.
pub trait AnimationSink {
    fn add_frame(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        indices: &[u8],
        options: &FrameOptions,
    ) -> Result<(), ExportError>;

    /// Finalize the stream and return the complete bytes.
    fn end(self) -> Result<Vec<u8>, ExportError>
    where
        Self: Sized;
}

/// [`AnimationSink`] backed by the `gif` crate's LZW encoder.
pub struct GifSink {
    encoder: ::gif::Encoder<Vec<u8>>,
}

impl GifSink {
    /// Write the header, global palette and loop extension.
    pub fn new(width: u16, height: u16, palette: &Palette, options: &GifOptions) -> Result<Self, ExportError> {
        let mut encoder = ::gif::Encoder::new(Vec::new(), width, height, &palette.to_rgb_bytes())?;
        let repeat = match options.loop_count {
            0 => ::gif::Repeat::Infinite,
            n => ::gif::Repeat::Finite(n),
        };
        encoder.set_repeat(repeat)?;
        Ok(Self { encoder })
    }
}

impl AnimationSink for GifSink {
    fn add_frame(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        indices: &[u8],
        options: &FrameOptions,
    ) -> Result<(), ExportError> {
        let mut frame = ::gif::Frame::default();
        frame.left = x;
        frame.top = y;
        frame.width = width;
        frame.height = height;
        frame.delay = options.delay_centiseconds;
        frame.dispose = gif_disposal(options.disposal);
        frame.transparent = options.transparent;
        frame.buffer = Cow::Borrowed(indices);
        self.encoder.write_frame(&frame)?;
        Ok(())
    }

    fn end(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.encoder.into_inner()?)
    }
}

fn gif_disposal(method: DisposalMethod) -> ::gif::DisposalMethod {
    match method {
        DisposalMethod::None => ::gif::DisposalMethod::Any,
        DisposalMethod::DoNotDispose => ::gif::DisposalMethod::Keep,
        DisposalMethod::RestoreBackground => ::gif::DisposalMethod::Background,
        DisposalMethod::RestorePrevious => ::gif::DisposalMethod::Previous,
    }
}

/// Milliseconds to the nearest centisecond, saturating at `u16::MAX`.
fn delay_centiseconds(delay_ms: u32) -> u16 {
    let cs = (delay_ms as u64 + 5) / 10;
    cs.min(u16::MAX as u64) as u16
}

/// Feed indexed frames into a sink, one full-canvas frame each.
///
/// Every frame is exported with restore-background disposal regardless of
/// how the source frames were disposed.
pub fn write_frames<S: AnimationSink>(
    sink: &mut S,
    frames: &[IndexedFrame],
    delays_ms: &[u32],
) -> Result<(), ExportError> {
    check_counts(frames.len(), delays_ms.len())?;
    let (width, height) = checked_dimensions(frames[0].width, frames[0].height)?;

    for (index, (frame, delay_ms)) in frames.iter().zip(delays_ms).enumerate() {
        if (frame.width, frame.height) != (width as u32, height as u32) {
            return Err(ExportError::FrameSizeMismatch {
                index,
                expected: (width as u32, height as u32),
                actual: (frame.width, frame.height),
            });
        }
        let options = FrameOptions {
            delay_centiseconds: delay_centiseconds(*delay_ms),
            disposal: DisposalMethod::RestoreBackground,
            transparent: frame.transparent_index(),
        };
        sink.add_frame(0, 0, width, height, &frame.indices, &options)?;
    }
    Ok(())
}

/// Encode indexed frames as an animated GIF.
pub fn encode_gif(
    palette: &Palette,
    frames: &[IndexedFrame],
    delays_ms: &[u32],
    options: &GifOptions,
) -> Result<Vec<u8>, ExportError> {
    check_counts(frames.len(), delays_ms.len())?;
    let (width, height) = checked_dimensions(frames[0].width, frames[0].height)?;

    let mut sink = GifSink::new(width, height, palette, options)?;
    write_frames(&mut sink, frames, delays_ms)?;
    let bytes = sink.end()?;

    debug!("encoded GIF: {} frames, {} bytes", frames.len(), bytes.len());
    Ok(bytes)
}

/// Quantize, index and encode full-canvas frames as an animated GIF.
pub fn export_gif(frames: &[CompositedFrame], options: &GifOptions) -> Result<Vec<u8>, ExportError> {
    let palette = build_palette(frames)?;
    let indexed: Vec<IndexedFrame> = frames.iter().map(|f| encode_indexed(f, &palette)).collect();
    let delays: Vec<u32> = frames.iter().map(|f| f.delay_ms).collect();
    encode_gif(&palette, &indexed, &delays, options)
}
