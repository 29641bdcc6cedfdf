//! Source bitstream decoding
//!
//! The compositor only needs placement, timing and RGBA pixels for each
//! source frame. [`FrameSource`] is that contract; [`GifSource`] fulfils it
//! with the `gif` crate.

use crate::frames::{FrameInfo, RawSubFrame};
use log::debug;
use std::io::Read;
use thiserror::Error;

/// Error while reading a source animation.
///
/// Any of these aborts the whole load; callers never keep a partial frame list.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The bitstream itself is malformed
    #[error("Failed to decode GIF: {0}")]
    Gif(#[from] gif::DecodingError),
    /// A frame index past the end of the source was requested
    #[error("Frame {index} out of range (source has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },
    /// Decoded pixel data does not cover the frame rectangle
    #[error("Frame {index} decoded {actual} bytes, expected {expected}")]
    PixelCount { index: usize, expected: usize, actual: usize },
    /// The source has a zero-sized canvas
    #[error("Source canvas has zero size ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    /// The source contains no frames
    #[error("Source contains no frames")]
    NoFrames,
}

/// Random-access view over a decoded animation.
pub trait FrameSource {
    /// Canvas width in pixels.
    fn width(&self) -> u32;

    /// Canvas height in pixels.
    fn height(&self) -> u32;

    fn frame_count(&self) -> usize;

    /// Placement, timing and disposal for frame `index`.
    fn frame_info(&self, index: usize) -> Result<FrameInfo, DecodeError>;

    /// Decode frame `index` into `out` as RGBA, replacing its contents.
    ///
    /// Transparent source pixels come out with alpha 0.
    fn decode_frame_to_rgba(&self, index: usize, out: &mut Vec<u8>) -> Result<(), DecodeError>;
}

/// A GIF held fully decoded in memory.
#[derive(Debug, Clone)]
pub struct GifSource {
    width: u32,
    height: u32,
    frames: Vec<RawSubFrame>,
}

impl GifSource {
    /// Decode every frame of a GIF bitstream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DecodeError> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(reader)?;

        let width = decoder.width() as u32;
        let height = decoder.height() as u32;
        let mut frames = Vec::new();

        while let Some(frame) = decoder.read_next_frame()? {
            frames.push(RawSubFrame {
                info: FrameInfo {
                    x: frame.left as u32,
                    y: frame.top as u32,
                    width: frame.width as u32,
                    height: frame.height as u32,
                    delay_centiseconds: frame.delay,
                    disposal: frame.dispose.into(),
                    transparent_index: frame.transparent,
                },
                pixels: frame.buffer.to_vec(),
            });
        }

        debug!("decoded GIF {}x{} with {} frames", width, height, frames.len());
        Ok(Self { width, height, frames })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_reader(bytes)
    }

    fn frame(&self, index: usize) -> Result<&RawSubFrame, DecodeError> {
        self.frames
            .get(index)
            .ok_or(DecodeError::FrameOutOfRange { index, count: self.frames.len() })
    }
}

impl FrameSource for GifSource {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_info(&self, index: usize) -> Result<FrameInfo, DecodeError> {
        Ok(self.frame(index)?.info)
    }

    fn decode_frame_to_rgba(&self, index: usize, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        let frame = self.frame(index)?;
        out.clear();
        out.extend_from_slice(&frame.pixels);
        Ok(())
    }
}

/// Pull every frame out of a source, validating pixel coverage.
///
/// Fails on the first bad frame; nothing partial is returned.
pub fn read_sub_frames<S: FrameSource + ?Sized>(source: &S) -> Result<Vec<RawSubFrame>, DecodeError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(DecodeError::EmptyCanvas { width: source.width(), height: source.height() });
    }
    let count = source.frame_count();
    if count == 0 {
        return Err(DecodeError::NoFrames);
    }

    let mut sub_frames = Vec::with_capacity(count);
    for index in 0..count {
        let info = source.frame_info(index)?;
        let mut pixels = Vec::new();
        source.decode_frame_to_rgba(index, &mut pixels)?;

        let expected = info.width as usize * info.height as usize * 4;
        if pixels.len() != expected {
            return Err(DecodeError::PixelCount { index, expected, actual: pixels.len() });
        }
        sub_frames.push(RawSubFrame { info, pixels });
    }
    Ok(sub_frames)
}
