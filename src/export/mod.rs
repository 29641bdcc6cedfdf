//! Export formats for edited animations.
//!
//! - **GIF** ([`gif`]): quantized to one shared 256-colour palette
//! - **Aseprite** ([`aseprite`]): full 32-bit RGBA cels in a chunked archive
//!
//! Both encoders validate their inputs before writing a single byte and never
//! hand back a partially written buffer.

pub mod aseprite;
pub mod gif;

pub use self::aseprite::{encode_aseprite, export_aseprite, AsepriteOptions};
pub use self::gif::{encode_gif, export_gif, AnimationSink, FrameOptions, GifOptions, GifSink};

use crate::compress::CompressError;
use crate::palette::PaletteError;
use crate::tags::TagError;
use thiserror::Error;

/// Error raised while exporting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// Nothing to encode
    #[error("Cannot export an animation with zero frames")]
    NoFrames,
    /// One delay per frame is required
    #[error("Got {delays} delays for {frames} frames")]
    DelayCountMismatch { frames: usize, delays: usize },
    /// Every frame must match the document size
    #[error("Frame {index} is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}", actual_w = actual.0, actual_h = actual.1, expected_w = expected.0, expected_h = expected.1)]
    FrameSizeMismatch { index: usize, expected: (u32, u32), actual: (u32, u32) },
    /// Both containers store dimensions as 16-bit words
    #[error("Canvas {width}x{height} is too large (maximum 65535x65535)")]
    TooLarge { width: u32, height: u32 },
    /// Too many frames for a 16-bit frame count
    #[error("{0} frames exceed the container limit of 65535")]
    TooManyFrames(usize),
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Compress(#[from] CompressError),
    #[error("GIF encoding failed: {0}")]
    Gif(#[from] ::gif::EncodingError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert a canvas size into the 16-bit words both containers use.
pub(crate) fn checked_dimensions(width: u32, height: u32) -> Result<(u16, u16), ExportError> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(ExportError::TooLarge { width, height }),
    }
}

/// Check the frame/delay counts shared by both encoders.
pub(crate) fn check_counts(frames: usize, delays: usize) -> Result<u16, ExportError> {
    if frames == 0 {
        return Err(ExportError::NoFrames);
    }
    if frames != delays {
        return Err(ExportError::DelayCountMismatch { frames, delays });
    }
    u16::try_from(frames).map_err(|_| ExportError::TooManyFrames(frames))
}
