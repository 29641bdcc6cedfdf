//! Frame data shared by the decode, composite and export stages

use image::RgbaImage;
use serde::Serialize;

/// Delay used when a source frame declares no delay at all.
pub const DEFAULT_DELAY_MS: u32 = 100;

/// How the canvas is prepared for the next frame once a frame has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisposalMethod {
    /// Unspecified; behaves like [`DisposalMethod::DoNotDispose`]
    #[default]
    None,
    /// Leave the frame in place
    DoNotDispose,
    /// Clear the frame's rectangle to transparent
    RestoreBackground,
    /// Restore the canvas as it was before the frame was drawn
    RestorePrevious,
}

impl From<gif::DisposalMethod> for DisposalMethod {
    fn from(method: gif::DisposalMethod) -> Self {
        match method {
            gif::DisposalMethod::Any => DisposalMethod::None,
            gif::DisposalMethod::Keep => DisposalMethod::DoNotDispose,
            gif::DisposalMethod::Background => DisposalMethod::RestoreBackground,
            gif::DisposalMethod::Previous => DisposalMethod::RestorePrevious,
        }
    }
}

impl std::fmt::Display for DisposalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DisposalMethod::None => "none",
            DisposalMethod::DoNotDispose => "do-not-dispose",
            DisposalMethod::RestoreBackground => "restore-background",
            DisposalMethod::RestorePrevious => "restore-previous",
        };
        f.write_str(name)
    }
}

/// Placement and timing of one decoded source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameInfo {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub delay_centiseconds: u16,
    pub disposal: DisposalMethod,
    pub transparent_index: Option<u8>,
}

/// A decoded pixel rectangle that covers part of the canvas.
#[derive(Debug, Clone)]
pub struct RawSubFrame {
    pub info: FrameInfo,
    /// RGBA pixels, `info.width * info.height * 4` bytes
    pub pixels: Vec<u8>,
}

impl RawSubFrame {
    /// Display time in milliseconds; a zero delay means [`DEFAULT_DELAY_MS`].
    pub fn delay_ms(&self) -> u32 {
        match self.info.delay_centiseconds {
            0 => DEFAULT_DELAY_MS,
            cs => cs as u32 * 10,
        }
    }
}

/// A full-canvas frame, ready for editing or export.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositedFrame {
    pub image: RgbaImage,
    pub delay_ms: u32,
}

impl CompositedFrame {
    pub fn new(image: RgbaImage, delay_ms: u32) -> Self {
        Self { image, delay_ms }
    }

    /// A fully transparent frame of the given size.
    pub fn blank(width: u32, height: u32, delay_ms: u32) -> Self {
        Self { image: RgbaImage::new(width, height), delay_ms }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
