//! Named frame ranges

use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// Default tag colour (opaque black).
pub const DEFAULT_TAG_COLOR: [u8; 4] = [0, 0, 0, 255];

/// A named, inclusive, 0-based frame range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub from_frame: u16,
    pub to_frame: u16,
    /// RGBA; alpha is not stored by the archive format
    pub color: [u8; 4],
}

impl Tag {
    pub fn new(name: impl Into<String>, from_frame: u16, to_frame: u16) -> Self {
        Self { name: name.into(), from_frame, to_frame, color: DEFAULT_TAG_COLOR }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn overlaps(&self, other: &Tag) -> bool {
        self.from_frame <= other.to_frame && other.from_frame <= self.to_frame
    }
}

/// Error for a tag that cannot be stored or encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("Tag name must not be empty")]
    EmptyName,
    #[error("Tag '{name}' ends at frame {to} before it starts at frame {from}")]
    InvertedRange { name: String, from: u16, to: u16 },
    #[error("Tag '{name}' ends at frame {to} but only {frame_count} frames exist")]
    OutOfRange { name: String, to: u16, frame_count: usize },
    #[error("Tag '{first}' overlaps tag '{second}'")]
    Overlap { first: String, second: String },
    #[error("Invalid tag '{input}': {reason}")]
    Parse { input: String, reason: String },
}

/// Check one tag against the frame count.
pub fn validate_tag(tag: &Tag, frame_count: usize) -> Result<(), TagError> {
    if tag.name.is_empty() {
        return Err(TagError::EmptyName);
    }
    if tag.from_frame > tag.to_frame {
        return Err(TagError::InvertedRange {
            name: tag.name.clone(),
            from: tag.from_frame,
            to: tag.to_frame,
        });
    }
    if tag.to_frame as usize >= frame_count {
        return Err(TagError::OutOfRange { name: tag.name.clone(), to: tag.to_frame, frame_count });
    }
    Ok(())
}

/// Check a whole tag list: every tag valid and no two ranges overlapping.
pub fn validate_tags(tags: &[Tag], frame_count: usize) -> Result<(), TagError> {
    for (i, tag) in tags.iter().enumerate() {
        validate_tag(tag, frame_count)?;
        if let Some(other) = tags[..i].iter().find(|other| other.overlaps(tag)) {
            return Err(TagError::Overlap { first: other.name.clone(), second: tag.name.clone() });
        }
    }
    Ok(())
}

/// Parses `name:from-to` or `name:from-to:#rrggbb[aa]`.
impl FromStr for Tag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| TagError::Parse { input: s.to_string(), reason: reason.to_string() };

        let mut parts = s.splitn(3, ':');
        let name = parts.next().unwrap_or_default();
        let range = parts.next().ok_or_else(|| fail("expected name:from-to"))?;
        let color = parts.next();

        let (from, to) = range.split_once('-').ok_or_else(|| fail("range must be from-to"))?;
        let from_frame = from.trim().parse().map_err(|_| fail("invalid start frame"))?;
        let to_frame = to.trim().parse().map_err(|_| fail("invalid end frame"))?;

        let mut tag = Tag::new(name, from_frame, to_frame);
        if let Some(color) = color {
            tag.color = parse_hex_color(color).ok_or_else(|| fail("color must be #rrggbb or #rrggbbaa"))?;
        }
        if tag.name.is_empty() {
            return Err(TagError::EmptyName);
        }
        Ok(tag)
    }
}

fn parse_hex_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}
