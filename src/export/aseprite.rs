//! Aseprite (`.aseprite` / `.ase`) archive export
//!
//! Writes true-colour (32 bpp) files with a single layer and one compressed
//! cel per frame. Layout:
//!
//! | Level  | Header                                   | Size field |
//! |--------|------------------------------------------|------------|
//! | File   | 128 bytes, magic `0xA5E0`                | dword @ 0  |
//! | Frame  | 16 bytes, magic `0xF1FA`                 | dword @ 0  |
//! | Chunk  | 6 bytes: size + type                     | dword @ 0  |
//!
//! Each size covers its whole record, header included, and is backpatched
//! once the record body is complete.

use super::{check_counts, checked_dimensions, ExportError};
use crate::compress::Compressor;
use crate::container::ContainerWriter;
use crate::frames::CompositedFrame;
use crate::tags::{validate_tags, Tag};
use log::debug;

pub const FILE_MAGIC: u16 = 0xA5E0;
pub const FRAME_MAGIC: u16 = 0xF1FA;
pub const FILE_HEADER_SIZE: usize = 128;
pub const FRAME_HEADER_SIZE: usize = 16;

pub const CHUNK_LAYER: u16 = 0x2004;
pub const CHUNK_CEL: u16 = 0x2005;
pub const CHUNK_COLOR_PROFILE: u16 = 0x2007;
pub const CHUNK_TAGS: u16 = 0x2018;
pub const CHUNK_PALETTE: u16 = 0x2019;

const COLOR_DEPTH_RGBA: u16 = 32;
/// Header flag: layer opacity field is valid
const FLAG_LAYER_OPACITY_VALID: u32 = 1;
const DEPRECATED_SPEED: u16 = 100;
const LAYER_FLAGS_VISIBLE_EDITABLE: u16 = 1 | 2;
const COLOR_PROFILE_SRGB: u16 = 1;
const CEL_TYPE_COMPRESSED_IMAGE: u16 = 2;
const TAG_DIRECTION_FORWARD: u8 = 0;
const TAG_REPEAT_INFINITE: u16 = 0;

/// Archive-wide export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsepriteOptions {
    /// Name of the single layer holding every cel
    pub layer_name: String,
}

impl Default for AsepriteOptions {
    fn default() -> Self {
        Self { layer_name: "Layer 1".to_string() }
    }
}

/// Write one chunk: size placeholder, type, body, then the size backpatch.
fn write_chunk<F>(w: &mut ContainerWriter, chunk_type: u16, body: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut ContainerWriter) -> Result<(), ExportError>,
{
    let mark = w.begin_size();
    w.write_word(chunk_type);
    body(w)?;
    w.end_size(mark);
    Ok(())
}

fn write_file_header(w: &mut ContainerWriter, frame_count: u16, width: u16, height: u16) {
    let start = w.position();
    w.write_dword(0); // file size, patched last
    w.write_word(FILE_MAGIC);
    w.write_word(frame_count);
    w.write_word(width);
    w.write_word(height);
    w.write_word(COLOR_DEPTH_RGBA);
    w.write_dword(FLAG_LAYER_OPACITY_VALID);
    w.write_word(DEPRECATED_SPEED);
    w.write_zeros(8);
    w.write_byte(0); // transparent colour index
    w.write_zeros(3);
    w.write_word(0); // palette size
    w.write_byte(1); // pixel width
    w.write_byte(1); // pixel height
    let written = w.position() - start;
    w.write_zeros(FILE_HEADER_SIZE - written);
}

fn write_color_profile(w: &mut ContainerWriter) -> Result<(), ExportError> {
    write_chunk(w, CHUNK_COLOR_PROFILE, |w| {
        w.write_word(COLOR_PROFILE_SRGB);
        w.write_word(0); // flags
        w.write_dword(0); // fixed gamma
        w.write_zeros(8);
        Ok(())
    })
}

fn write_layer(w: &mut ContainerWriter, name: &str) -> Result<(), ExportError> {
    write_chunk(w, CHUNK_LAYER, |w| {
        w.write_word(LAYER_FLAGS_VISIBLE_EDITABLE);
        w.write_word(0); // normal layer
        w.write_word(0); // child level
        w.write_word(0); // default width (ignored)
        w.write_word(0); // default height (ignored)
        w.write_word(0); // blend mode: normal
        w.write_byte(255); // opacity
        w.write_zeros(3);
        w.write_string(name);
        Ok(())
    })
}

/// Grayscale ramp; cels are RGBA so this is only a placeholder palette.
fn write_palette(w: &mut ContainerWriter) -> Result<(), ExportError> {
    write_chunk(w, CHUNK_PALETTE, |w| {
        w.write_dword(256);
        w.write_dword(0);
        w.write_dword(255);
        w.write_zeros(8);
        for level in 0..=255u8 {
            w.write_word(0); // entry flags: no name
            w.write_bytes(&[level, level, level, 255]);
        }
        Ok(())
    })
}

fn write_tags(w: &mut ContainerWriter, tags: &[Tag]) -> Result<(), ExportError> {
    write_chunk(w, CHUNK_TAGS, |w| {
        w.write_word(tags.len() as u16);
        w.write_zeros(8);
        for tag in tags {
            w.write_word(tag.from_frame);
            w.write_word(tag.to_frame);
            w.write_byte(TAG_DIRECTION_FORWARD);
            w.write_word(TAG_REPEAT_INFINITE);
            w.write_zeros(6);
            w.write_bytes(&tag.color[..3]);
            w.write_byte(0);
            w.write_string(&tag.name);
        }
        Ok(())
    })
}

fn write_cel<C: Compressor + ?Sized>(
    w: &mut ContainerWriter,
    width: u16,
    height: u16,
    rgba: &[u8],
    compressor: &C,
) -> Result<(), ExportError> {
    write_chunk(w, CHUNK_CEL, |w| {
        w.write_word(0); // layer index
        w.write_short(0); // x
        w.write_short(0); // y
        w.write_byte(255); // opacity
        w.write_word(CEL_TYPE_COMPRESSED_IMAGE);
        w.write_short(0); // z-index
        w.write_zeros(5);
        w.write_word(width);
        w.write_word(height);
        let compressed = compressor.compress(rgba)?;
        w.write_bytes(&compressed);
        Ok(())
    })
}

/// Encode full-precision RGBA frames as an Aseprite archive.
///
/// `frames` holds one `width * height * 4` byte buffer per frame. Tags are
/// re-validated (range and overlap) before anything is written.
pub fn encode_aseprite<C: Compressor + ?Sized>(
    width: u32,
    height: u32,
    frames: &[&[u8]],
    delays_ms: &[u32],
    tags: &[Tag],
    compressor: &C,
    options: &AsepriteOptions,
) -> Result<Vec<u8>, ExportError> {
    let frame_count = check_counts(frames.len(), delays_ms.len())?;
    let (w16, h16) = checked_dimensions(width, height)?;
    validate_tags(tags, frames.len())?;

    let expected_len = width as usize * height as usize * 4;
    for (index, rgba) in frames.iter().enumerate() {
        if rgba.len() != expected_len {
            let actual_h = (rgba.len() / 4 / width as usize) as u32;
            return Err(ExportError::FrameSizeMismatch {
                index,
                expected: (width, height),
                actual: (width, actual_h),
            });
        }
    }

    let mut w = ContainerWriter::with_capacity(FILE_HEADER_SIZE + expected_len * frames.len() / 2);
    write_file_header(&mut w, frame_count, w16, h16);

    for (index, (rgba, delay_ms)) in frames.iter().zip(delays_ms).enumerate() {
        let first = index == 0;
        let chunk_count: u32 = if first { 4 + u32::from(!tags.is_empty()) } else { 1 };

        let frame_mark = w.begin_size();
        w.write_word(FRAME_MAGIC);
        w.write_word(chunk_count.min(0xFFFF) as u16);
        w.write_word((*delay_ms).min(u16::MAX as u32) as u16);
        w.write_zeros(2);
        w.write_dword(chunk_count);

        if first {
            write_color_profile(&mut w)?;
            write_layer(&mut w, &options.layer_name)?;
            write_palette(&mut w)?;
            if !tags.is_empty() {
                write_tags(&mut w, tags)?;
            }
        }
        write_cel(&mut w, w16, h16, rgba, compressor)?;

        let frame_size = w.end_size(frame_mark);
        debug!("aseprite frame {}: {} chunks, {} bytes", index, chunk_count, frame_size);
    }

    let total = w.position() as u32;
    w.backpatch_dword(0, total);
    debug!("encoded aseprite: {} frames, {} tags, {} bytes", frames.len(), tags.len(), total);
    Ok(w.finish())
}

/// Encode full-canvas frames (delays included) as an Aseprite archive.
pub fn export_aseprite<C: Compressor + ?Sized>(
    frames: &[CompositedFrame],
    tags: &[Tag],
    compressor: &C,
    options: &AsepriteOptions,
) -> Result<Vec<u8>, ExportError> {
    let first = frames.first().ok_or(ExportError::NoFrames)?;
    let (width, height) = (first.width(), first.height());
    for (index, frame) in frames.iter().enumerate() {
        if (frame.width(), frame.height()) != (width, height) {
            return Err(ExportError::FrameSizeMismatch {
                index,
                expected: (width, height),
                actual: (frame.width(), frame.height()),
            });
        }
    }
    let buffers: Vec<&[u8]> = frames.iter().map(|f| f.image.as_raw().as_slice()).collect();
    let delays: Vec<u32> = frames.iter().map(|f| f.delay_ms).collect();
    encode_aseprite(width, height, &buffers, &delays, tags, compressor, options)
}
