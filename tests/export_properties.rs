//! End-to-end properties of the decode → composite → export pipeline
//!
//! These tests drive the public library API the way an editor host would:
//! load a GIF, edit the document, and export to both containers.

use flate2::read::ZlibDecoder;
use image::{Rgba, RgbaImage};
use pxanim::composite::composite;
use pxanim::compress::ZlibCompressor;
use pxanim::decode::{read_sub_frames, GifSource};
use pxanim::document::Document;
use pxanim::export::aseprite::{CHUNK_CEL, CHUNK_TAGS, FILE_HEADER_SIZE, FRAME_HEADER_SIZE};
use pxanim::export::{encode_aseprite, export_gif, AsepriteOptions, GifOptions};
use pxanim::frames::CompositedFrame;
use pxanim::indexed::encode_indexed;
use pxanim::palette::{build_palette, TRANSPARENT_INDEX};
use pxanim::tags::Tag;
use std::borrow::Cow;
use std::io::Read;

fn word(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn dword(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Build a GIF whose frames use mixed disposal methods.
///
/// Palette: 0 = red, 1 = green, 2 = blue, 3 = transparent key.
fn mixed_disposal_gif() -> Vec<u8> {
    let palette = [255, 0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0];
    let frames: [(u16, u16, u16, u16, Vec<u8>, gif::DisposalMethod); 4] = [
        (0, 0, 4, 4, vec![0; 16], gif::DisposalMethod::Keep),
        (1, 1, 2, 2, vec![1; 4], gif::DisposalMethod::Background),
        (0, 0, 2, 1, vec![2; 2], gif::DisposalMethod::Previous),
        (3, 3, 1, 1, vec![3], gif::DisposalMethod::Keep),
    ];

    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, 4, 4, &palette).unwrap();
        for (x, y, w, h, indices, dispose) in &frames {
            let mut frame = gif::Frame::default();
            frame.left = *x;
            frame.top = *y;
            frame.width = *w;
            frame.height = *h;
            frame.delay = 0;
            frame.dispose = *dispose;
            frame.transparent = Some(3);
            frame.buffer = Cow::Borrowed(indices);
            encoder.write_frame(&frame).unwrap();
        }
    }
    out
}

#[test]
fn test_mixed_disposal_sequence() {
    let source = GifSource::from_bytes(&mixed_disposal_gif()).unwrap();
    let frames = composite(&read_sub_frames(&source).unwrap(), 4, 4);

    assert_eq!(frames.len(), 4);
    for frame in &frames {
        assert_eq!(frame.image.dimensions(), (4, 4));
        assert_eq!(frame.delay_ms, 100);
    }

    let red = [255, 0, 0, 255];
    let green = [0, 255, 0, 255];
    let blue = [0, 0, 255, 255];
    let clear = [0, 0, 0, 0];

    // Frame 1 draws green over red
    assert_eq!(frames[1].image.get_pixel(1, 1).0, green);
    // Frame 2 starts from frame 1 with the green square cleared
    assert_eq!(frames[2].image.get_pixel(1, 1).0, clear);
    assert_eq!(frames[2].image.get_pixel(0, 0).0, blue);
    assert_eq!(frames[2].image.get_pixel(3, 3).0, red);
    // Frame 3 starts from the snapshot taken before frame 2 drew blue
    assert_eq!(frames[3].image.get_pixel(0, 0).0, red);
    assert_eq!(frames[3].image.get_pixel(1, 1).0, clear);
    // A transparent pixel overwrites rather than blends
    assert_eq!(frames[3].image.get_pixel(3, 3).0[3], 0);
}

#[test]
fn test_opaque_pixels_never_use_sentinel() {
    let source = GifSource::from_bytes(&mixed_disposal_gif()).unwrap();
    let frames = composite(&read_sub_frames(&source).unwrap(), 4, 4);
    let palette = build_palette(&frames).unwrap();

    for frame in &frames {
        let indexed = encode_indexed(frame, &palette);
        for (pixel, index) in frame.image.pixels().zip(&indexed.indices) {
            if pixel.0[3] >= 128 {
                assert_ne!(*index, TRANSPARENT_INDEX);
                assert_eq!(palette.get(*index), [pixel.0[0], pixel.0[1], pixel.0[2]]);
            } else {
                assert_eq!(*index, TRANSPARENT_INDEX);
            }
        }
    }
}

#[test]
fn test_gif_round_trip_red_blue() {
    let frames = vec![
        CompositedFrame::new(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])), 100),
        CompositedFrame::new(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255])), 100),
    ];
    let bytes = export_gif(&frames, &GifOptions::default()).unwrap();
    let document = Document::from_gif_bytes(&bytes).unwrap();

    assert_eq!(document.frame_count(), 2);
    for (original, decoded) in frames.iter().zip(document.frames()) {
        assert_eq!(decoded.delay_ms, 100);
        for (a, b) in original.image.pixels().zip(decoded.image.pixels()) {
            for c in 0..3 {
                assert!((a.0[c] as i32 - b.0[c] as i32).abs() <= 8);
            }
        }
    }
}

#[test]
fn test_aseprite_single_white_pixel() {
    let pixel: &[u8] = &[255, 255, 255, 255];
    let bytes = encode_aseprite(
        1,
        1,
        &[pixel],
        &[100],
        &[],
        &ZlibCompressor::default(),
        &AsepriteOptions::default(),
    )
    .unwrap();

    assert_eq!(dword(&bytes, 0) as usize, bytes.len());

    let frame_start = FILE_HEADER_SIZE;
    let frame_end = frame_start + dword(&bytes, frame_start) as usize;
    assert_eq!(frame_end, bytes.len());

    // Walk to the last chunk of the frame
    let mut at = frame_start + FRAME_HEADER_SIZE;
    let mut last = at;
    while at < frame_end {
        last = at;
        at += dword(&bytes, at) as usize;
    }
    assert_eq!(at, frame_end);
    assert_eq!(word(&bytes, last + 4), CHUNK_CEL);

    let payload = &bytes[last + 6 + 20..frame_end];
    let mut inflated = Vec::new();
    ZlibDecoder::new(payload).read_to_end(&mut inflated).unwrap();
    assert_eq!(inflated, pixel);
}

#[test]
fn test_aseprite_tags_in_input_order() {
    let mut document = Document::from_gif_bytes(&mixed_disposal_gif()).unwrap();
    document.add_tag(Tag::new("walk", 2, 3).with_color([1, 2, 3, 4])).unwrap();
    document.add_tag(Tag::new("idle", 0, 1).with_color([9, 8, 7, 6])).unwrap();

    let bytes = document
        .export_aseprite(&ZlibCompressor::default(), &AsepriteOptions::default())
        .unwrap();

    let frame_start = FILE_HEADER_SIZE;
    let mut at = frame_start + FRAME_HEADER_SIZE;
    while word(&bytes, at + 4) != CHUNK_TAGS {
        at += dword(&bytes, at) as usize;
    }

    let mut cursor = at + 6 + 10;
    for tag in document.tags() {
        assert_eq!(word(&bytes, cursor), tag.from_frame);
        assert_eq!(word(&bytes, cursor + 2), tag.to_frame);
        assert_eq!(&bytes[cursor + 13..cursor + 16], &tag.color[..3]);
        let len = word(&bytes, cursor + 17) as usize;
        assert_eq!(&bytes[cursor + 19..cursor + 19 + len], tag.name.as_bytes());
        cursor += 19 + len;
    }
    assert_eq!(document.tags()[0].name, "walk");
}

#[test]
fn test_aseprite_preserves_true_color() {
    // 300 distinct colours would not survive GIF quantization
    let mut image = RgbaImage::new(300, 1);
    for x in 0..300u32 {
        image.put_pixel(x, 0, Rgba([(x % 256) as u8, (x / 2) as u8, 7, 200]));
    }
    let frames = vec![CompositedFrame::new(image.clone(), 100)];
    let bytes = pxanim::export::export_aseprite(
        &frames,
        &[],
        &ZlibCompressor::default(),
        &AsepriteOptions::default(),
    )
    .unwrap();

    let frame_start = FILE_HEADER_SIZE;
    let frame_end = frame_start + dword(&bytes, frame_start) as usize;
    let mut at = frame_start + FRAME_HEADER_SIZE;
    while word(&bytes, at + 4) != CHUNK_CEL {
        at += dword(&bytes, at) as usize;
    }
    let mut inflated = Vec::new();
    ZlibDecoder::new(&bytes[at + 26..frame_end]).read_to_end(&mut inflated).unwrap();
    assert_eq!(inflated, image.into_raw());
}
