//! Info command implementation

use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use crate::decode::{FrameSource, GifSource};
use crate::frames::FrameInfo;

use super::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Debug, Serialize)]
struct SourceSummary {
    width: u32,
    height: u32,
    frame_count: usize,
    frames: Vec<FrameInfo>,
}

fn summarize(source: &GifSource) -> Result<SourceSummary, crate::decode::DecodeError> {
    let frames = (0..source.frame_count()).map(|i| source.frame_info(i)).collect::<Result<Vec<_>, _>>()?;
    Ok(SourceSummary {
        width: source.width(),
        height: source.height(),
        frame_count: source.frame_count(),
        frames,
    })
}

/// Execute the info command
pub fn run_info(input: &Path, json: bool) -> ExitCode {
    let bytes = match std::fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot open input file '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let summary = match GifSource::from_bytes(&bytes).and_then(|source| summarize(&source)) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    println!("{}: {}x{}, {} frames", input.display(), summary.width, summary.height, summary.frame_count);
    for (i, frame) in summary.frames.iter().enumerate() {
        let transparent = frame.transparent_index.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "  frame {:>3}: {}x{} at ({}, {}), {} cs, dispose {}, transparent {}",
            i,
            frame.width,
            frame.height,
            frame.x,
            frame.y,
            frame.delay_centiseconds,
            frame.disposal,
            transparent
        );
    }
    ExitCode::from(EXIT_SUCCESS)
}
