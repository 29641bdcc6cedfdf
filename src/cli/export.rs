//! Export command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::compress::ZlibCompressor;
use crate::config::{load_config, merge_cli_overrides, CliOverrides};
use crate::tags::Tag;

use super::{load_document, ExportFormat, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Default output path: `{dir}/{input_stem}.{ext}`.
fn default_output_path(input: &Path, dir: &Path, format: ExportFormat) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    dir.join(format!("{}.{}", stem, format.extension()))
}

fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)
}

/// Execute the export command
pub fn run_export(
    input: &Path,
    format: ExportFormat,
    output: Option<&Path>,
    tag_args: &[String],
    overrides: &CliOverrides,
    config_path: Option<&Path>,
) -> ExitCode {
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    merge_cli_overrides(&mut config, overrides);

    let mut tags = Vec::with_capacity(tag_args.len());
    for arg in tag_args {
        match arg.parse::<Tag>() {
            Ok(tag) => tags.push(tag),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        }
    }
    if !tags.is_empty() && format == ExportFormat::Gif {
        eprintln!("Warning: --tag is ignored for GIF export");
    }

    let mut document = match load_document(input) {
        Ok(document) => document,
        Err(code) => return code,
    };

    if format == ExportFormat::Aseprite {
        for tag in tags {
            if let Err(e) = document.add_tag(tag) {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        }
    }

    let result = match format {
        ExportFormat::Gif => document.export_gif(&config.gif.options()),
        ExportFormat::Aseprite => match ZlibCompressor::new(config.aseprite.compression_level) {
            Ok(compressor) => document.export_aseprite(&compressor, &config.aseprite.options()),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        },
    };

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Export failed: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input, &config.output.dir, format),
    };
    if let Err(e) = write_output(&path, &bytes) {
        eprintln!("Error: Cannot write '{}': {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!(
        "Exported {} frames ({} bytes) to {}",
        document.frame_count(),
        bytes.len(),
        path.display()
    );
    ExitCode::from(EXIT_SUCCESS)
}
