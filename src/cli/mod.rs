//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod export;
mod info;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::document::Document;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Export container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Animated GIF with a quantized 256-colour palette
    Gif,
    /// Aseprite archive with full RGBA cels and tags
    Aseprite,
}

impl ExportFormat {
    /// Default file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Gif => "gif",
            ExportFormat::Aseprite => "aseprite",
        }
    }
}

/// Pxa - Re-export animated GIFs as GIF or Aseprite files
#[derive(Parser)]
#[command(name = "pxa")]
#[command(about = "Pxa - Composite animated GIFs and export them as GIF or Aseprite archives")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show canvas size and per-frame placement, timing and disposal
    Info {
        /// Input GIF file
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Composite a GIF and export it
    Export {
        /// Input GIF file
        input: PathBuf,

        /// Output container format
        #[arg(short, long, value_enum, default_value = "gif")]
        format: ExportFormat,

        /// Output file. If omitted: {output.dir}/{input_stem}.{ext}
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the default output path (overrides [output] dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Frame tag as name:from-to or name:from-to:#rrggbb (aseprite only, repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// GIF loop count (0 loops forever)
        #[arg(long)]
        loop_count: Option<u16>,

        /// zlib level for Aseprite cels (0-9)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        compression_level: Option<u32>,

        /// Path to pxa.toml (default: search upward from the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Read and composite an input GIF, reporting failures to stderr.
pub(crate) fn load_document(input: &Path) -> Result<Document, ExitCode> {
    let bytes = match std::fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot open input file '{}': {}", input.display(), e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };

    Document::from_gif_bytes(&bytes).map_err(|e| {
        eprintln!("Error: Cannot load '{}': {}", input.display(), e);
        ExitCode::from(EXIT_ERROR)
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input, json } => info::run_info(&input, json),
        Commands::Export {
            input,
            format,
            output,
            out_dir,
            tags,
            loop_count,
            compression_level,
            config,
        } => {
            let overrides = CliOverrides { loop_count, compression_level, output_dir: out_dir };
            export::run_export(&input, format, output.as_deref(), &tags, &overrides, config.as_deref())
        }
    }
}
