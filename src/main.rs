//! Pxa - Command-line tool for compositing and re-exporting animated GIFs

use std::process::ExitCode;

use pxanim::cli;

fn main() -> ExitCode {
    cli::run()
}
