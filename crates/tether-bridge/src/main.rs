//! tether: bridge a controlling process to a child running in a PTY.
//!
//! The controller speaks a small framed protocol on stdin (DATA / RESIZE /
//! CLOSE); raw PTY output streams back on stdout. The bridge exits with the
//! child's mapped exit status.

mod bridge;
mod io_pump;

use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

/// Exit code for being invoked without a command to run.
const USAGE_EXIT_CODE: u8 = 2;

fn main() -> ExitCode {
    // stdout carries PTY output, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let command: Vec<String> = std::env::args().skip(1).collect();
    if command.is_empty() {
        eprintln!("usage: tether <command> [args...]");
        return ExitCode::from(USAGE_EXIT_CODE);
    }

    match bridge::run(&command, io::stdin(), &mut io::stdout()) {
        Ok(code) => ExitCode::from((code & 0xff) as u8),
        Err(e) => {
            log::error!("bridge failed: {e}");
            ExitCode::FAILURE
        }
    }
}
