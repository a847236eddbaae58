//! dispatch - drive a background compilation job from the command line
//!
//! Runs one job over a script file the way an engine scheduler would:
//! prepare and finalize on the main thread, parse on a worker thread when
//! the source is backed by an external buffer.
//!
//! ## Quick Start
//!
//! ```bash
//! # Parse a script held as a managed string
//! dispatch compile script.js
//!
//! # Back the source with an external buffer so the parse runs on a worker
//! dispatch compile script.js --external
//!
//! # Machine-readable report with a small parser stack
//! dispatch compile script.js --stack-size 64 --json
//! ```
//!
//! Set `DISPATCH_LOG=debug` to trace every job transition.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            if std::env::var("DISPATCH_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::from(2)
        }
    }
}
