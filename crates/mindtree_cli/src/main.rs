//! Batch converter entry point.
//!
//! Reads a JSON job description from the path given as first argument, or
//! from stdin when none is given, and converts every selected file.

mod config;
mod convert;

use config::ConvertConfig;
use log::error;
use mindtree_core::{default_log_level, init_logging, init_stderr_logging};
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match read_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("mindtree: {err}");
            return ExitCode::FAILURE;
        }
    };

    let level = config.log_level.as_deref().unwrap_or_else(|| default_log_level());
    let logging = match config.log_dir.as_deref() {
        Some(dir) => init_logging(level, dir),
        None => init_stderr_logging(level),
    };
    if let Err(err) = logging {
        eprintln!("mindtree: {err}");
        return ExitCode::FAILURE;
    }

    match convert::run(&config) {
        Ok(written) => {
            for path in written {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=convert_failed module=cli status=error reason=\"{err}\"");
            eprintln!("mindtree: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_config() -> Result<ConvertConfig, config::ConfigError> {
    match std::env::args_os().nth(1) {
        Some(path) => ConvertConfig::from_reader(BufReader::new(File::open(path)?)),
        None => ConvertConfig::from_reader(std::io::stdin().lock()),
    }
}
