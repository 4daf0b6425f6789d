//! FileTalk form producer
//!
//! Main entry point for the `form-producer` binary.

use std::process::ExitCode;

use clap::Parser;
use filetalk_common_async::{build_runtime, RuntimeConfig};
use filetalk_common_config::Environment;
use filetalk_common_log::{LogConfig, LogLevel};
use tracing::debug;

mod cli;
mod commands;
mod error;
mod output;
mod renderer;

use cli::Cli;
use error::CliError;

/// Application exit codes
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    ValidationError = 5,
    Interrupted = 130,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    // .env files first, so they can feed both logging and config
    let _env = Environment::init();

    let cli = Cli::parse();

    init_tracing(&cli);

    let runtime = match build_runtime(RuntimeConfig::default()) {
        Ok(runtime) => runtime,
        Err(e) => return report(CliError::from(e)),
    };

    match runtime.block_on(cli.execute()) {
        Ok(()) => Exit::Success.into(),
        Err(e) => report(e),
    }
}

fn report(e: CliError) -> ExitCode {
    debug!(code = e.code(), error = ?e, "command failed");
    eprintln!("error[{}]: {e}", e.code());
    if let Some(location) = e.location() {
        eprintln!("  --> {location}");
    }
    if let Some(hint) = e.hint() {
        eprintln!("  hint: {hint}");
    }
    e.exit_code().into()
}

fn init_tracing(cli: &Cli) {
    let mut config = LogConfig::from_env();
    let level_from_env = std::env::var_os("FILETALK_LOG_LEVEL").is_some();
    if cli.verbose > 0 || cli.quiet || !level_from_env {
        config = config.with_level(LogLevel::from_verbosity(cli.verbose, cli.quiet));
    }

    if let Err(e) = filetalk_common_log::init(config) {
        eprintln!("warning: logging disabled: {e}");
        return;
    }
    debug!(verbose = cli.verbose, "logging initialized");
}
