//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use filetalk_common_config::{keys, vars, ConfigLoader, FileConfigStore};
use tracing::debug;

use crate::commands::{CardCommand, ConfigCommand, EmitCommand, ParseCommand, WatchCommand};
use crate::error::CliError;

/// FileTalk form producer
///
/// Turns compact form descriptions into patchboard messages, and receives
/// new descriptions from other components through an inbox directory.
#[derive(Debug, Parser)]
#[command(
    name = "form-producer",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Project directory holding `.form-producer/config.yaml`
    #[arg(long, global = true, default_value = ".", value_hint = ValueHint::DirPath)]
    pub project: PathBuf,

    /// Explicit configuration file
    #[arg(long, global = true, env = vars::FORM_PRODUCER_CONFIG, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Outbox directory for this run (not saved)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub outbox: Option<PathBuf>,

    /// Inbox directory for this run (not saved)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub inbox: Option<PathBuf>,

    /// Default channel for this run (not saved)
    #[arg(long, global = true)]
    pub channel: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a form description and show its fields
    Parse(ParseCommand),

    /// Fill in a form and write it to the outbox
    Emit(EmitCommand),

    /// Show or emit this component's card
    Card(CardCommand),

    /// Receive form descriptions from the inbox
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

impl Cli {
    /// Open the configuration store with environment and flag overrides.
    pub fn open_store(&self) -> Result<FileConfigStore, CliError> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::new(&self.project),
        };
        debug!(path = %loader.path().display(), "configuration file");

        let mut store = FileConfigStore::open(loader)?.with_env_overrides();
        if let Some(outbox) = &self.outbox {
            store = store.with_override(keys::OUTBOX, outbox.display().to_string())?;
        }
        if let Some(inbox) = &self.inbox {
            store = store.with_override(keys::INBOX, inbox.display().to_string())?;
        }
        if let Some(channel) = &self.channel {
            store = store.with_override(keys::CHANNEL, channel.as_str())?;
        }
        Ok(store)
    }

    /// Execute the selected command
    pub async fn execute(self) -> Result<(), CliError> {
        let mut ctx = CommandContext {
            store: self.open_store()?,
            format: self.format,
        };

        match self.command {
            Command::Parse(cmd) => cmd.execute(&ctx).await,
            Command::Emit(cmd) => cmd.execute(&ctx).await,
            Command::Card(cmd) => cmd.execute(&ctx).await,
            Command::Watch(cmd) => cmd.execute(&ctx).await,
            Command::Config(cmd) => cmd.execute(&mut ctx).await,
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub store: FileConfigStore,
    pub format: OutputFormat,
}
