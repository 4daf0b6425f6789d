//! Config command implementation.

use clap::{Args, Subcommand};
use filetalk_common_config::ConfigStore;
use serde::Serialize;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput, SimpleOutput};

/// Manage configuration
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective value of a key
    Get { key: String },

    /// Save a value to the config file (empty clears it)
    Set { key: String, value: String },

    /// Print every key with its effective value
    List,
}

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: String,
    value: Option<String>,
}

impl FormattedOutput for ConfigEntry {
    fn format_text(&self) -> String {
        self.value.clone().unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ConfigListing {
    entries: Vec<ConfigEntry>,
}

impl FormattedOutput for ConfigListing {
    fn format_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{} = {}", e.key, e.value.as_deref().unwrap_or("")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<(), CliError> {
        match &self.action {
            ConfigAction::Get { key } => {
                let value = ctx.store.get(key)?;
                print_output(
                    ctx,
                    &ConfigEntry {
                        key: key.clone(),
                        value,
                    },
                )
            }
            ConfigAction::Set { key, value } => {
                ctx.store.set(key, value)?;
                let path = ctx.store.loader().path().display().to_string();
                print_output(ctx, &SimpleOutput::new(format!("{key} saved to {path}")))
            }
            ConfigAction::List => {
                let entries = ctx
                    .store
                    .entries()?
                    .into_iter()
                    .map(|(key, value)| ConfigEntry {
                        key: key.to_string(),
                        value,
                    })
                    .collect();
                print_output(ctx, &ConfigListing { entries })
            }
        }
    }
}
