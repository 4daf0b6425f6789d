//! Emit command implementation.

use std::path::PathBuf;

use clap::Args;
use filetalk_form::{resolve_route, FormRenderer};
use filetalk_patchboard::{build_form_envelope, build_signal, Outbox};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::load_form;
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};
use crate::renderer::{parse_key_val, HeadlessRenderer};

/// Fill in a form and write it to the outbox
#[derive(Debug, Args)]
pub struct EmitCommand {
    /// Description file, or `-` for stdin
    pub file: PathBuf,

    /// Field value as `name=value` (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub set: Vec<(String, String)>,

    /// JSON object of field values
    #[arg(long, value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Print the signal instead of writing a message
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct EmitOutput {
    id: String,
    channel: String,
    path: PathBuf,
}

impl FormattedOutput for EmitOutput {
    fn format_text(&self) -> String {
        format!("emitted on '{}': {}", self.channel, self.path.display())
    }
}

impl EmitCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let form = load_form(&self.file)?;

        let mut renderer = HeadlessRenderer::new().with_overrides(self.set.clone());
        if let Some(path) = &self.values {
            renderer = renderer.with_values_file(path)?;
        }
        let handle = renderer.render_form(&form.spec)?;
        let values = renderer.read_values(&handle)?;

        if self.dry_run {
            let signal = build_signal(&form.spec, &values)?;
            println!("{}", serde_json::to_string_pretty(&Value::Object(signal))?);
            return Ok(());
        }

        let route = resolve_route(form.spec.directives(), &ctx.store)?;
        let envelope = build_form_envelope(&form.spec, &values, &route.channel)?;
        let emitted = Outbox::new(&route.outbox).emit(&envelope)?;
        info!(id = %emitted.id, "form emitted");

        print_output(
            ctx,
            &EmitOutput {
                id: emitted.id.to_string(),
                channel: route.channel,
                path: emitted.path,
            },
        )
    }
}
