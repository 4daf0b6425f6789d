//! Card command implementation.

use std::path::PathBuf;

use clap::Args;
use filetalk_patchboard::{build_card, ComponentCard, Outbox};
use serde::Serialize;

use super::load_form;
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// Show or emit this component's card
#[derive(Debug, Args)]
pub struct CardCommand {
    /// Description of an open form (repeatable)
    #[arg(long = "spec", value_name = "FILE")]
    pub specs: Vec<PathBuf>,

    /// Also write the card to the outbox
    #[arg(long)]
    pub emit: bool,
}

#[derive(Debug, Serialize)]
struct CardView {
    #[serde(flatten)]
    card: ComponentCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    emitted: Option<PathBuf>,
}

impl FormattedOutput for CardView {
    fn format_text(&self) -> String {
        let inbox = self
            .card
            .inbox
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        let mut out = format!(
            "{} (schema {})\ninbox:    {inbox}\noutbox:   {}\nin:       {}\nout:      {}",
            self.card.title,
            self.card.schema_version,
            self.card.outbox.display(),
            self.card.channels.inputs.join(", "),
            self.card.channels.outputs.join(", ")
        );
        if let Some(path) = &self.emitted {
            out.push_str(&format!("\nemitted:  {}", path.display()));
        }
        out
    }
}

impl CardCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let mut forms = Vec::with_capacity(self.specs.len());
        for path in &self.specs {
            forms.push(load_form(path)?.spec);
        }
        let open: Vec<_> = forms.iter().collect();
        let card = build_card(&ctx.store, &open)?;

        let emitted = if self.emit {
            let envelope = card.to_envelope()?;
            Some(Outbox::new(&card.outbox).emit(&envelope)?.path)
        } else {
            None
        };

        print_output(ctx, &CardView { card, emitted })
    }
}
