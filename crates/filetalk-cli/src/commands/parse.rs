//! Parse command implementation.

use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;
use filetalk_form::resolve_route;
use serde::Serialize;

use super::load_form;
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// Validate a form description and show its fields
#[derive(Debug, Args)]
pub struct ParseCommand {
    /// Description file, or `-` for stdin
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct FormSummary {
    title: String,
    channel: String,
    outbox: PathBuf,
    fields: Vec<FieldSummary>,
}

#[derive(Debug, Serialize)]
struct FieldSummary {
    name: String,
    #[serde(rename = "type")]
    type_spec: String,
    editable: bool,
}

impl FormattedOutput for FormSummary {
    fn format_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "  channel: {}", self.channel);
        let _ = writeln!(out, "  outbox:  {}", self.outbox.display());
        let width = self.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
        for field in &self.fields {
            let _ = write!(out, "\n  {:width$} -- {}", field.name, field.type_spec);
        }
        out.trim_end().to_string()
    }
}

impl ParseCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let form = load_form(&self.file)?;
        let route = resolve_route(form.spec.directives(), &ctx.store)?;

        let summary = FormSummary {
            title: form.spec.display_title(form.source.as_deref(), 1),
            channel: route.channel,
            outbox: route.outbox,
            fields: form
                .spec
                .fields()
                .iter()
                .map(|f| FieldSummary {
                    name: f.name.clone(),
                    type_spec: f.field_type.to_string(),
                    editable: f.field_type.is_editable(),
                })
                .collect(),
        };
        print_output(ctx, &summary)
    }
}
