//! Watch command implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use filetalk_common_async::ShutdownHandle;
use filetalk_common_config::{keys, ConfigStore};
use filetalk_form::resolve_inbox;
use filetalk_patchboard::{ConsumePolicy, Inbox, InboxReport, InboxWatcher, WatchEvent};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// Receive form descriptions from the inbox
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Polling interval in milliseconds [default: inbox.poll_ms]
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Save each received description into this directory
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Move consumed files here instead of deleting them
    #[arg(long, value_name = "DIR")]
    pub move_to: Option<PathBuf>,

    /// Scan once and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Serialize)]
struct ReceivedForm {
    id: String,
    title: String,
    fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<PathBuf>,
}

impl FormattedOutput for ReceivedForm {
    fn format_text(&self) -> String {
        let mut out = format!("received '{}' ({} fields)", self.title, self.fields);
        if let Some(path) = &self.saved {
            out.push_str(&format!(" -> {}", path.display()));
        }
        out
    }
}

impl WatchCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let dir = resolve_inbox(&ctx.store)?;
        let policy = match &self.move_to {
            Some(target) => ConsumePolicy::MoveTo(target.clone()),
            None => ConsumePolicy::Delete,
        };
        let inbox = Inbox::new(&dir).with_policy(policy)?;
        let mut received = 0;

        if self.once {
            let report = inbox.poll()?;
            return self.handle_report(ctx, report, &mut received);
        }

        let interval = Duration::from_millis(self.interval(ctx)?);
        let shutdown = ShutdownHandle::new();
        let ctrl_c = shutdown.shutdown_on_ctrl_c();
        let mut watcher = InboxWatcher::new(inbox, interval)
            .with_shutdown(shutdown.clone())
            .spawn();
        info!(inbox = %dir.display(), "watching for forms, Ctrl-C to stop");

        let mut failure = None;
        while let Some(event) = watcher.next_event().await {
            if let Err(e) = self.handle_event(ctx, event, &mut received) {
                failure = Some(e);
                watcher.stop();
                break;
            }
        }

        ctrl_c.abort();
        match watcher.join().await {
            // Files behind these events are already consumed.
            Ok(pending) => {
                for event in pending {
                    if let Err(e) = self.handle_event(ctx, event, &mut received) {
                        failure.get_or_insert(e);
                    }
                }
            }
            Err(e) => warn!(error = %e, "watcher task ended abnormally"),
        }
        if let Some(e) = failure {
            return Err(e);
        }

        info!(received, "watch stopped");
        if shutdown.is_shutdown() {
            return Err(CliError::Interrupted);
        }
        Ok(())
    }

    fn interval(&self, ctx: &CommandContext) -> Result<u64, CliError> {
        if let Some(ms) = self.interval_ms {
            return Ok(ms);
        }
        let configured = ctx.store.get(keys::INBOX_POLL_MS)?;
        Ok(configured.and_then(|v| v.parse().ok()).unwrap_or(1000))
    }

    fn handle_event(
        &self,
        ctx: &CommandContext,
        event: WatchEvent,
        received: &mut usize,
    ) -> Result<(), CliError> {
        match event {
            WatchEvent::Report(report) => self.handle_report(ctx, report, received),
            WatchEvent::Failed(e) => {
                warn!(error = %e, "scan failed, retrying");
                Ok(())
            }
        }
    }

    /// Print every received form, even when an earlier one failed to save.
    ///
    /// The first failure is returned once the whole report is handled.
    fn handle_report(
        &self,
        ctx: &CommandContext,
        report: InboxReport,
        received: &mut usize,
    ) -> Result<(), CliError> {
        for diagnostic in &report.diagnostics {
            eprintln!("skipped {diagnostic}");
        }

        let mut failure = None;
        for form in report.forms {
            *received += 1;
            let id = form.id.to_string();
            let saved = match &self.save_dir {
                Some(dir) => match save_description(dir, &id, form.spec.source_text()) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(form = %id, error = %e, "could not save received form");
                        failure.get_or_insert(e);
                        None
                    }
                },
                None => None,
            };
            let output = ReceivedForm {
                title: form.spec.display_title(None, *received),
                fields: form.spec.len(),
                id,
                saved,
            };
            if let Err(e) = print_output(ctx, &output) {
                failure.get_or_insert(e);
            }
        }
        failure.map_or(Ok(()), Err)
    }
}

fn save_description(dir: &Path, id: &str, text: &str) -> Result<PathBuf, CliError> {
    let path = dir.join(format!("{id}.txt"));
    filetalk_common_fs::write_string_atomic(&path, text)?;
    Ok(path)
}
