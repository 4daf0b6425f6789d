//! Inbox ingestion.
//!
//! An inbox is a directory other components drop envelopes into. A scan
//! reads every `*.json` file in name order, surfaces form descriptions
//! pushed on the `text` channel, and consumes every file it looked at so no
//! file is ever processed twice.

use std::fmt;
use std::path::{Path, PathBuf};

use filetalk_common_core::{FormId, MessageId};
use filetalk_common_fs as fs;
use filetalk_common_log::spans;
use filetalk_form::{FormSpec, ParseDefect};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::envelope::channels;

/// Largest inbox file read; bigger files are rejected with a diagnostic.
pub const DEFAULT_MAX_FILE_SIZE: usize = 4 * 1024 * 1024;

/// What happens to an inbox file once it has been read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConsumePolicy {
    /// Remove the file.
    #[default]
    Delete,
    /// Move the file into another directory under a fresh unique name.
    MoveTo(PathBuf),
}

/// A form description received through the inbox.
#[derive(Debug, Clone)]
pub struct IngestedForm {
    pub id: FormId,
    /// The inbox file it arrived in (no longer present).
    pub source: PathBuf,
    pub spec: FormSpec,
}

/// Non-fatal problem with one inbox file.
#[derive(Debug, Clone)]
pub struct IngestionDiagnostic {
    pub file: PathBuf,
    pub problem: IngestionProblem,
}

#[derive(Debug, Clone)]
pub enum IngestionProblem {
    /// The file could not be read.
    Unreadable(String),
    /// Not JSON, or not an envelope.
    MalformedEnvelope(String),
    /// A pushed description that does not parse.
    InvalidDescription(ParseDefect),
    /// Read but could not be removed or moved; it will be seen again.
    NotConsumed(String),
}

impl fmt::Display for IngestionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(e) => write!(f, "unreadable: {e}"),
            Self::MalformedEnvelope(e) => write!(f, "malformed envelope: {e}"),
            Self::InvalidDescription(defect) => write!(f, "invalid form description: {defect}"),
            Self::NotConsumed(e) => write!(f, "could not consume: {e}"),
        }
    }
}

impl fmt::Display for IngestionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.problem)
    }
}

/// A well-formed envelope that was not a form push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredMessage {
    pub file: PathBuf,
    pub channel: String,
}

/// Result of one inbox scan.
#[derive(Debug, Clone, Default)]
pub struct InboxReport {
    pub forms: Vec<IngestedForm>,
    pub diagnostics: Vec<IngestionDiagnostic>,
    pub ignored: Vec<IgnoredMessage>,
}

impl InboxReport {
    /// Whether the scan found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty() && self.diagnostics.is_empty() && self.ignored.is_empty()
    }
}

/// The inbox directory itself could not be listed.
#[derive(Debug, Error)]
#[error("failed to scan inbox {}: {source}", dir.display())]
pub struct InboxError {
    pub dir: PathBuf,
    #[source]
    pub source: filetalk_common_core::Error,
}

/// A consume policy that would hand files straight back to the inbox.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("consumed files cannot be moved into the inbox itself ({})", dir.display())]
pub struct PolicyError {
    pub dir: PathBuf,
}

#[derive(Deserialize)]
struct IncomingEnvelope {
    channel: String,
    #[serde(default)]
    signal: Value,
}

enum Outcome {
    Form(FormSpec),
    Problem(IngestionProblem),
    Ignored(String),
}

enum Consumed {
    Yes,
    /// Someone else took the file first.
    Gone,
}

/// A directory of incoming messages.
#[derive(Debug, Clone)]
pub struct Inbox {
    dir: PathBuf,
    policy: ConsumePolicy,
    max_file_size: usize,
}

impl Inbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            policy: ConsumePolicy::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set what happens to files once read.
    ///
    /// Moving files into the inbox directory itself would make every scan
    /// see them again, so that target is rejected.
    pub fn with_policy(mut self, policy: ConsumePolicy) -> Result<Self, PolicyError> {
        if let ConsumePolicy::MoveTo(target) = &policy {
            if fs::path::absolutize(target) == fs::path::absolutize(&self.dir) {
                return Err(PolicyError { dir: target.clone() });
            }
        }
        self.policy = policy;
        Ok(self)
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> &ConsumePolicy {
        &self.policy
    }

    /// Scan the inbox once.
    ///
    /// A missing directory is an empty scan. Each file is fully handled
    /// (read, classified, consumed) before the next one is looked at, and a
    /// result is only reported once its file has been consumed.
    pub fn poll(&self) -> Result<InboxReport, InboxError> {
        let _span = spans::scan_span(&self.dir.display().to_string()).entered();
        let mut report = InboxReport::default();

        if !fs::is_dir(&self.dir) {
            debug!("inbox directory absent");
            return Ok(report);
        }

        let timer = spans::Timer::start("inbox_scan");
        let files = fs::list_files(&self.dir).map_err(|source| InboxError {
            dir: self.dir.clone(),
            source,
        })?;

        for file in files.into_iter().filter(|f| is_candidate(f)) {
            let outcome = match fs::read_to_string(&file, self.max_file_size) {
                Ok(contents) => classify(&contents),
                Err(e) if e.is_not_found() => {
                    debug!(file = %file.display(), "file vanished before it was read");
                    continue;
                }
                Err(e) => Outcome::Problem(IngestionProblem::Unreadable(e.to_string())),
            };

            match self.consume(&file) {
                Ok(Consumed::Yes) => {}
                Ok(Consumed::Gone) => {
                    debug!(file = %file.display(), "file consumed elsewhere, skipping");
                    continue;
                }
                Err(e) => {
                    let diagnostic = IngestionDiagnostic {
                        file,
                        problem: IngestionProblem::NotConsumed(e.to_string()),
                    };
                    warn!(%diagnostic, "inbox file left in place");
                    report.diagnostics.push(diagnostic);
                    continue;
                }
            }

            match outcome {
                Outcome::Form(spec) => {
                    let id = FormId::new();
                    info!(form = %id, file = %file.display(), fields = spec.len(), "form received");
                    report.forms.push(IngestedForm {
                        id,
                        source: file,
                        spec,
                    });
                }
                Outcome::Problem(problem) => {
                    let diagnostic = IngestionDiagnostic { file, problem };
                    warn!(%diagnostic, "inbox file rejected");
                    report.diagnostics.push(diagnostic);
                }
                Outcome::Ignored(channel) => {
                    debug!(file = %file.display(), channel = %channel, "non-form message consumed");
                    report.ignored.push(IgnoredMessage { file, channel });
                }
            }
        }

        timer.finish();
        Ok(report)
    }

    fn consume(&self, file: &Path) -> filetalk_common_core::Result<Consumed> {
        let _span = spans::file_span("consume", &file.display().to_string()).entered();
        match &self.policy {
            ConsumePolicy::Delete => Ok(if fs::remove_file_if_exists(file)? {
                Consumed::Yes
            } else {
                Consumed::Gone
            }),
            ConsumePolicy::MoveTo(dir) => {
                match fs::move_into(file, dir, &MessageId::new().file_name()) {
                    Ok(_) => Ok(Consumed::Yes),
                    Err(e) if e.is_not_found() => Ok(Consumed::Gone),
                    Err(e) => Err(e),
                }
            }
        }
    }
}

/// Scan `dir` once, deleting consumed files. See [`Inbox::poll`].
pub fn poll_inbox(dir: impl Into<PathBuf>) -> Result<InboxReport, InboxError> {
    Inbox::new(dir).poll()
}

/// Visible `*.json` files only; hidden files include in-flight temporaries.
fn is_candidate(path: &Path) -> bool {
    !fs::path::is_hidden(path)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".json"))
}

fn classify(contents: &str) -> Outcome {
    let envelope: IncomingEnvelope = match serde_json::from_str(contents) {
        Ok(envelope) => envelope,
        Err(e) => return Outcome::Problem(IngestionProblem::MalformedEnvelope(e.to_string())),
    };

    match envelope.signal {
        Value::String(text) if envelope.channel == channels::TEXT => match FormSpec::parse(&text) {
            Ok(spec) => Outcome::Form(spec),
            Err(defect) => Outcome::Problem(IngestionProblem::InvalidDescription(defect)),
        },
        _ => Outcome::Ignored(envelope.channel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn drop_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn envelope(channel: &str, signal: Value) -> String {
        json!({"channel": channel, "timestamp": "1700000000.000001", "signal": signal}).to_string()
    }

    #[test]
    fn test_missing_directory_is_empty_scan() {
        let dir = tempdir().unwrap();
        let report = poll_inbox(dir.path().join("nope")).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_text_message_becomes_form() {
        let dir = tempdir().unwrap();
        let file = drop_file(dir.path(), "a.json", &envelope("text", json!("a -- bool")));

        let report = poll_inbox(dir.path()).unwrap();
        assert_eq!(report.forms.len(), 1);
        assert_eq!(report.forms[0].source, file);
        assert_eq!(report.forms[0].spec.fields()[0].name, "a");
        assert!(!file.exists());

        assert!(poll_inbox(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_bad_description_is_diagnosed_and_consumed() {
        let dir = tempdir().unwrap();
        let file = drop_file(dir.path(), "a.json", &envelope("text", json!("bad -- nosuchtype")));

        let report = poll_inbox(dir.path()).unwrap();
        assert!(report.forms.is_empty());
        assert_eq!(report.diagnostics.len(), 1);
        assert!(matches!(
            &report.diagnostics[0].problem,
            IngestionProblem::InvalidDescription(d) if d.is_unknown_type()
        ));
        assert!(!file.exists());
    }

    #[test]
    fn test_garbage_is_diagnosed_and_consumed() {
        let dir = tempdir().unwrap();
        let garbage = drop_file(dir.path(), "g.json", "{not json");
        let array = drop_file(dir.path(), "h.json", "[1,2,3]");

        let report = poll_inbox(dir.path()).unwrap();
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report
            .diagnostics
            .iter()
            .all(|d| matches!(d.problem, IngestionProblem::MalformedEnvelope(_))));
        assert!(!garbage.exists() && !array.exists());
    }

    #[test]
    fn test_other_channels_ignored_but_consumed() {
        let dir = tempdir().unwrap();
        let other = drop_file(dir.path(), "o.json", &envelope("bugs", json!({"x": 1})));
        let text_object = drop_file(dir.path(), "t.json", &envelope("text", json!({"x": 1})));

        let report = poll_inbox(dir.path()).unwrap();
        assert!(report.forms.is_empty());
        assert!(report.diagnostics.is_empty());
        let channels: Vec<_> = report.ignored.iter().map(|m| m.channel.as_str()).collect();
        assert_eq!(channels, vec!["bugs", "text"]);
        assert!(!other.exists() && !text_object.exists());
    }

    #[test]
    fn test_non_candidates_untouched() {
        let dir = tempdir().unwrap();
        let hidden = drop_file(dir.path(), ".x.json.tmp", &envelope("text", json!("a -- bool")));
        let hidden_json = drop_file(dir.path(), ".y.json", &envelope("text", json!("a -- bool")));
        let notes = drop_file(dir.path(), "notes.txt", "hello");
        std::fs::create_dir(dir.path().join("sub.json")).unwrap();

        let report = poll_inbox(dir.path()).unwrap();
        assert!(report.is_empty());
        assert!(hidden.exists() && hidden_json.exists() && notes.exists());
    }

    #[test]
    fn test_files_processed_in_name_order() {
        let dir = tempdir().unwrap();
        drop_file(dir.path(), "b.json", &envelope("text", json!("second -- bool")));
        drop_file(dir.path(), "a.json", &envelope("text", json!("first -- bool")));

        let report = poll_inbox(dir.path()).unwrap();
        let names: Vec<_> = report
            .forms
            .iter()
            .map(|f| f.spec.fields()[0].name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_move_policy() {
        let dir = tempdir().unwrap();
        let processed = dir.path().join("processed");
        let file = drop_file(dir.path(), "a.json", &envelope("text", json!("a -- bool")));

        let inbox = Inbox::new(dir.path())
            .with_policy(ConsumePolicy::MoveTo(processed.clone()))
            .unwrap();
        let report = inbox.poll().unwrap();

        assert_eq!(report.forms.len(), 1);
        assert!(!file.exists());
        assert_eq!(std::fs::read_dir(&processed).unwrap().count(), 1);
        assert!(inbox.poll().unwrap().is_empty());
    }

    #[test]
    fn test_oversized_file_is_diagnosed() {
        let dir = tempdir().unwrap();
        let file = drop_file(dir.path(), "big.json", &envelope("text", json!("a -- bool")));

        let report = Inbox::new(dir.path()).with_max_file_size(8).poll().unwrap();
        assert!(matches!(
            report.diagnostics[0].problem,
            IngestionProblem::Unreadable(_)
        ));
        assert!(!file.exists());
    }

    #[test]
    fn test_move_into_inbox_itself_rejected() {
        let dir = tempdir().unwrap();
        let err = Inbox::new(dir.path())
            .with_policy(ConsumePolicy::MoveTo(dir.path().to_path_buf()))
            .unwrap_err();
        assert_eq!(err.dir, dir.path());

        let same = dir.path().join("sub").join("..");
        assert!(Inbox::new(dir.path())
            .with_policy(ConsumePolicy::MoveTo(same))
            .is_err());
    }

    #[test]
    fn test_move_into_subdirectory_allowed() {
        let dir = tempdir().unwrap();
        let inbox = Inbox::new(dir.path())
            .with_policy(ConsumePolicy::MoveTo(dir.path().join("done")))
            .unwrap();
        assert_eq!(inbox.policy(), &ConsumePolicy::MoveTo(dir.path().join("done")));
    }
}
