//! Form description parser.
//!
//! A description is line oriented:
//!
//! ```text
//! # title: Bug report
//! # channel: bugs
//! summary -- str<60>       # one line
//! details -- text<60,8>
//! severity -- choice<low,medium,high>
//! reporter -- "qa-bot"
//! ```
//!
//! Lines starting with `#` are directives when they name a known keyword
//! and plain comments otherwise. Every other non-blank line declares a field.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::field_type::{parse_type_spec, FieldType, TypeSpecError};

/// Token between a field name and its type-spec.
pub const FIELD_SEPARATOR: &str = "--";

/// Marker that starts comment and directive lines.
pub const COMMENT_MARKER: char = '#';

/// A rejected description line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseDefect {
    /// 1-based source line.
    pub line: usize,
    pub reason: DefectReason,
}

impl ParseDefect {
    /// Whether the line named a type that does not exist.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self.reason, DefectReason::Type(TypeSpecError::UnknownType { .. }))
    }

    /// Whether the line named a known type with bad parameters.
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(
            self.reason,
            DefectReason::Type(TypeSpecError::InvalidParameters { .. })
        )
    }
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefectReason {
    #[error("missing '--' separator")]
    MissingSeparator,

    #[error("empty identifier")]
    EmptyIdentifier,

    #[error("invalid identifier '{0}': must not contain whitespace")]
    InvalidIdentifier(String),

    #[error("missing type for '{0}'")]
    MissingType(String),

    #[error("duplicate identifier '{0}'")]
    DuplicateField(String),

    #[error(transparent)]
    Type(#[from] TypeSpecError),
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Position among the form's fields, starting at 0.
    pub order: usize,
}

/// Directive keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Channel,
    Outbox,
    Title,
}

impl DirectiveKind {
    /// All keywords, in the order they are documented.
    pub const ALL: [DirectiveKind; 3] = [Self::Channel, Self::Outbox, Self::Title];

    /// Keyword as written after the comment marker.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Outbox => "outbox",
            Self::Title => "title",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(keyword))
    }
}

/// Per-form overrides. Each kind holds at most one value; the last
/// non-empty occurrence in the text wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbox: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Directives {
    /// Value recorded for `kind`.
    pub fn get(&self, kind: DirectiveKind) -> Option<&str> {
        match kind {
            DirectiveKind::Channel => self.channel.as_deref(),
            DirectiveKind::Outbox => self.outbox.as_deref(),
            DirectiveKind::Title => self.title.as_deref(),
        }
    }

    fn set(&mut self, kind: DirectiveKind, value: String) {
        let slot = match kind {
            DirectiveKind::Channel => &mut self.channel,
            DirectiveKind::Outbox => &mut self.outbox,
            DirectiveKind::Title => &mut self.title,
        };
        *slot = Some(value);
    }

    /// Whether no directive was given.
    pub fn is_empty(&self) -> bool {
        DirectiveKind::ALL.iter().all(|k| self.get(*k).is_none())
    }
}

/// A parsed form. Immutable; re-parsing produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSpec {
    fields: Vec<FieldDefinition>,
    directives: Directives,
    #[serde(rename = "source")]
    source_text: String,
}

impl FormSpec {
    /// Parse a description. See [`parse`].
    pub fn parse(text: &str) -> Result<Self, ParseDefect> {
        parse(text)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// The text this form was parsed from.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Title to show for this form: the `title` directive, else the stem
    /// of the file it was loaded from, else `Untitled #n`.
    pub fn display_title(&self, source: Option<&Path>, ordinal: usize) -> String {
        if let Some(title) = &self.directives.title {
            return title.clone();
        }
        source
            .and_then(|p| p.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("Untitled #{ordinal}"))
    }
}

struct ParserPatterns {
    directive: Regex,
}

fn patterns() -> &'static ParserPatterns {
    static PATTERNS: OnceLock<ParserPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ParserPatterns {
        directive: Regex::new(r"^#\s*([A-Za-z]+)\s*:(.*)$").expect("directive pattern is valid"),
    })
}

/// Parse a form description into a [`FormSpec`].
///
/// Stops at the first defective line.
pub fn parse(text: &str) -> Result<FormSpec, ParseDefect> {
    let mut fields: Vec<FieldDefinition> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut directives = Directives::default();

    // Old Mac files end lines with a bare carriage return.
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    for (index, raw) in normalized.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        let defect = |reason: DefectReason| ParseDefect {
            line: line_no,
            reason,
        };

        if line.is_empty() {
            continue;
        }

        if line.starts_with(COMMENT_MARKER) {
            parse_directive(line, line_no, &mut directives);
            continue;
        }

        let Some((left, right)) = line.split_once(FIELD_SEPARATOR) else {
            return Err(defect(DefectReason::MissingSeparator));
        };

        let name = left.trim();
        if name.is_empty() {
            return Err(defect(DefectReason::EmptyIdentifier));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(defect(DefectReason::InvalidIdentifier(name.to_string())));
        }

        let spec = strip_inline_comment(right).trim();
        if spec.is_empty() {
            return Err(defect(DefectReason::MissingType(name.to_string())));
        }
        let field_type = parse_type_spec(spec).map_err(|e| defect(e.into()))?;

        if !seen.insert(name.to_string()) {
            return Err(defect(DefectReason::DuplicateField(name.to_string())));
        }

        trace!(line = line_no, field = name, ty = %field_type, "field");
        fields.push(FieldDefinition {
            name: name.to_string(),
            field_type,
            order: fields.len(),
        });
    }

    debug!(fields = fields.len(), "parsed form description");
    Ok(FormSpec {
        fields,
        directives,
        source_text: text.to_string(),
    })
}

fn parse_directive(line: &str, line_no: usize, directives: &mut Directives) {
    let Some(caps) = patterns().directive.captures(line) else {
        return;
    };
    let Some(kind) = caps.get(1).and_then(|m| DirectiveKind::from_keyword(m.as_str())) else {
        return;
    };
    let value = caps.get(2).map_or("", |m| m.as_str()).trim();
    if value.is_empty() {
        trace!(line = line_no, directive = kind.keyword(), "empty directive ignored");
        return;
    }
    trace!(line = line_no, directive = kind.keyword(), value, "directive");
    directives.set(kind, value.to_string());
}

/// Cut a trailing `# comment` from a type-spec, ignoring `#` inside a
/// quoted literal.
fn strip_inline_comment(spec: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in spec.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            COMMENT_MARKER if !in_quotes => return &spec[..i],
            _ => {}
        }
    }
    spec
}
