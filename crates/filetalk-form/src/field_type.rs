//! Field type registry.
//!
//! The closed set of field types a form line can declare, how each is
//! written in the description language, and the validation rules for its
//! parameters.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The type of a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// Single-line text, `str<width>`.
    String { width: u32 },
    /// Multi-line text, `text<width,height>`.
    Text { width: u32, height: u32 },
    /// One of a fixed list of options, `choice<a,b,c>`.
    Choice { options: Vec<String> },
    /// Checkbox, `bool`.
    Boolean,
    /// Whole number, `int<width>`.
    Integer { width: u32 },
    /// Finite decimal number, `float<width>`.
    Float { width: u32 },
    /// Arbitrary JSON value, `json<width,height>`.
    Json { width: u32, height: u32 },
    /// Date, `date`.
    Date,
    /// Time of day, `time`.
    Time,
    /// Read-only literal, `"value"`.
    Fixed { literal: String },
}

impl FieldType {
    /// Short keyword for the type (`str`, `choice`, `fixed`, ...).
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::String { .. } => "str",
            Self::Text { .. } => "text",
            Self::Choice { .. } => "choice",
            Self::Boolean => "bool",
            Self::Integer { .. } => "int",
            Self::Float { .. } => "float",
            Self::Json { .. } => "json",
            Self::Date => "date",
            Self::Time => "time",
            Self::Fixed { .. } => "fixed",
        }
    }

    /// Whether values of this type come from the user at all.
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Fixed { .. })
    }
}

/// Renders the canonical type-spec, which parses back to the same type.
impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String { width } => write!(f, "str<{width}>"),
            Self::Text { width, height } => write!(f, "text<{width},{height}>"),
            Self::Choice { options } => write!(f, "choice<{}>", options.join(",")),
            Self::Boolean => f.write_str("bool"),
            Self::Integer { width } => write!(f, "int<{width}>"),
            Self::Float { width } => write!(f, "float<{width}>"),
            Self::Json { width, height } => write!(f, "json<{width},{height}>"),
            Self::Date => f.write_str("date"),
            Self::Time => f.write_str("time"),
            Self::Fixed { literal } => {
                f.write_str("\"")?;
                for c in literal.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = TypeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type_spec(s)
    }
}

/// A malformed type-spec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeSpecError {
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("invalid parameters for {type_name}: {message}")]
    InvalidParameters { type_name: String, message: String },
}

impl TypeSpecError {
    fn invalid(type_name: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }
}

fn parameterized_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*<(.*)$").expect("type pattern is valid")
    })
}

const PARAMETERIZED: [&str; 6] = ["str", "text", "int", "float", "json", "choice"];
const BARE: [&str; 3] = ["bool", "date", "time"];

/// Parse a type-spec token such as `str<60>`, `choice<a,b>`, `bool` or `"v1"`.
///
/// Surrounding whitespace is ignored. Inline comments must already be
/// stripped by the caller.
pub fn parse_type_spec(spec: &str) -> Result<FieldType, TypeSpecError> {
    let spec = spec.trim();

    if spec.starts_with('"') {
        return parse_literal(spec).map(|literal| FieldType::Fixed { literal });
    }

    match spec {
        "bool" => return Ok(FieldType::Boolean),
        "date" => return Ok(FieldType::Date),
        "time" => return Ok(FieldType::Time),
        _ => {}
    }

    if PARAMETERIZED.contains(&spec) {
        return Err(TypeSpecError::invalid(spec, "missing <...> parameters"));
    }

    let Some(caps) = parameterized_pattern().captures(spec) else {
        return Err(TypeSpecError::UnknownType {
            name: spec.to_string(),
        });
    };
    let name = caps.get(1).map_or("", |m| m.as_str());
    let rest = caps.get(2).map_or("", |m| m.as_str());

    if BARE.contains(&name) {
        return Err(TypeSpecError::invalid(name, "takes no parameters"));
    }
    if !PARAMETERIZED.contains(&name) {
        return Err(TypeSpecError::UnknownType {
            name: name.to_string(),
        });
    }
    let Some(params) = rest.strip_suffix('>') else {
        return Err(TypeSpecError::invalid(name, "missing closing '>'"));
    };

    match name {
        "str" => Ok(FieldType::String {
            width: parse_size(name, "width", params)?,
        }),
        "int" => Ok(FieldType::Integer {
            width: parse_size(name, "width", params)?,
        }),
        "float" => Ok(FieldType::Float {
            width: parse_size(name, "width", params)?,
        }),
        "text" => {
            let (width, height) = parse_two_sizes(name, params)?;
            Ok(FieldType::Text { width, height })
        }
        "json" => {
            let (width, height) = parse_two_sizes(name, params)?;
            Ok(FieldType::Json { width, height })
        }
        _ => parse_choice(params).map(|options| FieldType::Choice { options }),
    }
}

fn parse_size(type_name: &str, what: &str, raw: &str) -> Result<u32, TypeSpecError> {
    let raw = raw.trim();
    let value: i64 = raw
        .parse()
        .map_err(|_| TypeSpecError::invalid(type_name, format!("{what} must be an integer, got '{raw}'")))?;
    if value < 1 {
        return Err(TypeSpecError::invalid(type_name, format!("{what} must be >= 1")));
    }
    u32::try_from(value)
        .map_err(|_| TypeSpecError::invalid(type_name, format!("{what} is too large")))
}

fn parse_two_sizes(type_name: &str, params: &str) -> Result<(u32, u32), TypeSpecError> {
    let parts: Vec<&str> = params.split(',').collect();
    if parts.len() != 2 {
        return Err(TypeSpecError::invalid(type_name, "expected <width,height>"));
    }
    Ok((
        parse_size(type_name, "width", parts[0])?,
        parse_size(type_name, "height", parts[1])?,
    ))
}

fn parse_choice(params: &str) -> Result<Vec<String>, TypeSpecError> {
    let mut options: Vec<String> = Vec::new();
    for item in params.split(',').map(str::trim) {
        if item.is_empty() {
            return Err(TypeSpecError::invalid("choice", "empty option"));
        }
        if options.iter().any(|o| o == item) {
            return Err(TypeSpecError::invalid(
                "choice",
                format!("duplicate option '{item}'"),
            ));
        }
        options.push(item.to_string());
    }
    Ok(options)
}

/// Unquote a `"..."` literal, resolving `\"` and `\\`.
///
/// Any other backslash sequence is kept as written.
fn parse_literal(spec: &str) -> Result<String, TypeSpecError> {
    let inner = &spec[1..];
    let mut literal = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => literal.push(escaped),
                Some(other) => {
                    literal.push('\\');
                    literal.push(other);
                }
                None => break,
            },
            '"' => {
                let trailing = chars.as_str().trim();
                if !trailing.is_empty() {
                    return Err(TypeSpecError::invalid(
                        "fixed",
                        format!("unexpected text after closing quote: '{trailing}'"),
                    ));
                }
                return Ok(literal);
            }
            _ => literal.push(c),
        }
    }

    Err(TypeSpecError::invalid("fixed", "unterminated quoted literal"))
}
