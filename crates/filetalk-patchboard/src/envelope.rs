//! Message envelopes and form signal encoding.

use filetalk_common_core::Timestamp;
use filetalk_form::{FieldDefinition, FieldType, FieldValue, FieldValues, FormSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Reserved channel names.
pub mod channels {
    /// Incoming form descriptions pushed by other components.
    pub const TEXT: &str = "text";
    /// Component self-description.
    pub const CARD: &str = "card";
}

/// The on-disk message shape: `{"channel", "timestamp", "signal"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub channel: String,
    pub timestamp: Timestamp,
    pub signal: Value,
}

impl MessageEnvelope {
    /// Envelope stamped with the current time.
    pub fn new(channel: impl Into<String>, signal: Value) -> Self {
        Self {
            channel: channel.into(),
            timestamp: Timestamp::now(),
            signal,
        }
    }

    /// Compact JSON followed by a newline, as written to disk.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// A field value that cannot be encoded for its declared type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}': {reason}")]
pub struct ValueDefect {
    pub field: String,
    pub reason: ValueDefectReason,
}

/// Why a value was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueDefectReason {
    #[error("no value supplied")]
    Missing,

    #[error("expected text")]
    ExpectedText,

    #[error("expected true or false, got '{0}'")]
    NotABoolean(String),

    #[error("must be an integer, got '{0}'")]
    NotAnInteger(String),

    #[error("must be a number, got '{0}'")]
    NotANumber(String),

    #[error("NaN and Infinity are not allowed")]
    NotFinite,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("'{value}' is not one of: {}", options.join(", "))]
    NotAnOption { value: String, options: Vec<String> },

    #[error("must not be empty")]
    Empty,
}

/// Encode one field's value as JSON according to its declared type.
///
/// `Fixed` fields always encode their literal; any supplied value is ignored.
pub fn encode_value(
    field: &FieldDefinition,
    value: Option<&FieldValue>,
) -> Result<Value, ValueDefect> {
    let defect = |reason: ValueDefectReason| ValueDefect {
        field: field.name.clone(),
        reason,
    };

    let required = || value.ok_or_else(|| defect(ValueDefectReason::Missing));

    match &field.field_type {
        FieldType::Fixed { literal } => {
            if value.is_some() {
                debug!(field = %field.name, "ignoring value supplied for fixed field");
            }
            Ok(Value::String(literal.clone()))
        }

        FieldType::String { .. } | FieldType::Text { .. } => required()?
            .as_text()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| defect(ValueDefectReason::ExpectedText)),

        FieldType::Boolean => match required()? {
            FieldValue::Bool(b) | FieldValue::Json(Value::Bool(b)) => Ok(Value::Bool(*b)),
            other => match other.as_text().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
                Some("true") => Ok(Value::Bool(true)),
                Some("false") => Ok(Value::Bool(false)),
                _ => Err(defect(ValueDefectReason::NotABoolean(other.to_string()))),
            },
        },

        FieldType::Integer { .. } => match required()? {
            FieldValue::Json(Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Ok(Value::Number(n.clone()))
            }
            other => {
                let raw = other.as_text().unwrap_or_default().trim().to_string();
                if let Ok(i) = raw.parse::<i64>() {
                    Ok(Value::Number(i.into()))
                } else if let Ok(u) = raw.parse::<u64>() {
                    Ok(Value::Number(u.into()))
                } else {
                    Err(defect(ValueDefectReason::NotAnInteger(other.to_string())))
                }
            }
        },

        FieldType::Float { .. } => {
            let value = required()?;
            let parsed = match value {
                FieldValue::Json(Value::Number(n)) => n.as_f64(),
                other => other.as_text().and_then(|s| s.trim().parse::<f64>().ok()),
            };
            let f = parsed.ok_or_else(|| defect(ValueDefectReason::NotANumber(value.to_string())))?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| defect(ValueDefectReason::NotFinite))
        }

        FieldType::Json { .. } => match required()? {
            FieldValue::Text(s) => serde_json::from_str(s)
                .map_err(|e| defect(ValueDefectReason::InvalidJson(e.to_string()))),
            FieldValue::Bool(b) => Ok(Value::Bool(*b)),
            FieldValue::Json(v) => Ok(v.clone()),
        },

        FieldType::Choice { options } => {
            let chosen = required()?
                .as_text()
                .ok_or_else(|| defect(ValueDefectReason::ExpectedText))?;
            if options.iter().any(|o| o == chosen) {
                Ok(Value::String(chosen.to_string()))
            } else {
                Err(defect(ValueDefectReason::NotAnOption {
                    value: chosen.to_string(),
                    options: options.clone(),
                }))
            }
        }

        FieldType::Date | FieldType::Time => {
            let text = required()?
                .as_text()
                .ok_or_else(|| defect(ValueDefectReason::ExpectedText))?
                .trim();
            if text.is_empty() {
                Err(defect(ValueDefectReason::Empty))
            } else {
                Ok(Value::String(text.to_string()))
            }
        }
    }
}

/// Encode every field of `spec`, keyed by name in declaration order.
pub fn build_signal(spec: &FormSpec, values: &FieldValues) -> Result<Map<String, Value>, ValueDefect> {
    for name in values.keys() {
        if spec.field(name).is_none() {
            warn!(field = %name, "value supplied for unknown field, ignoring");
        }
    }

    let mut signal = Map::with_capacity(spec.len());
    for field in spec.fields() {
        signal.insert(field.name.clone(), encode_value(field, values.get(&field.name))?);
    }
    Ok(signal)
}

/// Build the message for a filled-in form on `channel`.
pub fn build_form_envelope(
    spec: &FormSpec,
    values: &FieldValues,
    channel: &str,
) -> Result<MessageEnvelope, ValueDefect> {
    let signal = build_signal(spec, values)?;
    debug!(channel, fields = signal.len(), "built form envelope");
    Ok(MessageEnvelope::new(channel, Value::Object(signal)))
}
