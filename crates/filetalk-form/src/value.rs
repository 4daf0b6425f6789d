//! Runtime field values and the rendering collaborator.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::FormSpec;

/// A value entered for one field.
///
/// Widgets produce text or a checkbox state; structured sources (a JSON
/// values file, another program) may hand over a JSON value directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    Json(serde_json::Value),
}

impl FieldValue {
    /// The text content, if this value is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Values keyed by field name.
pub type FieldValues = HashMap<String, FieldValue>;

/// Presents a form to a user and collects what they entered.
///
/// Implementations own all widget state; the form core only sees the
/// resulting [`FieldValues`].
pub trait FormRenderer {
    /// Handle to one rendered form.
    type Handle;
    /// Rendering failure.
    type Error: std::error::Error;

    /// Render `spec`, returning a handle to its widgets.
    fn render_form(&mut self, spec: &FormSpec) -> Result<Self::Handle, Self::Error>;

    /// Read the current widget values of a rendered form.
    fn read_values(&mut self, handle: &Self::Handle) -> Result<FieldValues, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value() {
        assert_eq!(FieldValue::from(json!(true)), FieldValue::Bool(true));
        assert_eq!(FieldValue::from(json!("hi")), FieldValue::Text("hi".into()));
        assert_eq!(FieldValue::from(json!(3)), FieldValue::Json(json!(3)));
    }

    #[test]
    fn test_as_text() {
        assert_eq!(FieldValue::from("a").as_text(), Some("a"));
        assert_eq!(FieldValue::Json(json!("b")).as_text(), Some("b"));
        assert_eq!(FieldValue::Bool(false).as_text(), None);
    }

    #[test]
    fn test_untagged_deserialize() {
        let values: HashMap<String, FieldValue> =
            serde_json::from_value(json!({"ok": true, "name": "x", "n": 4})).unwrap();
        assert_eq!(values["ok"], FieldValue::Bool(true));
        assert_eq!(values["name"], FieldValue::Text("x".into()));
        assert_eq!(values["n"], FieldValue::Json(json!(4)));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Json(json!({"a": 1})).to_string(), r#"{"a":1}"#);
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
    }
}
