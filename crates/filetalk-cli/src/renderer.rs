//! Headless form renderer.
//!
//! Stands in for an interactive UI: values come from `--set name=value`
//! pairs and an optional JSON values file, and every field left unset gets
//! the default an empty widget would show.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Local;
use filetalk_form::{FieldType, FieldValue, FieldValues, FormRenderer, FormSpec};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("invalid values file {}: {source}", path.display())]
    ValuesFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Values collected for one form.
#[derive(Debug)]
pub struct RenderedForm {
    values: FieldValues,
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    /// From `--values`, lower priority.
    file_values: HashMap<String, FieldValue>,
    /// From `--set`, highest priority.
    overrides: Vec<(String, String)>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(mut self, overrides: Vec<(String, String)>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Load a JSON object of `field: value` pairs.
    pub fn with_values_file(mut self, path: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let path = path.into();
        let invalid = |source: Box<dyn std::error::Error + Send + Sync>| RenderError::ValuesFile {
            path: path.clone(),
            source,
        };
        let text = filetalk_common_fs::read_to_string(&path, 1024 * 1024).map_err(|e| invalid(e.into()))?;
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&text).map_err(|e| invalid(e.into()))?;
        self.file_values = object
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from(v)))
            .collect();
        Ok(self)
    }

    fn default_value(field_type: &FieldType) -> Option<FieldValue> {
        match field_type {
            FieldType::Boolean => Some(FieldValue::Bool(false)),
            FieldType::Choice { options } => options.first().map(|o| FieldValue::Text(o.clone())),
            FieldType::Date => Some(Local::now().format("%Y-%m-%d").to_string().into()),
            FieldType::Time => Some(Local::now().format("%H:%M:%S").to_string().into()),
            FieldType::Fixed { .. } => None,
            _ => Some(FieldValue::Text(String::new())),
        }
    }
}

impl FormRenderer for HeadlessRenderer {
    type Handle = RenderedForm;
    type Error = RenderError;

    fn render_form(&mut self, spec: &FormSpec) -> Result<RenderedForm, RenderError> {
        let known = |name: &str| spec.field(name).is_some();
        if let Some(name) = self
            .overrides
            .iter()
            .map(|(k, _)| k)
            .chain(self.file_values.keys())
            .find(|name| !known(name))
        {
            return Err(RenderError::UnknownField(name.clone()));
        }

        let mut values = FieldValues::new();
        for field in spec.fields() {
            let explicit = self
                .overrides
                .iter()
                .rev()
                .find(|(k, _)| *k == field.name)
                .map(|(_, v)| FieldValue::Text(v.clone()))
                .or_else(|| self.file_values.get(&field.name).cloned());

            let value = match explicit {
                Some(v) => Some(v),
                None => {
                    debug!(field = %field.name, "using widget default");
                    Self::default_value(&field.field_type)
                }
            };
            if let Some(v) = value {
                values.insert(field.name.clone(), v);
            }
        }
        Ok(RenderedForm { values })
    }

    fn read_values(&mut self, handle: &RenderedForm) -> Result<FieldValues, RenderError> {
        Ok(handle.values.clone())
    }
}

/// Parse a `name=value` argument.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn render(renderer: &mut HeadlessRenderer, text: &str) -> Result<FieldValues, RenderError> {
        let spec = FormSpec::parse(text).unwrap();
        let handle = renderer.render_form(&spec)?;
        renderer.read_values(&handle)
    }

    #[test]
    fn test_widget_defaults() {
        let values = render(
            &mut HeadlessRenderer::new(),
            "ok -- bool\nsev -- choice<low,high>\nd -- date\nname -- str<5>\nv -- \"1\"",
        )
        .unwrap();

        assert_eq!(values["ok"], FieldValue::Bool(false));
        assert_eq!(values["sev"], FieldValue::Text("low".into()));
        assert_eq!(values["d"].as_text().map(str::len), Some(10));
        assert_eq!(values["name"], FieldValue::Text(String::new()));
        assert!(!values.contains_key("v"));
    }

    #[test]
    fn test_set_beats_values_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "from-file", "ok": true}}"#).unwrap();

        let mut renderer = HeadlessRenderer::new()
            .with_values_file(file.path())
            .unwrap()
            .with_overrides(vec![("name".into(), "from-flag".into())]);
        let values = render(&mut renderer, "name -- str<20>\nok -- bool").unwrap();

        assert_eq!(values["name"], FieldValue::Text("from-flag".into()));
        assert_eq!(values["ok"], FieldValue::Bool(true));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut renderer =
            HeadlessRenderer::new().with_overrides(vec![("nope".into(), "x".into())]);
        assert!(matches!(
            render(&mut renderer, "a -- bool"),
            Err(RenderError::UnknownField(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(parse_key_val("a=b=c").unwrap(), ("a".into(), "b=c".into()));
        assert_eq!(parse_key_val("a=").unwrap(), ("a".into(), String::new()));
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}
