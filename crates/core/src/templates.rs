//! PING/POST payload templates and buyer field mappings.
//!
//! A template is a JSON document whose string leaves may reference lead
//! fields as `{{field}}` (dotted paths reach into nested objects). Field
//! mappings rename lead fields to a buyer's vocabulary before rendering.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Flat lead field map handed to templates.
pub type FieldMap = Map<String, Value>;

/// Regex pattern matching `{{ field.path }}` placeholders.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_.]*)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

/// Consumer contact fields withheld from PING payloads.
///
/// Keys are compared after lowercasing and dropping `_` and `-`, so
/// `firstName`, `first-name` and `FIRST_NAME` all match `first_name`.
pub const PII_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "full_name",
    "email",
    "email_address",
    "phone",
    "phone_number",
    "mobile_phone",
    "address",
    "street_address",
    "address_line_1",
    "address_line_2",
];

static PII_KEYS: LazyLock<Vec<String>> =
    LazyLock::new(|| PII_FIELDS.iter().map(|f| normalize_key(f)).collect());

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_pii_key(key: &str) -> bool {
    let key = normalize_key(key);
    PII_KEYS.iter().any(|k| *k == key)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A template must be absent (`null`) or a JSON object.
pub fn validate_template(template: &Value) -> Result<(), CoreError> {
    match template {
        Value::Null | Value::Object(_) => Ok(()),
        _ => Err(CoreError::Validation(
            "Template must be a JSON object".to_string(),
        )),
    }
}

/// Field mappings must be absent or an object of non-empty string values.
pub fn validate_field_mappings(mappings: &Value) -> Result<(), CoreError> {
    match mappings {
        Value::Null => Ok(()),
        Value::Object(map) => {
            for (source, target) in map {
                match target.as_str() {
                    Some(t) if !t.trim().is_empty() => {}
                    _ => {
                        return Err(CoreError::Validation(format!(
                            "Field mapping for '{source}' must be a non-empty string"
                        )))
                    }
                }
            }
            Ok(())
        }
        _ => Err(CoreError::Validation(
            "Field mappings must be a JSON object".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Mapping and rendering
// ---------------------------------------------------------------------------

/// Rename fields according to `mappings` (`{"zip_code": "zip"}`).
///
/// Unmapped fields keep their name. A mapped field is only emitted under its
/// new name.
pub fn apply_field_mappings(fields: &FieldMap, mappings: &Value) -> FieldMap {
    let Some(mappings) = mappings.as_object() else {
        return fields.clone();
    };
    fields
        .iter()
        .map(|(key, value)| {
            let name = mappings
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(key.as_str());
            (name.to_string(), value.clone())
        })
        .collect()
}

/// Drop consumer contact details from a field map, including inside
/// nested objects and arrays.
pub fn strip_pii(fields: &mut FieldMap) {
    fields.retain(|key, _| !is_pii_key(key));
    for value in fields.values_mut() {
        strip_pii_value(value);
    }
}

fn strip_pii_value(value: &mut Value) {
    match value {
        Value::Object(map) => strip_pii(map),
        Value::Array(items) => items.iter_mut().for_each(strip_pii_value),
        _ => {}
    }
}

/// Render `template` against `fields`.
///
/// A `null` template renders to the field map itself.
pub fn render_template(template: &Value, fields: &FieldMap) -> Value {
    match template {
        Value::Null => Value::Object(fields.clone()),
        other => render_value(other, fields),
    }
}

fn render_value(value: &Value, fields: &FieldMap) -> Value {
    match value {
        Value::String(s) => render_string(s, fields),
        Value::Array(items) => Value::Array(items.iter().map(|v| render_value(v, fields)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, fields)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn render_string(s: &str, fields: &FieldMap) -> Value {
    // A lone placeholder keeps the field's JSON type.
    if let Some(caps) = PLACEHOLDER_RE.captures(s) {
        if caps.get(0).map(|m| m.as_str().len()) == Some(s.len()) {
            return lookup(fields, &caps[1]).cloned().unwrap_or(Value::Null);
        }
    }

    let rendered = PLACEHOLDER_RE.replace_all(s, |caps: &regex::Captures<'_>| {
        match lookup(fields, &caps[1]) {
            Some(Value::String(v)) => v.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    });
    Value::String(rendered.into_owned())
}

fn lookup<'a>(fields: &'a FieldMap, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = fields.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// List the distinct placeholders referenced by a template, sorted.
pub fn extract_placeholders(template: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_placeholders(template, &mut out);
    out.sort();
    out.dedup();
    out
}

fn collect_placeholders(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(PLACEHOLDER_RE.captures_iter(s).map(|c| c[1].to_string())),
        Value::Array(items) => items.iter().for_each(|v| collect_placeholders(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_placeholders(v, out)),
        _ => {}
    }
}
