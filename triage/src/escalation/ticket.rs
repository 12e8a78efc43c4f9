//! Loosely-typed ticket record consumed by the escalation engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Free-text fields searched by keyword conditions, in concatenation order.
pub const TEXT_FIELDS: &[&str] = &["description", "title", "summary", "message", "user_message"];

/// Field holding an optional list of caller-supplied keywords.
pub const KEYWORDS_FIELD: &str = "keywords";

/// A ticket: named fields with JSON values.
///
/// Only fields referenced by rule conditions matter. A missing or mistyped
/// field makes the condition fail; it never raises.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket {
    fields: BTreeMap<String, Value>,
}

impl Ticket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an arbitrary JSON value. `None` unless it is an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            fields: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    /// Set a field, builder style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Numeric view of a field. Numeric strings are accepted.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.as_str()
    }

    /// Lower-cased concatenation of the free-text fields and any keyword list.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<String> = TEXT_FIELDS
            .iter()
            .map(|field| match self.fields.get(*field) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.to_lowercase(),
                Some(other) => other.to_string().to_lowercase(),
            })
            .collect();

        if let Some(Value::Array(items)) = self.fields.get(KEYWORDS_FIELD) {
            parts.extend(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_lowercase),
            );
        }

        parts.join(" ")
    }
}
