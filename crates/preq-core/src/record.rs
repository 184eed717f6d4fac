//! Event records and the field accessor.
//!
//! An [`EventRecord`] is one detected problem as written to the detection
//! report: a JSON object whose shape varies from rule to rule. Everything in
//! the runbook reads records through [`field`], which never fails.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Look up `name` on `value`.
///
/// Only JSON objects have fields; every other shape, and an unknown key,
/// yields `None`.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(name),
        _ => None,
    }
}

/// Short name of a value's JSON shape, used in error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One detected reliability event.
///
/// Always wraps a JSON object. Records are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventRecord(Value);

impl EventRecord {
    /// Wrap a JSON object as a record.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(Value::Object(fields))
    }

    /// The record as a JSON value (always an object).
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Top-level field lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        field(&self.0, name)
    }

    /// Identifier of the CRE this event was raised for.
    ///
    /// Reads `cre.id`, then `cre.ID`, then the top-level `id`. Non-string
    /// values are ignored. Returns `""` when none is present.
    pub fn cre_id(&self) -> &str {
        let nested = self
            .get("cre")
            .and_then(|cre| {
                field(cre, "id")
                    .and_then(Value::as_str)
                    .or_else(|| field(cre, "ID").and_then(Value::as_str))
            });

        nested
            .or_else(|| self.get("id").and_then(Value::as_str))
            .unwrap_or("")
    }

    /// Parse a detection report: a JSON array of event records.
    pub fn parse_report(json: &str) -> Result<Vec<EventRecord>> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Array(items) => items.into_iter().map(EventRecord::try_from).collect(),
            other => Err(CoreError::NotAReport(kind_name(&other))),
        }
    }
}

impl From<Map<String, Value>> for EventRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

impl TryFrom<Value> for EventRecord {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(CoreError::NotAnObject(kind_name(&other))),
        }
    }
}

impl<'de> Deserialize<'de> for EventRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Self::new)
    }
}
