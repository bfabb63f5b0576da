//! Employee records as stored and as written.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// A row of the employees table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Caller-supplied natural key.
    pub emp_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Required on insert, but an update without an email nulls it.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    /// Kept as the store's number so integers and decimals round-trip as sent.
    #[serde(default, deserialize_with = "deserialize_salary")]
    pub salary: Option<Number>,
    /// Assigned by the store on insert. Columns without a time zone are read
    /// as UTC.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Columns this service does not interpret (e.g. the surrogate `id`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of an insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEmployee {
    pub emp_id: String,
    pub name: Option<String>,
    pub email: String,
    pub department: Option<String>,
    pub salary: Option<Number>,
}

/// Payload of an update. Every field is written, `None` as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub salary: Option<Number>,
}

/// Accepts a JSON number, a numeric string, an empty string or null.
pub fn deserialize_salary<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_number(s.trim())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("salary must be numeric, got '{}'", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "salary must be numeric, got {}",
            other
        ))),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(n.into());
    }
    if let Ok(n) = text.parse::<u64>() {
        return Some(n.into());
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Accepts RFC 3339, the Postgres text form (`2024-03-01 10:00:00+00`), or a
/// datetime without offset, which is taken as UTC.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s))),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|t| t.and_utc())
}

/// Accepts a string or a number (rendered as text), or null.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("expected text, got {}", other))),
    }
}
