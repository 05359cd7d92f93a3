//! Data types shared by the review pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::normalize::parse_timestamp;

/// One untyped review entry as handed over by a fetch collaborator.
///
/// Only optional field lookups are offered; nothing about its shape is
/// trusted until [`crate::normalize`] coerces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReview(Map<String, Value>);

impl RawReview {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the first non-null value among `aliases`.
    pub fn lookup(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !value.is_null())
    }
}

impl From<Map<String, Value>> for RawReview {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A normalized review.
///
/// `rating` is absent whenever the scraped value was missing, non-numeric or
/// outside 1..=5. Such records stay in the exported table but are left out of
/// rating statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub rating: Option<u8>,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// App metadata, kept as the verbatim field map returned by the scraper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppDetails(Map<String, Value>);

impl AppDetails {
    /// Wraps a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(FetchError::Other(format!(
                "app details must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    pub fn package_name(&self) -> Option<&str> {
        ["appId", "packageName"]
            .iter()
            .find_map(|key| self.get(key).and_then(Value::as_str))
    }

    pub fn average_rating(&self) -> Option<f64> {
        ["score", "averageRating"]
            .iter()
            .find_map(|key| self.get(key).and_then(Value::as_f64))
    }

    /// Install count label; the scraper reports either `"1,000,000+"` or a number.
    pub fn installs(&self) -> Option<String> {
        match self.get("installs")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn review_count(&self) -> Option<u64> {
        self.get("reviews").and_then(Value::as_u64)
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.get("updated").and_then(parse_timestamp)
    }
}

impl From<Map<String, Value>> for AppDetails {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
