//! Coerces scraped review entries into [`ReviewRecord`]s.
//!
//! A single bad entry never fails the batch: unusable ratings and timestamps
//! become absent fields. Only a batch that is not a list of objects is an
//! error.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::NormalizationError;
use crate::types::{RawReview, ReviewRecord, json_type_name};

const RATING_FIELDS: &[&str] = &["score", "rating"];
const TEXT_FIELDS: &[&str] = &["content", "text"];
const TIMESTAMP_FIELDS: &[&str] = &["at", "timestamp"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Epoch values above this are read as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Splits a raw JSON batch into [`RawReview`] entries.
///
/// # Errors
///
/// Returns [`NormalizationError::MalformedBatch`] if `batch` is not an array
/// or any element is not an object.
pub fn raw_batch(batch: Value) -> Result<Vec<RawReview>, NormalizationError> {
    let items = match batch {
        Value::Array(items) => items,
        other => {
            return Err(NormalizationError::MalformedBatch {
                reason: format!("expected an array of reviews, got {}", json_type_name(&other)),
            });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(RawReview::new(fields)),
            other => Err(NormalizationError::MalformedBatch {
                reason: format!("entry {index} is {}, not an object", json_type_name(&other)),
            }),
        })
        .collect()
}

/// Normalizes every entry, preserving input order and length.
pub fn normalize(raw_reviews: &[RawReview]) -> Vec<ReviewRecord> {
    let records: Vec<ReviewRecord> = raw_reviews.iter().map(normalize_review).collect();

    let unrated = records.iter().filter(|r| r.rating.is_none()).count();
    debug!(total = records.len(), unrated, "Normalized review batch");

    records
}

/// Shape check plus [`normalize`] in one step.
pub fn normalize_batch(batch: Value) -> Result<Vec<ReviewRecord>, NormalizationError> {
    Ok(normalize(&raw_batch(batch)?))
}

pub fn normalize_review(raw: &RawReview) -> ReviewRecord {
    let text = match raw.lookup(TEXT_FIELDS) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    ReviewRecord {
        rating: raw.lookup(RATING_FIELDS).and_then(coerce_rating),
        text,
        timestamp: raw.lookup(TIMESTAMP_FIELDS).and_then(parse_timestamp),
    }
}

/// Coerces a scraped rating to a star value in 1..=5.
///
/// Integers, integral floats and strings holding either are accepted.
/// Everything else, including `4.5`, maps to `None`.
pub fn coerce_rating(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral))?,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))?
        }
        _ => return None,
    };

    (1..=5).contains(&n).then_some(n as u8)
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

/// Parses RFC 3339 strings, naive `YYYY-MM-DD HH:MM:SS` strings (as UTC) and
/// epoch seconds or milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => {
            let epoch = n.as_i64()?;
            if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(epoch)
            } else {
                DateTime::from_timestamp(epoch, 0)
            }
        }
        _ => None,
    }
}
