//! Play Store package identifiers.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidAppId;

/// A validated reverse-DNS package name such as `com.example.app`.
///
/// Requires at least two dot-separated segments. Each segment starts with an
/// ASCII letter and contains only ASCII letters, digits and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn parse(value: &str) -> Result<Self, InvalidAppId> {
        let trimmed = value.trim();
        let reject = |reason| InvalidAppId {
            value: value.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(reject("package name is empty"));
        }
        if !trimmed.is_ascii() {
            return Err(reject("package name must be ASCII"));
        }

        let segments: Vec<&str> = trimmed.split('.').collect();
        if segments.len() < 2 {
            return Err(reject("package name needs at least two segments"));
        }

        for segment in segments {
            let mut chars = segment.chars();
            match chars.next() {
                None => return Err(reject("package name has an empty segment")),
                Some(c) if !c.is_ascii_alphabetic() => {
                    return Err(reject("segments must start with a letter"));
                }
                Some(_) => {}
            }
            if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(reject("segments may only contain letters, digits and '_'"));
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AppId {
    type Err = InvalidAppId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
