//! Trait and types for fetching app metadata and reviews from the store.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::app_id::AppId;
use crate::error::FetchError;
use crate::types::AppDetails;

/// Order in which the store returns reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    MostRelevant,
    Newest,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::MostRelevant => "most_relevant",
            SortOrder::Newest => "newest",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "most_relevant" | "relevant" => Ok(SortOrder::MostRelevant),
            "newest" => Ok(SortOrder::Newest),
            other => Err(format!(
                "unknown sort order '{other}' (expected most-relevant or newest)"
            )),
        }
    }
}

/// Parameters for a review fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewQuery {
    /// Maximum number of reviews; `None` fetches everything the source has.
    pub limit: Option<usize>,
    pub lang: String,
    pub country: String,
    pub sort: SortOrder,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            limit: None,
            lang: "en".to_string(),
            country: "us".to_string(),
            sort: SortOrder::default(),
        }
    }
}

/// Abstraction over a store scraper.
///
/// Reviews come back as the untyped JSON batch the scraper produced; shape
/// checks happen in [`crate::normalize`]. Implementations own any retry
/// policy, the pipeline never retries.
#[async_trait::async_trait]
pub trait ReviewSource: Send + Sync {
    async fn fetch_app_details(&self, app_id: &AppId) -> Result<AppDetails, FetchError>;

    async fn fetch_reviews(&self, app_id: &AppId, query: &ReviewQuery) -> Result<Value, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("most-relevant".parse::<SortOrder>(), Ok(SortOrder::MostRelevant));
        assert_eq!("Newest".parse::<SortOrder>(), Ok(SortOrder::Newest));
        assert!("oldest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_default_query() {
        let q = ReviewQuery::default();
        assert_eq!(q.limit, None);
        assert_eq!(q.lang, "en");
        assert_eq!(q.country, "us");
        assert_eq!(q.sort, SortOrder::MostRelevant);
    }
}
