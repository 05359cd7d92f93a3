use async_trait::async_trait;
use play_review_rater::app_id::AppId;
use play_review_rater::error::FetchError;
use play_review_rater::services::review_source::{ReviewQuery, ReviewSource};
use play_review_rater::types::AppDetails;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Reads a previously scraped app from a local JSON file:
///
/// ```json
/// { "details": { "title": "...", "appId": "com.example.app" }, "reviews": [ ... ] }
/// ```
///
/// The file is read on every fetch. Sort order is ignored; the query limit
/// truncates the review array.
pub struct DumpSource {
    path: PathBuf,
}

impl DumpSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Value, FetchError> {
        debug!(path = %self.path.display(), "Reading review dump");
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ReviewSource for DumpSource {
    async fn fetch_app_details(&self, app_id: &AppId) -> Result<AppDetails, FetchError> {
        let mut dump = self.load().await?;
        let details = AppDetails::from_value(take_field(&mut dump, "details"))?;

        match details.package_name() {
            Some(package) if package != app_id.as_str() => Err(FetchError::NotFound(format!(
                "{app_id} (dump at {} holds {package})",
                self.path.display()
            ))),
            _ => Ok(details),
        }
    }

    async fn fetch_reviews(
        &self,
        _app_id: &AppId,
        query: &ReviewQuery,
    ) -> Result<Value, FetchError> {
        let mut dump = self.load().await?;
        let mut reviews = take_field(&mut dump, "reviews");

        if let (Some(limit), Value::Array(items)) = (query.limit, &mut reviews) {
            items.truncate(limit);
        }
        Ok(reviews)
    }
}

fn take_field(dump: &mut Value, key: &str) -> Value {
    dump.get_mut(key).map(Value::take).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_dump(value: Value) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
        (dir, path)
    }

    fn app_id() -> AppId {
        AppId::parse("com.example.app").unwrap()
    }

    #[tokio::test]
    async fn test_reads_details_and_limited_reviews() {
        let (_dir, path) = write_dump(json!({
            "details": { "title": "Example", "appId": "com.example.app" },
            "reviews": [{ "score": 1 }, { "score": 2 }, { "score": 3 }]
        }));
        let source = DumpSource::new(path);

        let details = source.fetch_app_details(&app_id()).await.unwrap();
        assert_eq!(details.title(), Some("Example"));

        let query = ReviewQuery {
            limit: Some(2),
            ..Default::default()
        };
        let reviews = source.fetch_reviews(&app_id(), &query).await.unwrap();
        assert_eq!(reviews.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mismatched_package_is_not_found() {
        let (_dir, path) = write_dump(json!({
            "details": { "appId": "com.other.app" },
            "reviews": []
        }));
        let source = DumpSource::new(path);

        let err = source.fetch_app_details(&app_id()).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = DumpSource::new("/nonexistent/dump.json");
        let err = source.fetch_reviews(&app_id(), &ReviewQuery::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[tokio::test]
    async fn test_missing_reviews_key_is_passed_through() {
        let (_dir, path) = write_dump(json!({ "details": {} }));
        let source = DumpSource::new(path);

        let reviews = source.fetch_reviews(&app_id(), &ReviewQuery::default()).await.unwrap();
        assert!(reviews.is_null());
    }

    #[tokio::test]
    async fn test_non_object_dump_fails_details() {
        let (_dir, path) = write_dump(json!([1, 2, 3]));
        let source = DumpSource::new(path);

        assert!(source.fetch_app_details(&app_id()).await.is_err());
    }
}
