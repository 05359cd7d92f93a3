use async_trait::async_trait;
use play_review_rater::app_id::AppId;
use play_review_rater::error::FetchError;
use play_review_rater::fetch::{HttpClient, fetch_json};
use play_review_rater::services::review_source::{ReviewQuery, ReviewSource};
use play_review_rater::types::AppDetails;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

/// Client for a Play Store scraper exposed as a JSON HTTP service.
///
/// Endpoints:
/// - `GET {base}/apps/{app_id}?lang=..&country=..` returns the details object
/// - `GET {base}/apps/{app_id}/reviews?lang=..&country=..&sort=..[&count=N]`
///   returns the review array
pub struct ScraperClient<C> {
    base_url: String,
    http: C,
    lang: String,
    country: String,
}

impl<C> ScraperClient<C> {
    pub fn new(base_url: &str, http: C) -> Self {
        let defaults = ReviewQuery::default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            lang: defaults.lang,
            country: defaults.country,
        }
    }

    /// Locale used for the app details request.
    pub fn with_locale(mut self, lang: &str, country: &str) -> Self {
        self.lang = lang.to_string();
        self.country = country.to_string();
        self
    }

    fn details_url(&self, app_id: &AppId) -> Result<Url, FetchError> {
        let params = [("lang", self.lang.as_str()), ("country", self.country.as_str())];
        self.endpoint(&format!("apps/{app_id}"), &params)
    }

    fn reviews_url(&self, app_id: &AppId, query: &ReviewQuery) -> Result<Url, FetchError> {
        let count = query.limit.map(|n| n.to_string());
        let mut params = vec![
            ("lang", query.lang.as_str()),
            ("country", query.country.as_str()),
            ("sort", query.sort.as_str()),
        ];
        if let Some(count) = count.as_deref() {
            params.push(("count", count));
        }
        self.endpoint(&format!("apps/{app_id}/reviews"), &params)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        Url::parse_with_params(&format!("{}/{}", self.base_url, path), params)
            .map_err(|e| FetchError::Other(format!("invalid scraper URL '{}': {e}", self.base_url)))
    }
}

#[async_trait]
impl<C: HttpClient> ReviewSource for ScraperClient<C> {
    async fn fetch_app_details(&self, app_id: &AppId) -> Result<AppDetails, FetchError> {
        let url = self.details_url(app_id)?;
        debug!(%url, "Fetching app details");

        let value = fetch_json(&self.http, url.as_str())
            .await
            .map_err(|e| not_found_as(e, app_id))?;
        AppDetails::from_value(value)
    }

    async fn fetch_reviews(
        &self,
        app_id: &AppId,
        query: &ReviewQuery,
    ) -> Result<Value, FetchError> {
        let url = self.reviews_url(app_id, query)?;
        debug!(%url, "Fetching reviews");

        fetch_json(&self.http, url.as_str())
            .await
            .map_err(|e| not_found_as(e, app_id))
    }
}

fn not_found_as(err: FetchError, app_id: &AppId) -> FetchError {
    match err {
        FetchError::Status { status: 404, .. } => FetchError::NotFound(app_id.to_string()),
        other => other,
    }
}
