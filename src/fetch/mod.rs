mod basic;
mod client;
pub mod auth;

pub use basic::{BasicClient, DEFAULT_TIMEOUT};
pub use client::HttpClient;

use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Sends a GET to `url` and decodes the body as JSON.
///
/// # Errors
///
/// Non-2xx statuses become [`FetchError::Status`] carrying the body text;
/// timeouts become [`FetchError::Timeout`].
pub async fn fetch_json<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Value, FetchError> {
    let url = reqwest::Url::parse(url)
        .map_err(|e| FetchError::Other(format!("invalid URL {url}: {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%status, "Response received");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
