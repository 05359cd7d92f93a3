use crate::error::FetchError;
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// Header name and value are validated once at construction so every request
/// can carry them without a fallible step.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, FetchError> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| FetchError::Other(format!("invalid API key header name: {e}")))?;
        let mut value = HeaderValue::from_str(key)
            .map_err(|e| FetchError::Other(format!("invalid API key value: {e}")))?;
        value.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// Uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> Result<Self, FetchError> {
        Self::new(inner, "Authorization", &format!("Bearer {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    #[test]
    fn test_bearer_header() {
        let auth = ApiKey::bearer(Unused, "secret").unwrap();
        assert_eq!(auth.header_name, "authorization");
        assert_eq!(auth.value.to_str().unwrap(), "Bearer secret");
        assert!(auth.value.is_sensitive());
    }

    #[test]
    fn test_rejects_invalid_header_parts() {
        assert!(ApiKey::new(Unused, "bad header", "x").is_err());
        assert!(ApiKey::new(Unused, "X-Api-Key", "line\nbreak").is_err());
    }
}
