//! HTTP client for the remote origin.

use bytes::Bytes;
use std::time::Duration;

use crate::error::FetchError;
use crate::pipeline::Validator;

/// Fetches raw asset bytes from the origin.
#[derive(Debug, Clone)]
pub struct OriginFetcher {
    base_url: String,
    quality_hint: String,
    timeout: Duration,
    validator: Validator,
    client: reqwest::Client,
}

impl OriginFetcher {
    pub fn new(
        base_url: &str,
        quality_hint: &str,
        timeout: Duration,
        validator: Validator,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            quality_hint: quality_hint.to_string(),
            timeout,
            validator,
            client: reqwest::Client::new(),
        }
    }

    /// Origin URL of a resource: base URL, resource, quality hint.
    pub fn url_for(&self, resource: &str) -> String {
        let separator = if resource.starts_with('/') { "" } else { "/" };
        format!(
            "{}{separator}{resource}{}",
            self.base_url, self.quality_hint
        )
    }

    /// GET a resource and check the body looks like an image.
    pub async fn fetch(&self, resource: &str) -> Result<Bytes, FetchError> {
        let url = self.url_for(resource);
        tracing::debug!(url = %url, "Fetching from origin");

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;

        self.validator
            .validate(&body)
            .map_err(|reason| FetchError::Rejected {
                url: url.clone(),
                reason,
            })?;

        tracing::debug!(url = %url, bytes = body.len(), "Fetched from origin");
        Ok(body)
    }
}
