//! HTTP client for the upstream product API

use std::time::Duration;

use syncline_domain::{
    Product, ProductPatch, ProductPayload, UpstreamError, UpstreamResult, UpstreamSettings,
};
use tracing::debug;

/// Connection settings for the upstream product API
#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    /// Base URL of the upstream service, without a trailing slash
    pub base_url: String,
    /// Resource path appended to the base URL, with a leading slash
    pub resource_path: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for UpstreamClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            resource_path: "/products".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&UpstreamSettings> for UpstreamClientConfig {
    fn from(settings: &UpstreamSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            resource_path: settings.resource_path.clone(),
            request_timeout: settings.request_timeout(),
        }
    }
}

/// Thin HTTP client over the upstream product endpoints.
///
/// Performs no retries and consults no breaker; resilience lives in
/// [`UpstreamIntegration`](super::UpstreamIntegration). Every method maps
/// HTTP outcomes into the [`UpstreamError`] taxonomy: 404 becomes a client
/// rejection, any other non-success status and any transport failure
/// becomes an internal failure.
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamClientConfig,
}

impl UpstreamClient {
    /// Build a client with a connection pool and the configured timeout.
    ///
    /// # Errors
    /// Returns [`UpstreamError::Internal`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: UpstreamClientConfig) -> UpstreamResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| UpstreamError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn resource_url(&self) -> String {
        format!("{}{}", self.config.base_url, self.config.resource_path)
    }

    fn item_url(&self, product_id: &str) -> String {
        format!("{}/{product_id}", self.resource_url())
    }

    /// `GET {resource}` - list every product.
    ///
    /// An empty response body is treated as an empty list; some upstream
    /// deployments answer `200` with no body instead of `[]`.
    pub async fn get_products(&self) -> UpstreamResult<Vec<Product>> {
        let url = self.resource_url();
        debug!(%url, "GET products");
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        let body = Self::read_success_body(response).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(decode_error)
    }

    /// `GET {resource}/{id}` - fetch one product.
    pub async fn get_product(&self, product_id: &str) -> UpstreamResult<Product> {
        let url = self.item_url(product_id);
        debug!(%url, "GET product");
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        let body = Self::read_success_body(response).await?;
        serde_json::from_str(&body).map_err(decode_error)
    }

    /// `POST {resource}` - create a product, returning the persisted entity.
    pub async fn post_product(&self, payload: &ProductPayload) -> UpstreamResult<Product> {
        let url = self.resource_url();
        debug!(%url, "POST product");
        let response =
            self.http.post(&url).json(payload).send().await.map_err(transport_error)?;
        let body = Self::read_success_body(response).await?;
        serde_json::from_str(&body).map_err(decode_error)
    }

    /// `PATCH {resource}/{id}` - partially update a product.
    pub async fn patch_product(
        &self,
        patch: &ProductPatch,
        product_id: &str,
    ) -> UpstreamResult<Product> {
        let url = self.item_url(product_id);
        debug!(%url, "PATCH product");
        let response =
            self.http.patch(&url).json(patch).send().await.map_err(transport_error)?;
        let body = Self::read_success_body(response).await?;
        serde_json::from_str(&body).map_err(decode_error)
    }

    /// `DELETE {resource}/{id}` - delete a product.
    pub async fn delete_product(&self, product_id: &str) -> UpstreamResult<()> {
        let url = self.item_url(product_id);
        debug!(%url, "DELETE product");
        let response = self.http.delete(&url).send().await.map_err(transport_error)?;
        Self::read_success_body(response).await?;
        Ok(())
    }

    /// Map a response to its body text, converting non-success statuses
    /// into the error taxonomy first.
    async fn read_success_body(response: reqwest::Response) -> UpstreamResult<String> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if status.is_success() {
            return Ok(body);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            let detail = if body.trim().is_empty() { "not found".to_string() } else { body };
            return Err(UpstreamError::ClientRejected(detail));
        }
        Err(UpstreamError::internal(format!("upstream returned {status}: {body}")))
    }
}

fn transport_error(error: reqwest::Error) -> UpstreamError {
    UpstreamError::internal(format!("request failed: {error}"))
}

fn decode_error(error: serde_json::Error) -> UpstreamError {
    UpstreamError::internal(format!("failed to decode upstream response: {error}"))
}
