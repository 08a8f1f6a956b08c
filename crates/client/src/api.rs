//! HTTP client for the remote camera and demographics service.
//!
//! Wraps the service's REST endpoints using [`reqwest`]. Every failure,
//! transport or status, comes back as an [`ApiError`]; the data layer
//! decides which of them it can recover from.

use std::time::Duration;

use async_trait::async_trait;

use camwatch_core::camera::{Camera, CameraPatch, Tag};
use camwatch_core::demographics::{
    DemographicsConfig, DemographicsConfigUpdate, NewDemographicsConfig,
};
use camwatch_core::filters::ActiveFilters;
use camwatch_core::pagination::Page;

use crate::service::{CameraListParams, CameraService, DemographicsResponse, DemographicsService};

/// HTTP client for one remote service instance.
pub struct CamwatchApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the remote service layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body
    /// decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// The service returned a non-2xx status code.
    #[error("Remote service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ApiError {
    /// True when the service answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

impl CamwatchApi {
    /// Create a client for the service at `api_url` with a per-request
    /// timeout.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build an endpoint URL from path segments. Each segment is
    /// percent-encoded, so ids containing `/`, `?` or `#` stay one segment.
    /// A trailing `""` segment yields a trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CameraService for CamwatchApi {
    async fn list_cameras(&self, params: &CameraListParams) -> Result<Page<Camera>, ApiError> {
        tracing::debug!(page = params.page, size = params.size, "GET /cameras/");
        let response = self
            .client
            .get(self.endpoint(&["cameras", ""])?)
            .query(params)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn get_camera(&self, id: &str) -> Result<Camera, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["cameras", id])?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn update_camera(&self, id: &str, patch: &CameraPatch) -> Result<Camera, ApiError> {
        let response = self
            .client
            .put(self.endpoint(&["cameras", id])?)
            .json(patch)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let response = self.client.get(self.endpoint(&["tags", ""])?).send().await?;

        Self::parse_response(response).await
    }

    async fn create_demographics_config(
        &self,
        config: &NewDemographicsConfig,
    ) -> Result<DemographicsConfig, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["demographics", "config"])?)
            .json(config)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn update_demographics_config(
        &self,
        id: &str,
        update: &DemographicsConfigUpdate,
    ) -> Result<DemographicsConfig, ApiError> {
        let response = self
            .client
            .put(self.endpoint(&["demographics", "config", id])?)
            .json(update)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[async_trait]
impl DemographicsService for CamwatchApi {
    async fn query_results(
        &self,
        filters: &ActiveFilters,
    ) -> Result<DemographicsResponse, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["demographics", "results"])?)
            .query(&filters.query_pairs())
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn api(url: &str) -> CamwatchApi {
        CamwatchApi::with_client(reqwest::Client::new(), url)
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let api = api("http://localhost:8000/");
        assert_eq!(api.api_url(), "http://localhost:8000");
        assert_eq!(
            api.endpoint(&["cameras", ""]).unwrap().as_str(),
            "http://localhost:8000/cameras/"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let api = api("http://gateway.local/camwatch/");
        assert_eq!(
            api.endpoint(&["demographics", "results"]).unwrap().as_str(),
            "http://gateway.local/camwatch/demographics/results"
        );
    }

    #[test]
    fn ids_are_percent_encoded_as_one_segment() {
        let api = api("http://localhost:8000");
        let url = api.endpoint(&["cameras", "lobby/east?x#1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/cameras/lobby%2Feast%3Fx%231");
        assert_eq!(url.path_segments().unwrap().count(), 2);
    }

    #[test]
    fn unparseable_base_url_is_reported() {
        let api = api("not a url");
        assert!(matches!(
            api.endpoint(&["tags", ""]),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn not_found_is_classified() {
        let err = ApiError::Status {
            status: 404,
            body: "missing".to_string(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Status {
            status: 503,
            body: String::new(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn status_error_message_includes_body() {
        let err = ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Remote service error (500): boom");
    }

    #[test]
    fn list_params_omit_missing_name() {
        let params = CameraListParams {
            page: 2,
            size: 10,
            camera_name: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({ "page": 2, "size": 10 }));
    }

    #[test]
    fn demographics_response_tolerates_missing_analytics() {
        let body = serde_json::json!({ "results": [] });
        let parsed: DemographicsResponse = serde_json::from_value(body).unwrap();
        assert!(parsed.results.is_empty());
        assert!(parsed.analytics.is_none());
    }

    #[tokio::test]
    async fn unreachable_service_is_request_error() {
        let api = CamwatchApi::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = api.get_camera("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
    }
}
