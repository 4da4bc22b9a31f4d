//! Transport to the Sailthru REST API
//!
//! [`SailthruTransport`] is the seam between the campaign client and the wire.
//! [`HttpTransport`] is the production implementation; tests substitute mocks.

use async_trait::async_trait;
use md5::{Digest, Md5};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SailthruError};

pub const DEFAULT_BASE_URL: &str = "https://api.sailthru.com";

/// Error details from a non-OK response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub code: i64,
    pub message: String,
}

/// A response from the Sailthru API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Convenience for a 200 response
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Sailthru reports failures with an `error` key, sometimes on a 200
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status) && self.body.get("error").is_none()
    }

    /// Error code and message, or `None` when the response is OK
    pub fn error(&self) -> Option<ApiErrorBody> {
        if self.is_ok() {
            return None;
        }

        let code = self.body.get("error").and_then(Value::as_i64).unwrap_or(0);
        let message = self
            .body
            .get("errormsg")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status));

        Some(ApiErrorBody { code, message })
    }

    pub fn json(&self) -> &Value {
        &self.body
    }

    pub fn into_json(self) -> Value {
        self.body
    }
}

/// The two calls the client needs from the API
#[async_trait]
pub trait SailthruTransport: Send + Sync {
    /// GET `resource` with `params` as the JSON payload
    async fn get(&self, resource: &str, params: &Value) -> Result<ApiResponse>;

    /// POST `resource` with `params` as the JSON payload
    async fn post(&self, resource: &str, params: &Value) -> Result<ApiResponse>;
}

/// Signed HTTP transport backed by reqwest
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl HttpTransport {
    /// Create a transport for the given credentials
    ///
    /// # Arguments
    /// * `base_url` - API root, normally [`DEFAULT_BASE_URL`]
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("dive-sailthru/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SailthruError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// Request fields shared by GET and POST
    fn signed_fields(&self, params: &Value) -> Result<Vec<(&'static str, String)>> {
        let payload = serde_json::to_string(params)?;
        let sig = signature(&self.api_secret, &[&self.api_key, "json", &payload]);

        Ok(vec![
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("json", payload),
            ("sig", sig),
        ])
    }

    async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                SailthruError::InvalidResponse(format!("HTTP {} with non-JSON body: {}", status, e))
            })?
        };

        Ok(ApiResponse::new(status, body))
    }
}

#[async_trait]
impl SailthruTransport for HttpTransport {
    async fn get(&self, resource: &str, params: &Value) -> Result<ApiResponse> {
        debug!("GET {} {}", resource, params);
        let fields = self.signed_fields(params)?;
        let response = self.http.get(self.url(resource)).query(&fields).send().await?;
        Self::into_api_response(response).await
    }

    async fn post(&self, resource: &str, params: &Value) -> Result<ApiResponse> {
        debug!("POST {} {}", resource, params);
        let fields = self.signed_fields(params)?;
        let response = self.http.post(self.url(resource)).form(&fields).send().await?;
        Self::into_api_response(response).await
    }
}

/// Sailthru request signature: MD5 of the secret followed by the sorted
/// request values, as lowercase hex
pub fn signature(secret: &str, values: &[&str]) -> String {
    let mut sorted: Vec<&str> = values.to_vec();
    sorted.sort_unstable();

    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    for value in sorted {
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
