//! Low-level Video Stitcher REST client for CDN keys.
//!
//! This module provides direct access to the `cdnKeys` collection and to the
//! long-running operations that creation and deletion return.
//!
//! # API Reference
//!
//! - [CDN keys](https://cloud.google.com/video-stitcher/docs/reference/rest/v1/projects.locations.cdnKeys)
//! - [Operations](https://cloud.google.com/video-stitcher/docs/reference/rest/v1/projects.locations.operations)

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::{AuthError, TokenSource};
use crate::{HttpClientConfig, PollingPolicy};

/// The Video Stitcher API base URL.
const STITCHER_API_URL: &str = "https://videostitcher.googleapis.com/v1";

/// Page size requested when listing keys.
const LIST_PAGE_SIZE: u32 = 100;

/// Errors that may occur when talking to the Video Stitcher API.
#[derive(Debug, Error)]
pub enum StitcherError {
    /// The API returned an error response.
    #[error("API error: {0}")]
    Api(ApiError),

    /// An HTTP request error occurred.
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to serialize/deserialize.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No bearer token could be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A long-running operation finished with an error.
    #[error("operation {name} failed: {error}")]
    Operation { name: String, error: ApiError },

    /// A long-running operation was still pending after the polling budget.
    #[error("operation {name} still pending after {polls} polls")]
    OperationTimeout { name: String, polls: u32 },
}

impl StitcherError {
    /// Returns the API error carried by this error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) | Self::Operation { error: err, .. } => Some(err),
            _ => None,
        }
    }
}

/// Error payload of a failed call or a failed operation.
///
/// HTTP responses carry the HTTP status in `code` and a canonical `status`
/// string; operation errors carry a gRPC code and no `status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// HTTP status or gRPC code.
    #[serde(default)]
    pub code: i32,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Canonical status name, e.g. `NOT_FOUND`.
    #[serde(default)]
    pub status: String,
}

impl ApiError {
    /// Returns the canonical status, derived from `code` when `status` is absent.
    pub fn canonical_status(&self) -> &str {
        if !self.status.is_empty() {
            return &self.status;
        }
        match self.code {
            3 | 400 => "INVALID_ARGUMENT",
            5 | 404 => "NOT_FOUND",
            6 | 409 => "ALREADY_EXISTS",
            7 | 403 => "PERMISSION_DENIED",
            9 => "FAILED_PRECONDITION",
            16 | 401 => "UNAUTHENTICATED",
            _ => "UNKNOWN",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.canonical_status() == "NOT_FOUND"
    }

    pub fn is_already_exists(&self) -> bool {
        self.canonical_status() == "ALREADY_EXISTS"
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.canonical_status() == "INVALID_ARGUMENT"
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.canonical_status(),
            "UNAUTHENTICATED" | "PERMISSION_DENIED"
        )
    }

    /// Builds an error from a non-success HTTP response.
    fn from_response(status: StatusCode, body: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            return envelope.error;
        }
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            body.trim().to_string()
        };
        Self {
            code: i32::from(status.as_u16()),
            message,
            status: String::new(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.canonical_status(),
            self.code,
            self.message
        )
    }
}

/// Error wrapper returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

// =============================================================================
// CDN Key Types
// =============================================================================

/// A CDN key as represented on the wire.
///
/// Exactly one of the three variant fields is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnKey {
    /// Resource name; output only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Hostname the key is valid for.
    #[serde(default)]
    pub hostname: String,
    /// Cloud CDN configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cdn_key: Option<GoogleCdnKey>,
    /// Akamai configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub akamai_cdn_key: Option<AkamaiCdnKey>,
    /// Media CDN configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_cdn_key: Option<MediaCdnKey>,
}

/// Cloud CDN key fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCdnKey {
    /// Base64-encoded secret; input only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default)]
    pub key_name: String,
}

/// Akamai key fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AkamaiCdnKey {
    /// Base64-encoded token key; input only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_key: String,
}

/// Media CDN key fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCdnKey {
    /// Base64-encoded secret; input only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default)]
    pub key_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_config: Option<TokenConfig>,
}

/// Media CDN token placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    #[serde(default)]
    pub query_parameter: String,
}

/// One page of `cdnKeys.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCdnKeysResponse {
    #[serde(default)]
    pub cdn_keys: Vec<CdnKey>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub unreachable: Vec<String>,
}

/// A long-running operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<ApiError>,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
}

impl From<&crate::NewCdnKey> for CdnKey {
    fn from(key: &crate::NewCdnKey) -> Self {
        use crate::KeyMaterial;

        let mut wire = CdnKey {
            hostname: key.hostname.clone(),
            ..Default::default()
        };
        match &key.material {
            KeyMaterial::CloudCdn {
                key_name,
                private_key,
            } => {
                wire.google_cdn_key = Some(GoogleCdnKey {
                    private_key: private_key.clone(),
                    key_name: key_name.clone(),
                });
            }
            KeyMaterial::MediaCdn {
                key_name,
                private_key,
                query_parameter,
            } => {
                wire.media_cdn_key = Some(MediaCdnKey {
                    private_key: private_key.clone(),
                    key_name: key_name.clone(),
                    token_config: query_parameter.as_ref().map(|q| TokenConfig {
                        query_parameter: q.clone(),
                    }),
                });
            }
            KeyMaterial::Akamai { token_key } => {
                wire.akamai_cdn_key = Some(AkamaiCdnKey {
                    token_key: token_key.clone(),
                });
            }
        }
        wire
    }
}

/// Error returned when a wire key cannot be converted to a [`crate::CdnKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnKeyConversionError {
    /// The resource name as received.
    pub name: String,
    /// Description of what went wrong.
    pub reason: &'static str,
}

impl std::fmt::Display for CdnKeyConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to convert CDN key {:?}: {}", self.name, self.reason)
    }
}

impl std::error::Error for CdnKeyConversionError {}

impl TryFrom<CdnKey> for crate::CdnKey {
    type Error = CdnKeyConversionError;

    fn try_from(value: CdnKey) -> Result<Self, Self::Error> {
        use crate::CdnKeyDetails;

        let name =
            crate::CdnKeyName::parse(&value.name).ok_or_else(|| CdnKeyConversionError {
                name: value.name.clone(),
                reason: "malformed resource name",
            })?;

        let details = match (
            value.google_cdn_key,
            value.media_cdn_key,
            value.akamai_cdn_key,
        ) {
            (Some(google), None, None) => CdnKeyDetails::CloudCdn {
                key_name: google.key_name,
            },
            (None, Some(media), None) => CdnKeyDetails::MediaCdn {
                key_name: media.key_name,
                query_parameter: media
                    .token_config
                    .map(|t| t.query_parameter)
                    .filter(|q| !q.is_empty()),
            },
            (None, None, Some(_)) => CdnKeyDetails::Akamai,
            (None, None, None) => {
                return Err(CdnKeyConversionError {
                    name: value.name,
                    reason: "no key configuration present",
                })
            }
            _ => {
                return Err(CdnKeyConversionError {
                    name: value.name,
                    reason: "more than one key configuration present",
                })
            }
        };

        Ok(crate::CdnKey {
            name,
            hostname: value.hostname,
            details,
        })
    }
}

// =============================================================================
// API Client
// =============================================================================

/// Video Stitcher API client.
pub struct Client {
    http_client: reqwest::Client,
    token_source: Arc<dyn TokenSource>,
    base_url: String,
    polling: PollingPolicy,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client against the production endpoint.
    pub fn new(
        token_source: Arc<dyn TokenSource>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Self::with_base_url(token_source, STITCHER_API_URL, HttpClientConfig::default())
    }

    /// Creates a new client with custom HTTP configuration.
    pub fn with_config(
        token_source: Arc<dyn TokenSource>,
        config: HttpClientConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Self::with_base_url(token_source, STITCHER_API_URL, config)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// This is primarily useful for testing with mock servers.
    pub fn with_base_url(
        token_source: Arc<dyn TokenSource>,
        base_url: &str,
        config: HttpClientConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout.unwrap_or(std::time::Duration::from_secs(30)));

        if let Some(addr) = config.local_address {
            builder = builder.local_address(addr);
        }

        #[cfg(any(
            target_os = "android",
            target_os = "fuchsia",
            target_os = "linux",
            target_os = "macos",
            target_os = "ios",
            target_os = "tvos",
            target_os = "watchos",
            target_os = "illumos",
            target_os = "solaris",
        ))]
        if let Some(ref iface) = config.interface {
            builder = builder.interface(iface);
        }

        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            token_source,
            base_url: base_url.trim_end_matches('/').to_string(),
            polling: PollingPolicy::default(),
        })
    }

    /// Replaces the operation polling policy.
    pub fn with_polling_policy(mut self, polling: PollingPolicy) -> Self {
        self.polling = polling;
        self
    }

    /// Build headers for API requests.
    async fn headers(&self) -> Result<HeaderMap, StitcherError> {
        let token = self.token_source.token().await?;
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AuthError("token is not a valid header value".to_string()))?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends a request and decodes the JSON body, mapping error statuses.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StitcherError> {
        let response = request.headers(self.headers().await?).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = ApiError::from_response(status, &body);
            debug!(%status, %error, "Video Stitcher API error");
            return Err(StitcherError::Api(error));
        }

        Ok(serde_json::from_str(&body)?)
    }

    // =========================================================================
    // CDN Key APIs
    // =========================================================================

    /// Starts creation of `{parent}/cdnKeys/{cdn_key_id}`.
    pub async fn create_cdn_key(
        &self,
        parent: &str,
        cdn_key_id: &str,
        cdn_key: &CdnKey,
    ) -> Result<Operation, StitcherError> {
        debug!(parent, cdn_key_id, "POST cdnKeys");
        let request = self
            .http_client
            .post(self.url(&format!("{}/cdnKeys", parent)))
            .query(&[("cdnKeyId", cdn_key_id)])
            .json(cdn_key);
        self.execute(request).await
    }

    /// Gets a CDN key by full resource name.
    pub async fn get_cdn_key(&self, name: &str) -> Result<CdnKey, StitcherError> {
        debug!(name, "GET cdnKey");
        self.execute(self.http_client.get(self.url(name))).await
    }

    /// Fetches one page of keys under `parent`.
    pub async fn list_cdn_keys_page(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> Result<ListCdnKeysResponse, StitcherError> {
        debug!(parent, ?page_token, "GET cdnKeys");
        let mut request = self
            .http_client
            .get(self.url(&format!("{}/cdnKeys", parent)))
            .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        self.execute(request).await
    }

    /// Lists every key under `parent`, following page tokens.
    pub async fn list_cdn_keys(&self, parent: &str) -> Result<Vec<CdnKey>, StitcherError> {
        let mut all_results = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_cdn_keys_page(parent, page_token.as_deref())
                .await?;
            if !page.unreachable.is_empty() {
                warn!(parent, unreachable = ?page.unreachable, "some locations were unreachable");
            }
            all_results.extend(page.cdn_keys);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all_results)
    }

    /// Starts deletion of a CDN key.
    pub async fn delete_cdn_key(&self, name: &str) -> Result<Operation, StitcherError> {
        debug!(name, "DELETE cdnKey");
        self.execute(self.http_client.delete(self.url(name))).await
    }

    // =========================================================================
    // Operation APIs
    // =========================================================================

    /// Gets the latest state of an operation.
    pub async fn get_operation(&self, name: &str) -> Result<Operation, StitcherError> {
        self.execute(self.http_client.get(self.url(name))).await
    }

    /// Polls `operation` until it is done and returns its response payload.
    pub async fn wait_for_operation(
        &self,
        mut operation: Operation,
    ) -> Result<Option<serde_json::Value>, StitcherError> {
        let mut attempt = 0u32;

        loop {
            if operation.done {
                if let Some(error) = operation.error {
                    return Err(StitcherError::Operation {
                        name: operation.name,
                        error,
                    });
                }
                return Ok(operation.response);
            }

            if attempt >= self.polling.max_polls {
                return Err(StitcherError::OperationTimeout {
                    name: operation.name,
                    polls: attempt,
                });
            }

            let delay = self.polling.delay(attempt);
            debug!(operation = %operation.name, attempt, ?delay, "operation pending");
            tokio::time::sleep(delay).await;

            operation = self.get_operation(&operation.name).await?;
            attempt += 1;
        }
    }
}
