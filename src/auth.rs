//! Bearer token sources for the Video Stitcher API.
//!
//! [`ApplicationDefaultCredentials`] resolves credentials the usual way:
//!
//! 1. `GOOGLE_APPLICATION_CREDENTIALS` (service account JSON key)
//! 2. The metadata server when running on Google Cloud
//! 3. `gcloud auth application-default login` for local development
//!
//! [`StaticToken`] hands out a fixed string and is what the mock tests use.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// OAuth scope required by the Video Stitcher API.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Failure to obtain a bearer token.
#[derive(Debug, Error)]
#[error("authentication failed: {0}")]
pub struct AuthError(pub String);

/// Something that can produce a bearer token on demand.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, AuthError>;
}

/// Token source backed by Application Default Credentials.
pub struct ApplicationDefaultCredentials {
    inner: Arc<dyn gcp_auth::TokenProvider>,
}

impl ApplicationDefaultCredentials {
    /// Resolves the ambient credentials.
    pub async fn new() -> Result<Self, AuthError> {
        let inner = gcp_auth::provider().await.map_err(|e| {
            AuthError(format!(
                "failed to initialise application default credentials: {}",
                e
            ))
        })?;
        Ok(Self { inner })
    }
}

impl fmt::Debug for ApplicationDefaultCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationDefaultCredentials")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for ApplicationDefaultCredentials {
    async fn token(&self) -> Result<String, AuthError> {
        let token = self
            .inner
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| AuthError(e.to_string()))?;
        Ok(token.as_str().to_string())
    }
}

/// A fixed bearer token.
#[derive(Clone)]
pub struct StaticToken(pub String);

impl StaticToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}
