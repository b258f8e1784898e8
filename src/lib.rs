//! Video Stitcher CDN key management.
//!
//! This crate wraps the CDN key surface of the Video Stitcher API: creating,
//! reading, listing and deleting keys for three CDN variants (Cloud CDN,
//! Media CDN and Akamai). Operations are expressed as small traits so the
//! test fixture in [`harness`] can run against the real service or any other
//! implementation.
//!
//! # Example
//!
//! ```no_run
//! use cdnkeys::stitcher::StitcherProvider;
//! use cdnkeys::types::CdnKeyName;
//! use cdnkeys::{ensure_absent, CreateCdnKey, NewCdnKey, RetrieveCdnKey};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let provider = StitcherProvider::from_adc().await?;
//!
//! let name = CdnKeyName::new("my-project", "us-central1", "my-cloud-key").unwrap();
//! ensure_absent(&provider, &name).await?;
//!
//! let key = NewCdnKey::cloud_cdn("cdn.example.com", "my-key", "VGhpcyBpcyBhIHRlc3Qgc3RyaW5nLg==");
//! let created = provider.create_cdn_key(&name, &key).await?;
//! println!("Created new CDN key: {}", created.name);
//!
//! let fetched = provider.get_cdn_key(&name).await?;
//! assert_eq!(fetched.variant(), created.variant());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`types`]: resource names and key id rules
//! - [`auth`]: bearer token sources
//! - [`stitcher`]: REST implementation of the traits
//! - [`samples`]: thin wrappers that print a confirmation line per call
//! - [`env`]: required environment for live runs
//! - [`harness`]: setup/exercise/teardown fixture and stale key janitor

use std::error::Error as StdError;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

pub mod auth;
pub mod env;
pub mod harness;
pub mod samples;
pub mod stitcher;
pub mod types;

pub use types::{CdnKeyName, CdnKeyVariant};

/// HTTP client configuration for network binding and timeouts.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use cdnkeys::HttpClientConfig;
///
/// let config = HttpClientConfig::new()
///     .local_address("127.0.0.1".parse().unwrap())
///     .timeout(Duration::from_secs(10));
/// assert_eq!(config.timeout, Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Local IP address to bind outgoing connections to.
    pub local_address: Option<IpAddr>,
    /// Network interface to bind to (Linux, macOS and a few others).
    pub interface: Option<String>,
    /// Request timeout. Defaults to 30 seconds when unset.
    pub timeout: Option<Duration>,
}

impl HttpClientConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds outgoing connections to `addr`.
    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.local_address = Some(addr);
        self
    }

    /// Binds outgoing connections to the named interface.
    pub fn interface(mut self, iface: impl Into<String>) -> Self {
        self.interface = Some(iface.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Backoff used while waiting for a long-running operation.
///
/// Delays start at `initial_delay` and double up to `maximum_delay`. After
/// `max_polls` unsuccessful polls the wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub initial_delay: Duration,
    pub maximum_delay: Duration,
    pub max_polls: u32,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            maximum_delay: Duration::from_secs(10),
            max_polls: 60,
        }
    }
}

impl PollingPolicy {
    /// Polls back-to-back without sleeping. Intended for mock servers.
    pub fn immediate(max_polls: u32) -> Self {
        Self {
            initial_delay: Duration::ZERO,
            maximum_delay: Duration::ZERO,
            max_polls,
        }
    }

    /// Returns the delay to wait after poll number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.maximum_delay)
    }
}

/// Read-side view of a CDN key's variant.
///
/// The service never returns key material, so only non-secret fields appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdnKeyDetails {
    CloudCdn {
        key_name: String,
    },
    MediaCdn {
        key_name: String,
        query_parameter: Option<String>,
    },
    Akamai,
}

impl CdnKeyDetails {
    pub fn variant(&self) -> CdnKeyVariant {
        match self {
            Self::CloudCdn { .. } => CdnKeyVariant::CloudCdn,
            Self::MediaCdn { .. } => CdnKeyVariant::MediaCdn,
            Self::Akamai => CdnKeyVariant::Akamai,
        }
    }
}

/// A CDN key as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnKey {
    /// Fully-qualified resource name.
    pub name: CdnKeyName,
    /// Hostname the key is valid for.
    pub hostname: String,
    /// Variant-specific fields.
    pub details: CdnKeyDetails,
}

impl CdnKey {
    pub fn variant(&self) -> CdnKeyVariant {
        self.details.variant()
    }
}

/// Secret material sent when creating a key.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Cloud CDN key: base64-encoded private key plus its key name.
    CloudCdn {
        key_name: String,
        private_key: String,
    },
    /// Media CDN key: base64-encoded private key plus its key name.
    MediaCdn {
        key_name: String,
        private_key: String,
        query_parameter: Option<String>,
    },
    /// Akamai key: base64-encoded token key.
    Akamai { token_key: String },
}

impl KeyMaterial {
    pub fn variant(&self) -> CdnKeyVariant {
        match self {
            Self::CloudCdn { .. } => CdnKeyVariant::CloudCdn,
            Self::MediaCdn { .. } => CdnKeyVariant::MediaCdn,
            Self::Akamai { .. } => CdnKeyVariant::Akamai,
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CloudCdn { key_name, .. } => f
                .debug_struct("CloudCdn")
                .field("key_name", key_name)
                .field("private_key", &"<redacted>")
                .finish(),
            Self::MediaCdn {
                key_name,
                query_parameter,
                ..
            } => f
                .debug_struct("MediaCdn")
                .field("key_name", key_name)
                .field("private_key", &"<redacted>")
                .field("query_parameter", query_parameter)
                .finish(),
            Self::Akamai { .. } => f
                .debug_struct("Akamai")
                .field("token_key", &"<redacted>")
                .finish(),
        }
    }
}

/// Input for [`CreateCdnKey::create_cdn_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCdnKey {
    pub hostname: String,
    pub material: KeyMaterial,
}

impl NewCdnKey {
    /// A Cloud CDN key.
    pub fn cloud_cdn(hostname: &str, key_name: &str, private_key: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            material: KeyMaterial::CloudCdn {
                key_name: key_name.to_string(),
                private_key: private_key.to_string(),
            },
        }
    }

    /// A Media CDN key without a token query parameter.
    pub fn media_cdn(hostname: &str, key_name: &str, private_key: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            material: KeyMaterial::MediaCdn {
                key_name: key_name.to_string(),
                private_key: private_key.to_string(),
                query_parameter: None,
            },
        }
    }

    /// An Akamai key.
    pub fn akamai(hostname: &str, token_key: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            material: KeyMaterial::Akamai {
                token_key: token_key.to_string(),
            },
        }
    }

    /// Picks Media CDN when `is_media_cdn` is set, Cloud CDN otherwise.
    pub fn from_media_flag(
        hostname: &str,
        key_name: &str,
        private_key: &str,
        is_media_cdn: bool,
    ) -> Self {
        if is_media_cdn {
            Self::media_cdn(hostname, key_name, private_key)
        } else {
            Self::cloud_cdn(hostname, key_name, private_key)
        }
    }

    /// Sets the Media CDN token query parameter. No-op for other variants.
    pub fn with_query_parameter(mut self, parameter: &str) -> Self {
        if let KeyMaterial::MediaCdn {
            query_parameter, ..
        } = &mut self.material
        {
            *query_parameter = Some(parameter.to_string());
        }
        self
    }

    pub fn variant(&self) -> CdnKeyVariant {
        self.material.variant()
    }
}

/// Errors returned when reading CDN keys.
#[derive(Debug, Error)]
pub enum RetrieveCdnKeyError<T> {
    /// The key (or its parent location) does not exist.
    #[error("CDN key not found")]
    NotFound,
    /// The credentials were rejected or lack permission.
    #[error("unauthorized")]
    Unauthorized,
    /// Provider-specific error.
    #[error("{0}")]
    Custom(T),
}

/// Errors returned when creating a CDN key.
#[derive(Debug, Error)]
pub enum CreateCdnKeyError<T> {
    /// A key with the same id already exists.
    #[error("CDN key already exists")]
    AlreadyExists,
    /// The project or location does not exist.
    #[error("parent project or location not found")]
    ParentNotFound,
    /// The credentials were rejected or lack permission.
    #[error("unauthorized")]
    Unauthorized,
    /// The service rejected the key contents.
    #[error("invalid CDN key: {0}")]
    InvalidKey(String),
    /// Provider-specific error.
    #[error("{0}")]
    Custom(T),
}

/// Errors returned when deleting a CDN key.
#[derive(Debug, Error)]
pub enum DeleteCdnKeyError<T> {
    /// No key with this name exists.
    #[error("CDN key not found")]
    NotFound,
    /// The credentials were rejected or lack permission.
    #[error("unauthorized")]
    Unauthorized,
    /// Provider-specific error.
    #[error("{0}")]
    Custom(T),
}

/// Read access to CDN keys.
#[allow(async_fn_in_trait)]
pub trait RetrieveCdnKey {
    type CustomRetrieveError: StdError + Send + Sync + 'static;

    /// Fetches a single key.
    async fn get_cdn_key(
        &self,
        name: &CdnKeyName,
    ) -> Result<CdnKey, RetrieveCdnKeyError<Self::CustomRetrieveError>>;

    /// Lists every key in `projects/{project}/locations/{location}`.
    async fn list_cdn_keys(
        &self,
        project: &str,
        location: &str,
    ) -> Result<Vec<CdnKey>, RetrieveCdnKeyError<Self::CustomRetrieveError>>;
}

/// Creation of CDN keys. Not idempotent: see [`ensure_absent`].
#[allow(async_fn_in_trait)]
pub trait CreateCdnKey: RetrieveCdnKey {
    type CustomCreateError: StdError + Send + Sync + 'static;

    async fn create_cdn_key(
        &self,
        name: &CdnKeyName,
        key: &NewCdnKey,
    ) -> Result<CdnKey, CreateCdnKeyError<Self::CustomCreateError>>;
}

/// Deletion of CDN keys.
#[allow(async_fn_in_trait)]
pub trait DeleteCdnKey: RetrieveCdnKey {
    type CustomDeleteError: StdError + Send + Sync + 'static;

    async fn delete_cdn_key(
        &self,
        name: &CdnKeyName,
    ) -> Result<(), DeleteCdnKeyError<Self::CustomDeleteError>>;
}

/// Deletes `name` if it exists.
///
/// A missing key is not an error. Returns `true` if a key was deleted and
/// `false` if there was nothing to delete.
pub async fn ensure_absent<P: DeleteCdnKey>(
    provider: &P,
    name: &CdnKeyName,
) -> Result<bool, DeleteCdnKeyError<P::CustomDeleteError>> {
    match provider.delete_cdn_key(name).await {
        Ok(()) => Ok(true),
        Err(DeleteCdnKeyError::NotFound) => {
            tracing::debug!(%name, "CDN key already absent");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}
