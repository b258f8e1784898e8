//! Video Stitcher CDN key provider.
//!
//! Implements [`RetrieveCdnKey`], [`CreateCdnKey`] and [`DeleteCdnKey`] on top
//! of the REST client in [`api`]. Creation and deletion return long-running
//! operations; the provider waits for them before returning.
//!
//! # Authentication
//!
//! Uses a bearer token from a [`TokenSource`]. [`StitcherProvider::from_adc`]
//! resolves Application Default Credentials, which honours
//! `GOOGLE_APPLICATION_CREDENTIALS`.
//!
//! # Example
//!
//! ```no_run
//! use cdnkeys::stitcher::StitcherProvider;
//! use cdnkeys::RetrieveCdnKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let provider = StitcherProvider::from_adc().await?;
//!
//! for key in provider.list_cdn_keys("my-project", "us-central1").await? {
//!     println!("{} ({})", key.name, key.variant());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;

use std::error::Error as StdErr;
use std::sync::Arc;

pub use api::{ApiError, CdnKeyConversionError, Client, StitcherError};

use crate::auth::{ApplicationDefaultCredentials, TokenSource};
use crate::types::parent_name;
use crate::{
    CdnKey, CdnKeyName, CreateCdnKey, CreateCdnKeyError, DeleteCdnKey, DeleteCdnKeyError,
    HttpClientConfig, NewCdnKey, PollingPolicy, RetrieveCdnKey, RetrieveCdnKeyError,
};

/// Video Stitcher CDN key provider.
#[derive(Debug, Clone)]
pub struct StitcherProvider {
    api_client: Arc<Client>,
}

impl StitcherProvider {
    /// Creates a provider against the production endpoint.
    pub fn new(
        token_source: Arc<dyn TokenSource>,
    ) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        let api_client = Client::new(token_source)?;
        Ok(Self {
            api_client: Arc::new(api_client),
        })
    }

    /// Creates a provider using Application Default Credentials.
    pub async fn from_adc() -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        let credentials = ApplicationDefaultCredentials::new().await?;
        Self::new(Arc::new(credentials))
    }

    /// Creates a provider with custom HTTP client configuration.
    pub fn with_config(
        token_source: Arc<dyn TokenSource>,
        config: HttpClientConfig,
    ) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        let api_client = Client::with_config(token_source, config)?;
        Ok(Self {
            api_client: Arc::new(api_client),
        })
    }

    /// Creates a provider with a custom API base URL.
    ///
    /// This is primarily useful for testing with mock servers. Operations are
    /// polled without delay.
    pub fn with_base_url(
        token_source: Arc<dyn TokenSource>,
        base_url: &str,
    ) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        let api_client =
            Client::with_base_url(token_source, base_url, HttpClientConfig::default())?
                .with_polling_policy(PollingPolicy::immediate(10));
        Ok(Self {
            api_client: Arc::new(api_client),
        })
    }

    /// Creates a provider from an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self {
            api_client: Arc::new(client),
        }
    }

    /// Returns the underlying REST client.
    pub fn api_client(&self) -> &Client {
        &self.api_client
    }
}

fn conversion_error(err: CdnKeyConversionError) -> StitcherError {
    StitcherError::Api(ApiError {
        code: 0,
        message: err.to_string(),
        status: String::new(),
    })
}

impl RetrieveCdnKey for StitcherProvider {
    type CustomRetrieveError = StitcherError;

    async fn get_cdn_key(
        &self,
        name: &CdnKeyName,
    ) -> Result<CdnKey, RetrieveCdnKeyError<Self::CustomRetrieveError>> {
        let key = self
            .api_client
            .get_cdn_key(&name.to_string())
            .await
            .map_err(|err| match err.api_error() {
                Some(api_err) if api_err.is_not_found() => RetrieveCdnKeyError::NotFound,
                Some(api_err) if api_err.is_unauthorized() => RetrieveCdnKeyError::Unauthorized,
                _ => RetrieveCdnKeyError::Custom(err),
            })?;

        CdnKey::try_from(key).map_err(|e| RetrieveCdnKeyError::Custom(conversion_error(e)))
    }

    async fn list_cdn_keys(
        &self,
        project: &str,
        location: &str,
    ) -> Result<Vec<CdnKey>, RetrieveCdnKeyError<Self::CustomRetrieveError>> {
        let keys = self
            .api_client
            .list_cdn_keys(&parent_name(project, location))
            .await
            .map_err(|err| match err.api_error() {
                Some(api_err) if api_err.is_not_found() => RetrieveCdnKeyError::NotFound,
                Some(api_err) if api_err.is_unauthorized() => RetrieveCdnKeyError::Unauthorized,
                _ => RetrieveCdnKeyError::Custom(err),
            })?;

        Ok(keys
            .into_iter()
            .filter_map(|key| match CdnKey::try_from(key) {
                Ok(key) => Some(key),
                Err(err) => {
                    tracing::warn!(%err, "skipping CDN key that could not be converted");
                    None
                }
            })
            .collect())
    }
}

impl CreateCdnKey for StitcherProvider {
    type CustomCreateError = StitcherError;

    async fn create_cdn_key(
        &self,
        name: &CdnKeyName,
        key: &NewCdnKey,
    ) -> Result<CdnKey, CreateCdnKeyError<Self::CustomCreateError>> {
        let map_err = |err: StitcherError| match err.api_error() {
            Some(api_err) if api_err.is_already_exists() => CreateCdnKeyError::AlreadyExists,
            Some(api_err) if api_err.is_not_found() => CreateCdnKeyError::ParentNotFound,
            Some(api_err) if api_err.is_unauthorized() => CreateCdnKeyError::Unauthorized,
            Some(api_err) if api_err.is_invalid_argument() => {
                CreateCdnKeyError::InvalidKey(api_err.message.clone())
            }
            _ => CreateCdnKeyError::Custom(err),
        };

        let operation = self
            .api_client
            .create_cdn_key(&name.parent(), name.key_id(), &api::CdnKey::from(key))
            .await
            .map_err(map_err)?;
        let response = self
            .api_client
            .wait_for_operation(operation)
            .await
            .map_err(map_err)?;

        // Some operations complete without echoing the resource.
        let created = match response {
            Some(value) => serde_json::from_value::<api::CdnKey>(value)
                .map_err(|e| CreateCdnKeyError::Custom(StitcherError::Serialization(e)))?,
            None => self
                .api_client
                .get_cdn_key(&name.to_string())
                .await
                .map_err(CreateCdnKeyError::Custom)?,
        };

        let created = CdnKey::try_from(created)
            .map_err(|e| CreateCdnKeyError::Custom(conversion_error(e)))?;
        tracing::info!(name = %created.name, variant = %created.variant(), "created CDN key");
        Ok(created)
    }
}

impl DeleteCdnKey for StitcherProvider {
    type CustomDeleteError = StitcherError;

    async fn delete_cdn_key(
        &self,
        name: &CdnKeyName,
    ) -> Result<(), DeleteCdnKeyError<Self::CustomDeleteError>> {
        let map_err = |err: StitcherError| match err.api_error() {
            Some(api_err) if api_err.is_not_found() => DeleteCdnKeyError::NotFound,
            Some(api_err) if api_err.is_unauthorized() => DeleteCdnKeyError::Unauthorized,
            _ => DeleteCdnKeyError::Custom(err),
        };

        let operation = self
            .api_client
            .delete_cdn_key(&name.to_string())
            .await
            .map_err(map_err)?;
        self.api_client
            .wait_for_operation(operation)
            .await
            .map_err(map_err)?;

        tracing::info!(%name, "deleted CDN key");
        Ok(())
    }
}
