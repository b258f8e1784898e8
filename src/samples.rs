//! Thin per-operation wrappers.
//!
//! Each function builds the request from scalar inputs, performs one call
//! through a provider, writes a single confirmation line naming the resource
//! to `out`, and returns the structured result. Pass `std::io::stdout()` to
//! print, or a [`crate::harness::Transcript`] to capture.

use std::io::{self, Write};

use thiserror::Error;

use crate::{
    CdnKey, CdnKeyName, CreateCdnKey, CreateCdnKeyError, DeleteCdnKey, DeleteCdnKeyError,
    NewCdnKey, RetrieveCdnKey, RetrieveCdnKeyError,
};

/// Failure of a sample call.
#[derive(Debug, Error)]
pub enum SampleError<E> {
    /// The project, location or key id do not form a valid resource name.
    #[error("invalid CDN key name: projects/{project}/locations/{location}/cdnKeys/{key_id}")]
    InvalidName {
        project: String,
        location: String,
        key_id: String,
    },
    /// The provider call failed.
    #[error("{0}")]
    Service(E),
    /// The confirmation line could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl<E> SampleError<E> {
    /// Returns the provider error, if that is what failed.
    pub fn service(&self) -> Option<&E> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

fn resource_name<E>(
    project: &str,
    location: &str,
    key_id: &str,
) -> Result<CdnKeyName, SampleError<E>> {
    CdnKeyName::new(project, location, key_id).ok_or_else(|| SampleError::InvalidName {
        project: project.to_string(),
        location: location.to_string(),
        key_id: key_id.to_string(),
    })
}

/// Creates a Cloud CDN key, or a Media CDN key when `is_media_cdn` is set.
#[allow(clippy::too_many_arguments)]
pub async fn create_cdn_key<P: CreateCdnKey>(
    provider: &P,
    out: &mut impl Write,
    project_id: &str,
    location: &str,
    cdn_key_id: &str,
    hostname: &str,
    key_name: &str,
    private_key: &str,
    is_media_cdn: bool,
) -> Result<CdnKey, SampleError<CreateCdnKeyError<P::CustomCreateError>>> {
    let name = resource_name(project_id, location, cdn_key_id)?;
    let key = NewCdnKey::from_media_flag(hostname, key_name, private_key, is_media_cdn);
    let created = provider
        .create_cdn_key(&name, &key)
        .await
        .map_err(SampleError::Service)?;
    writeln!(out, "Created new CDN key: {}", created.name)?;
    Ok(created)
}

/// Creates an Akamai CDN key.
pub async fn create_cdn_key_akamai<P: CreateCdnKey>(
    provider: &P,
    out: &mut impl Write,
    project_id: &str,
    location: &str,
    cdn_key_id: &str,
    hostname: &str,
    token_key: &str,
) -> Result<CdnKey, SampleError<CreateCdnKeyError<P::CustomCreateError>>> {
    let name = resource_name(project_id, location, cdn_key_id)?;
    let created = provider
        .create_cdn_key(&name, &NewCdnKey::akamai(hostname, token_key))
        .await
        .map_err(SampleError::Service)?;
    writeln!(out, "Created new CDN key: {}", created.name)?;
    Ok(created)
}

/// Gets a CDN key.
pub async fn get_cdn_key<P: RetrieveCdnKey>(
    provider: &P,
    out: &mut impl Write,
    project_id: &str,
    location: &str,
    cdn_key_id: &str,
) -> Result<CdnKey, SampleError<RetrieveCdnKeyError<P::CustomRetrieveError>>> {
    let name = resource_name(project_id, location, cdn_key_id)?;
    let key = provider
        .get_cdn_key(&name)
        .await
        .map_err(SampleError::Service)?;
    writeln!(out, "CDN key: {}", key.name)?;
    Ok(key)
}

/// Deletes a CDN key. A missing key surfaces as `Service(NotFound)`.
pub async fn delete_cdn_key<P: DeleteCdnKey>(
    provider: &P,
    out: &mut impl Write,
    project_id: &str,
    location: &str,
    cdn_key_id: &str,
) -> Result<CdnKeyName, SampleError<DeleteCdnKeyError<P::CustomDeleteError>>> {
    let name = resource_name(project_id, location, cdn_key_id)?;
    provider
        .delete_cdn_key(&name)
        .await
        .map_err(SampleError::Service)?;
    writeln!(out, "Deleted CDN key: {}", name)?;
    Ok(name)
}

/// Lists the CDN keys of a location.
pub async fn list_cdn_keys<P: RetrieveCdnKey>(
    provider: &P,
    out: &mut impl Write,
    project_id: &str,
    location: &str,
) -> Result<Vec<CdnKey>, SampleError<RetrieveCdnKeyError<P::CustomRetrieveError>>> {
    let keys = provider
        .list_cdn_keys(project_id, location)
        .await
        .map_err(SampleError::Service)?;
    writeln!(out, "CDN keys:")?;
    for key in &keys {
        writeln!(out, "{}", key.name)?;
    }
    Ok(keys)
}
