//! Required process environment for live runs.
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `GOOGLE_APPLICATION_CREDENTIALS` | Yes | Path to a service account JSON key |
//! | `GOOGLE_CLOUD_PROJECT` | Yes | Project that owns the test keys |
//! | `STITCHER_TEST_LOCATION` | No | Location for the test keys (default `us-central1`) |

use std::path::PathBuf;

use thiserror::Error;

pub const CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";
pub const LOCATION_VAR: &str = "STITCHER_TEST_LOCATION";
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Missing or unusable configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("Environment variable '{0}' is required to perform these tests.")]
    Missing(&'static str),
    #[error("credentials file {0:?} named by GOOGLE_APPLICATION_CREDENTIALS does not exist")]
    CredentialsFileNotFound(PathBuf),
}

/// Reads `name` from the process environment. Unset and empty are both missing.
pub fn require_env_var(name: &'static str) -> Result<String, EnvError> {
    require_with(name, |n| std::env::var(n).ok())
}

fn require_with<F>(name: &'static str, lookup: F) -> Result<String, EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or(EnvError::Missing(name))
}

/// Validated environment for a live run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEnv {
    pub credentials_path: PathBuf,
    pub project_id: String,
    pub location: String,
}

impl TestEnv {
    /// Reads and validates the process environment.
    pub fn from_env() -> Result<Self, EnvError> {
        let env = Self::from_lookup(|name| std::env::var(name).ok())?;
        if !env.credentials_path.is_file() {
            return Err(EnvError::CredentialsFileNotFound(env.credentials_path));
        }
        Ok(env)
    }

    /// Parses the environment through `lookup` without touching the filesystem.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials_path = PathBuf::from(require_with(CREDENTIALS_VAR, &lookup)?);
        let project_id = require_with(PROJECT_VAR, &lookup)?;
        let location = lookup(LOCATION_VAR)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        tracing::debug!(%project_id, %location, "loaded test environment");
        Ok(Self {
            credentials_path,
            project_id,
            location,
        })
    }
}
