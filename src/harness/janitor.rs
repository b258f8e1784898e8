//! Removal of CDN keys left behind by aborted runs.
//!
//! Creation is not idempotent, so a run that died before teardown would make
//! the next run's setup fail with `AlreadyExists`. The janitor lists the
//! location and deletes every key that looks like ours and is old enough.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::naming::{parse_with_prefix, FIXTURE_KEY_ID_PREFIX};
use crate::{ensure_absent, CdnKeyName, DeleteCdnKey, RetrieveCdnKeyError};

/// Which keys count as leftovers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalePolicy {
    /// Only ids starting with this prefix are considered.
    pub prefix: String,
    /// Stamped ids younger than this are left alone.
    pub max_age: Duration,
}

impl Default for StalePolicy {
    fn default() -> Self {
        Self {
            prefix: FIXTURE_KEY_ID_PREFIX.to_string(),
            max_age: Duration::from_secs(3 * 60 * 60),
        }
    }
}

impl StalePolicy {
    pub fn new(prefix: &str, max_age: Duration) -> Self {
        Self {
            prefix: prefix.to_string(),
            max_age,
        }
    }

    /// Unstamped ids with the prefix are always stale. Stamps in the future
    /// never are.
    pub fn is_stale(&self, key_id: &str, now: DateTime<Utc>) -> bool {
        let Some(parsed) = parse_with_prefix(key_id, &self.prefix) else {
            return false;
        };
        let Some(stamp) = parsed.stamp else {
            return true;
        };
        let Some(created) = DateTime::<Utc>::from_timestamp(stamp, 0) else {
            return true;
        };

        now.signed_duration_since(created)
            .to_std()
            .map(|age| age >= self.max_age)
            .unwrap_or(false)
    }
}

/// Outcome of a janitor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JanitorReport {
    /// Keys listed in the location.
    pub examined: usize,
    /// Stale keys that were deleted.
    pub deleted: usize,
    /// Stale keys that disappeared before we got to them.
    pub already_absent: usize,
    /// Stale keys whose deletion failed.
    pub failed: usize,
}

/// Deletes every stale key in `projects/{project}/locations/{location}`.
///
/// A failing list is returned as an error. A failing delete is logged and
/// counted in [`JanitorReport::failed`]; the pass carries on.
pub async fn clean_stale_cdn_keys<P: DeleteCdnKey>(
    provider: &P,
    project: &str,
    location: &str,
    policy: &StalePolicy,
    now: DateTime<Utc>,
) -> Result<JanitorReport, RetrieveCdnKeyError<P::CustomRetrieveError>> {
    let keys = provider.list_cdn_keys(project, location).await?;
    let mut report = JanitorReport {
        examined: keys.len(),
        ..JanitorReport::default()
    };

    let stale: Vec<CdnKeyName> = keys
        .into_iter()
        .filter(|key| policy.is_stale(key.name.key_id(), now))
        .map(|key| key.name)
        .collect();

    for name in stale {
        match ensure_absent(provider, &name).await {
            Ok(true) => {
                tracing::info!(%name, "deleted stale CDN key");
                report.deleted += 1;
            }
            Ok(false) => report.already_absent += 1,
            Err(err) => {
                tracing::warn!(%name, error = %err, "failed to delete stale CDN key");
                report.failed += 1;
            }
        }
    }

    tracing::debug!(
        project,
        location,
        examined = report.examined,
        deleted = report.deleted,
        failed = report.failed,
        "janitor pass finished"
    );
    Ok(report)
}
