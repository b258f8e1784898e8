//! Setup, exercise and teardown of the three fixture CDN keys.
//!
//! A run moves through `setup -> exercise -> teardown`:
//!
//! 1. [`Fixture::setup`] runs the [janitor](janitor), then deletes and
//!    recreates one key per variant.
//! 2. [`Fixture::exercise_get`] reads each key back through
//!    [`crate::samples::get_cdn_key`] and checks the printed line.
//! 3. [`Fixture::teardown`] deletes all three keys.
//!
//! [`run_get_cycle`] chains the phases and always runs teardown, including
//! when the exercise phase fails or panics.
//!
//! # Example
//!
//! ```no_run
//! use cdnkeys::env::TestEnv;
//! use cdnkeys::harness::{janitor::StalePolicy, run_get_cycle, RunContext};
//! use cdnkeys::stitcher::StitcherProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let env = TestEnv::from_env()?;
//! let provider = StitcherProvider::from_adc().await?;
//! let ctx = RunContext::from_env(&env);
//!
//! run_get_cycle(&provider, ctx, &StalePolicy::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod janitor;
pub mod naming;

use std::error::Error as StdError;
use std::io::{self, Write};
use std::panic::AssertUnwindSafe;

use chrono::Utc;
use futures::FutureExt;
use thiserror::Error;

use crate::env::TestEnv;
use crate::{ensure_absent, samples, CdnKeyName, CdnKeyVariant, CreateCdnKey, DeleteCdnKey};
use janitor::{clean_stale_cdn_keys, StalePolicy};
use naming::{cdn_key_id, stamped_cdn_key_id};

pub const HOSTNAME: &str = "cdn.example.com";
pub const KEY_NAME: &str = "my-key";
pub const CLOUD_CDN_PRIVATE_KEY: &str = "VGhpcyBpcyBhIHRlc3Qgc3RyaW5nLg==";
pub const MEDIA_CDN_PRIVATE_KEY: &str =
    "MTIzNDU2Nzg5MDEyMzQ1Njc4OTAxzg5MDEyMzQ1Njc4OTAxMjM0NTY3DkwMTIzNA";
pub const AKAMAI_TOKEN_KEY: &str = "VGhpcyBpcyBhIHRlc3Qgc3RyaW5nLg==";

pub const CLOUD_CDN_LABEL: &str = "my-test-cloud";
pub const MEDIA_CDN_LABEL: &str = "my-test-media";
pub const AKAMAI_LABEL: &str = "my-test-akamai";

type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure of a harness phase.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("setup failed: {0}")]
    Setup(#[source] BoxError),
    #[error("exercise failed: {0}")]
    Exercise(#[source] BoxError),
    #[error("expected output to contain {expected:?}, got {actual:?}")]
    Assertion { expected: String, actual: String },
    #[error("teardown failed: {0}")]
    Teardown(#[source] BoxError),
}

/// Per-run identifiers, passed explicitly to every phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub project_id: String,
    pub location: String,
    pub cloud_cdn_key_id: String,
    pub media_cdn_key_id: String,
    pub akamai_key_id: String,
}

impl RunContext {
    /// Ids stamped with `stamp` (unix seconds).
    pub fn new(project_id: &str, location: &str, stamp: i64) -> Self {
        Self::with_key_ids(
            project_id,
            location,
            [
                &stamped_cdn_key_id(CLOUD_CDN_LABEL, stamp),
                &stamped_cdn_key_id(MEDIA_CDN_LABEL, stamp),
                &stamped_cdn_key_id(AKAMAI_LABEL, stamp),
            ],
        )
    }

    /// Stamped ids for the configured project and location.
    pub fn from_env(env: &TestEnv) -> Self {
        Self::new(&env.project_id, &env.location, Utc::now().timestamp())
    }

    /// Unstamped ids, such as `cdnkey-my-test-cloud`.
    pub fn fixed(project_id: &str, location: &str) -> Self {
        Self::with_key_ids(
            project_id,
            location,
            [
                &cdn_key_id(CLOUD_CDN_LABEL),
                &cdn_key_id(MEDIA_CDN_LABEL),
                &cdn_key_id(AKAMAI_LABEL),
            ],
        )
    }

    /// Explicit ids in Cloud CDN, Media CDN, Akamai order.
    pub fn with_key_ids(project_id: &str, location: &str, key_ids: [&str; 3]) -> Self {
        let [cloud, media, akamai] = key_ids;
        Self {
            project_id: project_id.to_string(),
            location: location.to_string(),
            cloud_cdn_key_id: cloud.to_string(),
            media_cdn_key_id: media.to_string(),
            akamai_key_id: akamai.to_string(),
        }
    }

    pub fn key_ids(&self) -> [(CdnKeyVariant, &str); 3] {
        [
            (CdnKeyVariant::CloudCdn, self.cloud_cdn_key_id.as_str()),
            (CdnKeyVariant::MediaCdn, self.media_cdn_key_id.as_str()),
            (CdnKeyVariant::Akamai, self.akamai_key_id.as_str()),
        ]
    }

    /// `/locations/{location}/cdnKeys/{key_id}`
    pub fn expected_suffix(&self, key_id: &str) -> String {
        format!("/locations/{}/cdnKeys/{}", self.location, key_id)
    }

    fn key_name(&self, key_id: &str) -> Option<CdnKeyName> {
        CdnKeyName::new(&self.project_id, &self.location, key_id)
    }
}

/// In-memory sink for sample output.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    buf: Vec<u8>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Write for Transcript {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Three live fixture keys, one per variant.
#[derive(Debug)]
pub struct Fixture<'a, P> {
    provider: &'a P,
    ctx: RunContext,
    transcript: Transcript,
}

impl<'a, P> Fixture<'a, P>
where
    P: CreateCdnKey + DeleteCdnKey,
{
    /// Cleans stale keys, then creates the three fixture keys.
    ///
    /// If a creation fails, every key attempted so far, including the one
    /// that failed, is deleted again before the error is returned.
    pub async fn setup(
        provider: &'a P,
        ctx: RunContext,
        policy: &StalePolicy,
    ) -> Result<Self, HarnessError> {
        let report =
            clean_stale_cdn_keys(provider, &ctx.project_id, &ctx.location, policy, Utc::now())
                .await
                .map_err(|e| HarnessError::Setup(Box::new(e)))?;
        tracing::info!(
            project = %ctx.project_id,
            location = %ctx.location,
            deleted = report.deleted,
            "setup: stale keys cleaned"
        );

        let mut transcript = Transcript::new();
        let mut attempted = Vec::with_capacity(3);

        for (variant, key_id) in ctx.key_ids() {
            // A create can fail after the service stored the key.
            if let Some(name) = ctx.key_name(key_id) {
                attempted.push(name);
            }
            let result = create_fixture_key(provider, &mut transcript, &ctx, variant, key_id).await;
            if let Err(err) = result {
                rollback(provider, &attempted).await;
                return Err(HarnessError::Setup(err));
            }
        }

        tracing::info!(keys = attempted.len(), "setup: fixture keys created");
        transcript.reset();
        Ok(Self {
            provider,
            ctx,
            transcript,
        })
    }

    /// Reads each key back and checks the printed resource name.
    pub async fn exercise_get(&mut self) -> Result<(), HarnessError> {
        for (variant, key_id) in self.ctx.key_ids() {
            let key = samples::get_cdn_key(
                self.provider,
                &mut self.transcript,
                &self.ctx.project_id,
                &self.ctx.location,
                key_id,
            )
            .await
            .map_err(|e| HarnessError::Exercise(Box::new(e)))?;

            let expected = self.ctx.expected_suffix(key_id);
            let matched = self.transcript.contains(&expected);
            let actual = self.transcript.contents();
            self.transcript.reset();

            if !matched {
                return Err(HarnessError::Assertion { expected, actual });
            }
            if key.variant() != variant {
                return Err(HarnessError::Assertion {
                    expected: format!("{} key", variant),
                    actual: format!("{} key", key.variant()),
                });
            }
            tracing::debug!(%variant, key_id, "exercise: get verified");
        }
        Ok(())
    }

    /// Deletes all three keys, returning the first failure.
    pub async fn teardown(&mut self) -> Result<(), HarnessError> {
        let mut first_error = None;

        for (_, key_id) in self.ctx.key_ids() {
            let Some(name) = self.ctx.key_name(key_id) else {
                continue;
            };
            match ensure_absent(self.provider, &name).await {
                Ok(deleted) => tracing::debug!(%name, deleted, "teardown: key removed"),
                Err(err) => {
                    tracing::warn!(%name, error = %err, "teardown: failed to delete key");
                    first_error.get_or_insert(HarnessError::Teardown(Box::new(err)));
                }
            }
        }

        self.transcript.reset();
        tracing::info!("teardown: finished");
        first_error.map_or(Ok(()), Err)
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

async fn create_fixture_key<P>(
    provider: &P,
    out: &mut Transcript,
    ctx: &RunContext,
    variant: CdnKeyVariant,
    key_id: &str,
) -> Result<(), BoxError>
where
    P: CreateCdnKey + DeleteCdnKey,
{
    if let Some(name) = ctx.key_name(key_id) {
        ensure_absent(provider, &name).await?;
    }

    let (project, location) = (ctx.project_id.as_str(), ctx.location.as_str());
    match variant {
        CdnKeyVariant::CloudCdn => {
            samples::create_cdn_key(
                provider,
                out,
                project,
                location,
                key_id,
                HOSTNAME,
                KEY_NAME,
                CLOUD_CDN_PRIVATE_KEY,
                false,
            )
            .await?;
        }
        CdnKeyVariant::MediaCdn => {
            samples::create_cdn_key(
                provider,
                out,
                project,
                location,
                key_id,
                HOSTNAME,
                KEY_NAME,
                MEDIA_CDN_PRIVATE_KEY,
                true,
            )
            .await?;
        }
        CdnKeyVariant::Akamai => {
            samples::create_cdn_key_akamai(
                provider,
                out,
                project,
                location,
                key_id,
                HOSTNAME,
                AKAMAI_TOKEN_KEY,
            )
            .await?;
        }
    }
    Ok(())
}

async fn rollback<P: DeleteCdnKey>(provider: &P, attempted: &[CdnKeyName]) {
    for name in attempted {
        if let Err(err) = ensure_absent(provider, name).await {
            tracing::warn!(%name, error = %err, "setup rollback: failed to delete key");
        }
    }
}

/// Runs setup, exercise and teardown for the Get scenario.
///
/// Teardown runs even if exercise returns an error or panics. A panic is
/// resumed once teardown is done. An exercise error is reported in
/// preference to a teardown error.
pub async fn run_get_cycle<P>(
    provider: &P,
    ctx: RunContext,
    policy: &StalePolicy,
) -> Result<(), HarnessError>
where
    P: CreateCdnKey + DeleteCdnKey,
{
    let mut fixture = Fixture::setup(provider, ctx, policy).await?;
    let outcome = AssertUnwindSafe(fixture.exercise_get())
        .catch_unwind()
        .await;
    let teardown = fixture.teardown().await;

    match outcome {
        Ok(Ok(())) => teardown,
        Ok(Err(err)) => {
            if let Err(teardown_err) = teardown {
                tracing::warn!(error = %teardown_err, "teardown also failed");
            }
            Err(err)
        }
        Err(panic) => {
            if let Err(teardown_err) = teardown {
                tracing::warn!(error = %teardown_err, "teardown failed after panic");
            }
            std::panic::resume_unwind(panic)
        }
    }
}
