//! Integration tests for the Video Stitcher CDN key API.
//!
//! These tests create and delete real CDN keys and are ignored by default.
//! To run them:
//!
//! 1. Create a `.env` file in the project root (see `.env.example`)
//!
//! 2. Run with: `cargo test -- --ignored --test-threads=1`
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `GOOGLE_APPLICATION_CREDENTIALS` | Yes | Service account JSON key with Video Stitcher Admin |
//! | `GOOGLE_CLOUD_PROJECT` | Yes | Project to create the test keys in |
//! | `STITCHER_TEST_LOCATION` | No | Location for the test keys (default `us-central1`) |

use std::sync::Arc;

use cdnkeys::auth::StaticToken;
use cdnkeys::env::TestEnv;
use cdnkeys::harness::janitor::{clean_stale_cdn_keys, StalePolicy};
use cdnkeys::harness::naming::FIXTURE_KEY_ID_PREFIX;
use cdnkeys::harness::{run_get_cycle, Fixture, RunContext};
use cdnkeys::samples;
use cdnkeys::stitcher::StitcherProvider;
use cdnkeys::{ensure_absent, CdnKeyName, RetrieveCdnKey};
use chrono::Utc;

use crate::common::init_tracing;

/// Loads `.env` and validates the environment. Panics if anything is missing.
fn test_env() -> TestEnv {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();
    init_tracing();
    TestEnv::from_env().expect("Google Cloud test environment is incomplete")
}

async fn test_provider() -> StitcherProvider {
    StitcherProvider::from_adc()
        .await
        .expect("Failed to resolve application default credentials")
}

/// The full Get scenario: clean, create three keys, read each back, delete.
#[tokio::test]
#[ignore = "requires GOOGLE_APPLICATION_CREDENTIALS and GOOGLE_CLOUD_PROJECT in .env"]
async fn test_get_cdn_key_cycle() {
    let env = test_env();
    let provider = test_provider().await;
    let ctx = RunContext::from_env(&env);

    println!(
        "Running Get cycle in projects/{}/locations/{}",
        ctx.project_id, ctx.location
    );
    run_get_cycle(&provider, ctx, &StalePolicy::default())
        .await
        .expect("Get cycle failed");
}

/// Running the cycle twice in a row leaves nothing behind.
#[tokio::test]
#[ignore = "requires GOOGLE_APPLICATION_CREDENTIALS and GOOGLE_CLOUD_PROJECT in .env"]
async fn test_two_cycles_leave_no_residue() {
    let env = test_env();
    let provider = test_provider().await;

    for round in 1..=2 {
        println!("Cycle {}", round);
        run_get_cycle(&provider, RunContext::from_env(&env), &StalePolicy::default())
            .await
            .unwrap_or_else(|e| panic!("Cycle {} failed: {}", round, e));
    }

    let remaining = provider
        .list_cdn_keys(&env.project_id, &env.location)
        .await
        .expect("Failed to list keys");
    let policy = StalePolicy::new(FIXTURE_KEY_ID_PREFIX, std::time::Duration::ZERO);
    let leftovers: Vec<_> = remaining
        .iter()
        .filter(|k| policy.is_stale(k.name.key_id(), Utc::now()))
        .collect();
    assert!(leftovers.is_empty(), "Leftover keys: {:?}", leftovers);
}

/// Literal scenario with fixed ids.
#[tokio::test]
#[ignore = "requires GOOGLE_APPLICATION_CREDENTIALS and GOOGLE_CLOUD_PROJECT in .env"]
async fn test_fixed_cloud_cdn_key_is_readable() {
    let env = test_env();
    let provider = test_provider().await;
    let ctx = RunContext::fixed(&env.project_id, &env.location);

    let mut fixture = Fixture::setup(&provider, ctx.clone(), &StalePolicy::default())
        .await
        .expect("Setup failed");

    let mut out = Vec::new();
    let result = samples::get_cdn_key(
        &provider,
        &mut out,
        &ctx.project_id,
        &ctx.location,
        &ctx.cloud_cdn_key_id,
    )
    .await;
    let teardown = fixture.teardown().await;

    result.expect("Get failed");
    teardown.expect("Teardown failed");
    let printed = String::from_utf8_lossy(&out);
    println!("{}", printed.trim_end());
    assert!(printed.contains(&format!(
        "/locations/{}/cdnKeys/cdnkey-my-test-cloud",
        ctx.location
    )));
}

/// Deleting a key twice succeeds both times.
#[tokio::test]
#[ignore = "requires GOOGLE_APPLICATION_CREDENTIALS and GOOGLE_CLOUD_PROJECT in .env"]
async fn test_delete_twice() {
    let env = test_env();
    let provider = test_provider().await;
    let name = CdnKeyName::new(
        &env.project_id,
        &env.location,
        &format!("cdnkey-delete-twice-t{}", Utc::now().timestamp()),
    )
    .unwrap();

    let first = ensure_absent(&provider, &name).await.expect("First delete failed");
    let second = ensure_absent(&provider, &name).await.expect("Second delete failed");
    assert!(!first);
    assert!(!second);
}

/// The janitor tolerates a location with nothing to clean.
#[tokio::test]
#[ignore = "requires GOOGLE_APPLICATION_CREDENTIALS and GOOGLE_CLOUD_PROJECT in .env"]
async fn test_janitor_pass() {
    let env = test_env();
    let provider = test_provider().await;

    let report = clean_stale_cdn_keys(
        &provider,
        &env.project_id,
        &env.location,
        &StalePolicy::default(),
        Utc::now(),
    )
    .await
    .expect("Janitor pass failed");
    println!("Janitor: {:?}", report);
}

/// Rejected credentials surface as an error, not a panic.
#[tokio::test]
async fn test_invalid_credentials() {
    let provider = StitcherProvider::new(Arc::new(StaticToken::new("invalid-token")))
        .expect("Client creation should succeed");

    let result = provider.list_cdn_keys("my-project", "us-central1").await;

    // Should fail with unauthorized or a transport error when offline
    assert!(result.is_err(), "Expected error with invalid credentials");
}
