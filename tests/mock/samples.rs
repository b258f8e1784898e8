//! Tests for the sample wrappers and their confirmation lines.

use crate::common::constants::{LOCATION, PROJECT};
use crate::common::memory::InMemoryProvider;
use crate::common::setup_mock_server;
use crate::common::stitcher::*;

use cdnkeys::harness::Transcript;
use cdnkeys::samples::{self, SampleError};
use cdnkeys::{CdnKeyName, CdnKeyVariant, DeleteCdnKeyError, RetrieveCdnKeyError};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_create_then_get_prints_resource_name() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(collection_path()))
        .and(query_param("cdnKeyId", "cdnkey-my-test-cloud"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_operation_done(Some(mock_cdn_key(
                PROJECT,
                "cdnkey-my-test-cloud",
                "cloud-cdn",
            )))),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(key_path("cdnkey-my-test-cloud")))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_cdn_key(
            PROJECT,
            "cdnkey-my-test-cloud",
            "cloud-cdn",
        )))
        .mount(&server)
        .await;

    let provider = provider(&server);
    let mut out = Transcript::new();

    samples::create_cdn_key(
        &provider,
        &mut out,
        PROJECT,
        "us-central1",
        "cdnkey-my-test-cloud",
        "cdn.example.com",
        "my-key",
        "VGhpcyBpcyBhIHRlc3Qgc3RyaW5nLg==",
        false,
    )
    .await
    .expect("Failed to create key");
    assert_eq!(
        out.contents(),
        "Created new CDN key: projects/my-project/locations/us-central1/cdnKeys/cdnkey-my-test-cloud\n"
    );
    out.reset();

    samples::get_cdn_key(
        &provider,
        &mut out,
        PROJECT,
        "us-central1",
        "cdnkey-my-test-cloud",
    )
    .await
    .expect("Failed to get key");
    assert!(out.contains("/locations/us-central1/cdnKeys/cdnkey-my-test-cloud"));
    assert!(out.contents().starts_with("CDN key: "));
}

#[tokio::test]
async fn test_media_flag_sends_media_cdn_key() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(collection_path()))
        .and(body_partial_json(serde_json::json!({
            "mediaCdnKey": { "keyName": "my-key" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_operation_done(Some(mock_cdn_key(
                PROJECT,
                "cdnkey-my-test-media",
                "media-cdn",
            )))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut out = Transcript::new();
    let key = samples::create_cdn_key(
        &provider(&server),
        &mut out,
        PROJECT,
        LOCATION,
        "cdnkey-my-test-media",
        "cdn.example.com",
        "my-key",
        "c2VjcmV0",
        true,
    )
    .await
    .expect("Failed to create key");
    assert_eq!(key.variant(), CdnKeyVariant::MediaCdn);
}

#[tokio::test]
async fn test_akamai_and_delete_lines() {
    let provider = InMemoryProvider::new();
    let mut out = Transcript::new();

    samples::create_cdn_key_akamai(
        &provider,
        &mut out,
        PROJECT,
        LOCATION,
        "cdnkey-my-test-akamai",
        "cdn.example.com",
        "VGhpcyBpcyBhIHRlc3Qgc3RyaW5nLg==",
    )
    .await
    .unwrap();
    assert!(out.contains("Created new CDN key: "));
    assert!(out.contains("/locations/us-central1/cdnKeys/cdnkey-my-test-akamai"));
    out.reset();

    let deleted =
        samples::delete_cdn_key(&provider, &mut out, PROJECT, LOCATION, "cdnkey-my-test-akamai")
            .await
            .unwrap();
    assert_eq!(
        deleted,
        CdnKeyName::new(PROJECT, LOCATION, "cdnkey-my-test-akamai").unwrap()
    );
    assert_eq!(
        out.contents(),
        "Deleted CDN key: projects/my-project/locations/us-central1/cdnKeys/cdnkey-my-test-akamai\n"
    );
}

#[tokio::test]
async fn test_delete_missing_surfaces_not_found() {
    let provider = InMemoryProvider::new();
    let mut out = Transcript::new();

    let result = samples::delete_cdn_key(&provider, &mut out, PROJECT, LOCATION, "cdnkey-x").await;
    assert!(matches!(
        result,
        Err(SampleError::Service(DeleteCdnKeyError::NotFound))
    ));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_get_missing_writes_nothing() {
    let provider = InMemoryProvider::new();
    let mut out = Transcript::new();

    let result = samples::get_cdn_key(&provider, &mut out, PROJECT, LOCATION, "cdnkey-x").await;
    let err = result.unwrap_err();
    assert!(matches!(err.service(), Some(RetrieveCdnKeyError::NotFound)));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_invalid_id_is_rejected_locally() {
    let provider = InMemoryProvider::new();
    let mut out = Transcript::new();

    let result = samples::create_cdn_key(
        &provider,
        &mut out,
        PROJECT,
        LOCATION,
        "Not_A_Valid_Id",
        "cdn.example.com",
        "my-key",
        "c2VjcmV0",
        false,
    )
    .await;
    assert!(matches!(result, Err(SampleError::InvalidName { .. })));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_list_prints_every_name() {
    let provider = InMemoryProvider::new();
    for (id, variant) in [
        ("cdnkey-a", CdnKeyVariant::CloudCdn),
        ("cdnkey-b", CdnKeyVariant::Akamai),
    ] {
        provider.insert(&CdnKeyName::new(PROJECT, LOCATION, id).unwrap(), variant);
    }
    let mut out = Transcript::new();

    let keys = samples::list_cdn_keys(&provider, &mut out, PROJECT, LOCATION)
        .await
        .unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(
        out.contents(),
        "CDN keys:\n\
         projects/my-project/locations/us-central1/cdnKeys/cdnkey-a\n\
         projects/my-project/locations/us-central1/cdnKeys/cdnkey-b\n"
    );
}
