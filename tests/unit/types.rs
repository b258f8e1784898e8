//! Unit tests for resource names and key variants.

use cdnkeys::types::{is_valid_key_id, parent_name, MAX_KEY_ID_LEN};
use cdnkeys::{CdnKeyName, CdnKeyVariant};

#[test]
fn test_literal_scenario_suffix() {
    let name = CdnKeyName::new("my-project", "us-central1", "cdnkey-my-test-cloud").unwrap();
    assert_eq!(
        name.suffix(),
        "/locations/us-central1/cdnKeys/cdnkey-my-test-cloud"
    );
    assert!(name.to_string().ends_with(&name.suffix()));
}

#[test]
fn test_suffix_survives_project_number() {
    let by_id = CdnKeyName::new("my-project", "us-central1", "cdnkey-a").unwrap();
    let by_number =
        CdnKeyName::parse("projects/123456789012/locations/us-central1/cdnKeys/cdnkey-a").unwrap();
    assert_ne!(by_id, by_number);
    assert_eq!(by_id.suffix(), by_number.suffix());
}

#[test]
fn test_parse_leading_slash() {
    let name = CdnKeyName::parse("/projects/p/locations/l/cdnKeys/k").unwrap();
    assert_eq!(name.to_string(), "projects/p/locations/l/cdnKeys/k");
}

#[test]
fn test_new_rejects_bad_parts() {
    assert!(CdnKeyName::new("", "us-central1", "k").is_none());
    assert!(CdnKeyName::new("p", "", "k").is_none());
    assert!(CdnKeyName::new("p/x", "us-central1", "k").is_none());
    assert!(CdnKeyName::new("p", "us-central1", "Key").is_none());
}

#[test]
fn test_key_id_length_limit() {
    let max = format!("a{}", "b".repeat(MAX_KEY_ID_LEN - 1));
    assert!(is_valid_key_id(&max));
    let too_long = format!("{}c", max);
    assert!(!is_valid_key_id(&too_long));
}

#[test]
fn test_key_id_character_rules() {
    assert!(is_valid_key_id("cdnkey-1"));
    assert!(!is_valid_key_id("1cdnkey"));
    assert!(!is_valid_key_id("cdnkey_1"));
    assert!(!is_valid_key_id("cdnkey-"));
    assert!(!is_valid_key_id("-cdnkey"));
}

#[test]
fn test_debug_is_compact() {
    let name = CdnKeyName::new("p", "l", "k").unwrap();
    assert_eq!(
        format!("{:?}", name),
        r#"CdnKeyName("projects/p/locations/l/cdnKeys/k")"#
    );
}

#[test]
fn test_parent_name() {
    assert_eq!(
        parent_name("my-project", "us-central1"),
        "projects/my-project/locations/us-central1"
    );
}

#[test]
fn test_variant_strings() {
    let names: Vec<String> = CdnKeyVariant::ALL.iter().map(|v| v.to_string()).collect();
    assert_eq!(names, ["cloud-cdn", "media-cdn", "akamai"]);
}
