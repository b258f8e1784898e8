#![no_main]

use cdnkeys::types::{is_valid_key_id, MAX_KEY_ID_LEN};
use cdnkeys::CdnKeyName;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let valid = is_valid_key_id(data);

    if valid {
        assert!(!data.is_empty() && data.len() <= MAX_KEY_ID_LEN);
        assert!(data.starts_with(|c: char| c.is_ascii_lowercase()));
        assert!(!data.ends_with('-'));
    }

    // A name can be built exactly when the id is valid
    assert_eq!(CdnKeyName::new("my-project", "us-central1", data).is_some(), valid);
});
