#![no_main]

use cdnkeys::CdnKeyName;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Some(name) = CdnKeyName::parse(data) {
        // Formatting and parsing again yields the same name
        let formatted = name.to_string();
        assert_eq!(CdnKeyName::parse(&formatted), Some(name.clone()));

        // The suffix is always the tail of the full name
        assert!(formatted.ends_with(&name.suffix()));
        assert!(data.trim_start_matches('/').len() == formatted.len());
    }
});
