#![no_main]

use arbitrary::Arbitrary;
use cdnkeys::harness::janitor::StalePolicy;
use cdnkeys::harness::naming::{parse_cdn_key_id, stamped_cdn_key_id};
use chrono::{DateTime, Utc};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    key_id: &'a str,
    label: &'a str,
    stamp: u32,
    now: u32,
}

fuzz_target!(|input: Input<'_>| {
    // Parsing arbitrary ids never panics
    if let Some(parsed) = parse_cdn_key_id(input.key_id) {
        assert!(!parsed.label.is_empty());
    }

    let now = DateTime::<Utc>::from_timestamp(i64::from(input.now), 0).unwrap();
    let _ = StalePolicy::default().is_stale(input.key_id, now);

    // Stamps survive a round trip whenever the label is non-empty
    if !input.label.is_empty() {
        let id = stamped_cdn_key_id(input.label, i64::from(input.stamp));
        let parsed = parse_cdn_key_id(&id).unwrap();
        assert_eq!(parsed.stamp, Some(i64::from(input.stamp)));
    }
});
