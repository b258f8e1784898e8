//! Key ids used by test runs.
//!
//! Ids look like `cdnkey-{label}` or, when stamped with the run's creation
//! time, `cdnkey-{label}-t{unix_seconds}`. The janitor relies on this shape to
//! recognise leftovers.

pub const CDN_KEY_ID_PREFIX: &str = "cdnkey-";

/// Prefix shared by every id a fixture creates. Hand-made keys such as
/// `cdnkey-prod` do not carry it.
pub const FIXTURE_KEY_ID_PREFIX: &str = "cdnkey-my-test-";

const STAMP_MARKER: &str = "-t";

/// A key id split into its label and optional creation stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedKeyId<'a> {
    pub label: &'a str,
    pub stamp: Option<i64>,
}

/// `cdnkey-{label}`
pub fn cdn_key_id(label: &str) -> String {
    format!("{}{}", CDN_KEY_ID_PREFIX, label)
}

/// `cdnkey-{label}-t{stamp}`
pub fn stamped_cdn_key_id(label: &str, stamp: i64) -> String {
    format!("{}{}{}{}", CDN_KEY_ID_PREFIX, label, STAMP_MARKER, stamp)
}

/// Splits an id carrying [`CDN_KEY_ID_PREFIX`]. Returns `None` for foreign ids.
pub fn parse_cdn_key_id(key_id: &str) -> Option<ParsedKeyId<'_>> {
    parse_with_prefix(key_id, CDN_KEY_ID_PREFIX)
}

pub(crate) fn parse_with_prefix<'a>(key_id: &'a str, prefix: &str) -> Option<ParsedKeyId<'a>> {
    let rest = key_id.strip_prefix(prefix)?;
    if rest.is_empty() {
        return None;
    }

    if let Some((label, stamp)) = rest.rsplit_once(STAMP_MARKER) {
        if !label.is_empty() && !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(stamp) = stamp.parse::<i64>() {
                return Some(ParsedKeyId {
                    label,
                    stamp: Some(stamp),
                });
            }
        }
    }

    Some(ParsedKeyId {
        label: rest,
        stamp: None,
    })
}
