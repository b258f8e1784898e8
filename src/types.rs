//! Resource names and identifiers for Video Stitcher CDN keys.
//!
//! A CDN key lives in a project/location namespace and is addressed by a
//! path-style resource name:
//!
//! ```text
//! projects/{project}/locations/{location}/cdnKeys/{key_id}
//! ```
//!
//! # Identifier Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | Key id | 1-63 chars, `[a-z]([a-z0-9-]*[a-z0-9])?` |
//! | Project | non-empty, no `/` (id or number) |
//! | Location | non-empty, no `/` |
//!
//! The service may answer with the project *number* in place of the project
//! id, so comparisons across a round trip should use [`CdnKeyName::suffix`].

use core::fmt;

/// Maximum length of a CDN key id.
pub const MAX_KEY_ID_LEN: usize = 63;

/// Collection segment of a CDN key resource name.
const COLLECTION: &str = "cdnKeys";

/// Returns `true` if `id` is a valid CDN key id.
///
/// ```
/// use cdnkeys::types::is_valid_key_id;
///
/// assert!(is_valid_key_id("cdnkey-my-test-cloud"));
/// assert!(!is_valid_key_id("Cdnkey"));
/// assert!(!is_valid_key_id("cdnkey-"));
/// ```
pub fn is_valid_key_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_KEY_ID_LEN {
        return false;
    }
    if !bytes[0].is_ascii_lowercase() {
        return false;
    }
    if bytes[bytes.len() - 1] == b'-' {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/')
}

/// The three CDN flavours a key can authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CdnKeyVariant {
    /// Cloud CDN signed URLs.
    CloudCdn,
    /// Media CDN signed tokens.
    MediaCdn,
    /// Akamai token authentication.
    Akamai,
}

impl CdnKeyVariant {
    /// All variants, in the order the test fixture creates them.
    pub const ALL: [CdnKeyVariant; 3] = [Self::CloudCdn, Self::MediaCdn, Self::Akamai];

    /// Returns the variant as a short lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CloudCdn => "cloud-cdn",
            Self::MediaCdn => "media-cdn",
            Self::Akamai => "akamai",
        }
    }
}

impl fmt::Display for CdnKeyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-qualified name of a CDN key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CdnKeyName {
    project: String,
    location: String,
    key_id: String,
}

impl CdnKeyName {
    /// Creates a name from its parts.
    ///
    /// Returns `None` if the project or location is empty or contains `/`,
    /// or if the key id is not a valid CDN key id.
    pub fn new(project: &str, location: &str, key_id: &str) -> Option<Self> {
        if !is_valid_segment(project) || !is_valid_segment(location) || !is_valid_key_id(key_id)
        {
            return None;
        }
        Some(Self {
            project: project.to_string(),
            location: location.to_string(),
            key_id: key_id.to_string(),
        })
    }

    /// Parses `projects/{p}/locations/{l}/cdnKeys/{id}`.
    ///
    /// A single leading `/` is tolerated.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.strip_prefix('/').unwrap_or(name);
        let mut parts = name.split('/');
        match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (
                Some("projects"),
                Some(project),
                Some("locations"),
                Some(location),
                Some(COLLECTION),
                Some(key_id),
                None,
            ) => Self::new(project, location, key_id),
            _ => None,
        }
    }

    /// Returns the project segment.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the location segment.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the key id.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Returns the parent collection owner, `projects/{p}/locations/{l}`.
    pub fn parent(&self) -> String {
        parent_name(&self.project, &self.location)
    }

    /// Returns the location-scoped suffix, `/locations/{l}/cdnKeys/{id}`.
    ///
    /// This is stable regardless of whether the service reports the project
    /// by id or by number.
    pub fn suffix(&self) -> String {
        format!("/locations/{}/{}/{}", self.location, COLLECTION, self.key_id)
    }
}

impl fmt::Debug for CdnKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CdnKeyName({:?})", self.to_string())
    }
}

impl fmt::Display for CdnKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/{}/{}",
            self.project, self.location, COLLECTION, self.key_id
        )
    }
}

/// Formats the parent of the CDN key collection.
pub fn parent_name(project: &str, location: &str) -> String {
    format!("projects/{}/locations/{}", project, location)
}
