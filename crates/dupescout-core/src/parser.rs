//! Filename parsing: extracts a stable identity key from a filename.
//!
//! Pure and total — unrecognized input always yields
//! [`PatternKind::Unrecognized`] with the full filename as token, so it can
//! never merge with another file by accident.

use crate::model::{IdentityKey, PatternKind};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Canonical 8-4-4-4-12 hex GUID stem, optional `-<digits>` copy suffix.
    static ref GUID_RE: Regex = Regex::new(
        r"^([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})(-\d+)?$"
    )
    .unwrap();

    /// `IMG_<digits>` stem, optional `-<digits>` copy suffix.
    static ref IMG_RE: Regex = Regex::new(r"(?i)^(IMG_\d+)(-\d+)?$").unwrap();

    /// Generic stem with a trailing all-digit suffix after `-`, `_` or space.
    static ref NUMBERED_SUFFIX_RE: Regex = Regex::new(r"^(.*?)[ _-](\d+)$").unwrap();
}

/// One entry in the ordered pattern table: tries to extract a base token
/// from a filename stem. First matching entry wins; adding a pattern is
/// appending an entry, not touching the existing ones.
struct PatternMatcher {
    kind: PatternKind,
    extract: fn(&str) -> Option<String>,
}

static MATCHERS: &[PatternMatcher] = &[
    PatternMatcher {
        kind: PatternKind::Guid,
        extract: extract_guid,
    },
    PatternMatcher {
        kind: PatternKind::ImgPrefix,
        extract: extract_img,
    },
    PatternMatcher {
        kind: PatternKind::GenericNumbered,
        extract: extract_generic,
    },
];

/// Parse a filename into its identity key. The extension is compared
/// case-insensitively elsewhere and is never part of the token — a JPG and a
/// HEIC sharing a GUID stem are still duplicate candidates.
pub fn parse(filename: &str) -> IdentityKey {
    let stem = stem_of(filename);

    for matcher in MATCHERS {
        if let Some(base_token) = (matcher.extract)(stem) {
            return IdentityKey {
                base_token,
                kind: matcher.kind,
            };
        }
    }

    IdentityKey {
        base_token: filename.to_string(),
        kind: PatternKind::Unrecognized,
    }
}

/// Stem before the final extension dot. A leading dot (hidden file) or a
/// trailing dot is not treated as an extension separator.
fn stem_of(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem,
        _ => filename,
    }
}

fn extract_guid(stem: &str) -> Option<String> {
    GUID_RE
        .captures(stem)
        .map(|caps| caps[1].to_ascii_lowercase())
}

fn extract_img(stem: &str) -> Option<String> {
    IMG_RE
        .captures(stem)
        .map(|caps| caps[1].to_ascii_lowercase())
}

/// Conservative by intent: strips at most one trailing `-<digits>` style
/// suffix and refuses purely numeric names, biasing toward under-grouping so
/// unrelated files sharing a stem prefix stay apart.
fn extract_generic(stem: &str) -> Option<String> {
    let candidate = match NUMBERED_SUFFIX_RE.captures(stem) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(""),
        None => stem,
    };

    let normalized = normalize_token(candidate);
    if normalized.is_empty() || normalized.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(normalized)
}

/// Trim, case-fold, collapse internal whitespace runs to a single space.
fn normalize_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
