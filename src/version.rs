//! Dotted-integer version parsing and comparison.
//!
//! Release tags for the application are plain dotted integers ("1.2",
//! "1.2.0", "2.0.1.4") with an optional leading `v`. They are not
//! guaranteed to share a segment count, so comparison pads the shorter
//! version with trailing zeros: `1.2` and `1.2.0` are equal, `1.3` is
//! newer than `1.2.9`.
//!
//! Parsing never panics and parse failures never escape this module's
//! boundary in the update flow: [`is_newer`] fails closed, reporting
//! "not newer" and logging the offending string.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::error;

/// Error produced when a version string contains a non-numeric or empty
/// segment. Never fatal to the update flow; see [`is_newer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version string '{input}': segment '{segment}' is not a non-negative integer")]
pub struct VersionParseError {
    /// The full string that failed to parse.
    pub input: String,
    /// The segment that was rejected.
    pub segment: String,
}

/// A parsed dotted-integer version: an ordered list of non-negative
/// integer segments.
///
/// Ordering ignores trailing zero padding, so `Version::parse("1.2")` and
/// `Version::parse("1.2.0")` compare equal. Any two valid versions satisfy
/// exactly one of newer / older / equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    /// Parse a version string into its integer segments.
    ///
    /// A leading `v` or `V` (the GitHub tag convention) is stripped before
    /// splitting on `.`. Every segment must parse as a `u64`; anything else
    /// is a [`VersionParseError`].
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim().trim_start_matches(['v', 'V']);
        let mut segments = Vec::new();
        for segment in trimmed.split('.') {
            let value = segment.parse::<u64>().map_err(|_| VersionParseError {
                input: input.to_string(),
                segment: segment.to_string(),
            })?;
            segments.push(value);
        }
        Ok(Self { segments })
    }

    /// The raw segments, without padding.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(u64::to_string).collect();
        write!(f, "{}", rendered.join("."))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returns `true` when `latest` is strictly newer than `current`.
///
/// Fails closed: if either string does not parse, the error is logged and
/// the answer is `false`, so a malformed remote tag can never trigger an
/// install. Equal versions (after zero padding) are not "newer".
pub fn is_newer(latest: &str, current: &str) -> bool {
    match (Version::parse(latest), Version::parse(current)) {
        (Ok(latest), Ok(current)) => latest > current,
        (Err(e), _) | (_, Err(e)) => {
            error!("version comparison failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_zeros_do_not_matter() {
        assert!(!is_newer("1.2.0", "1.2"));
        assert!(!is_newer("1.2", "1.2.0"));
        let short = Version::parse("1.2").unwrap();
        let padded = Version::parse("1.2.0.0").unwrap();
        assert_eq!(short.cmp(&padded), Ordering::Equal);
    }

    #[test]
    fn segment_order_decides() {
        assert!(is_newer("1.3", "1.2.9"));
        assert!(is_newer("2.0", "1.9.9.9"));
        assert!(!is_newer("1.2.9", "1.3"));
        assert!(is_newer("1.2.10", "1.2.9"));
    }

    #[test]
    fn equal_versions_are_not_newer() {
        assert!(!is_newer("1.2.3", "1.2.3"));
        assert!(!is_newer("v1.2.3", "1.2.3"));
    }

    #[test]
    fn v_prefix_is_stripped() {
        assert!(is_newer("v1.2.0", "1.0.0"));
        assert_eq!(Version::parse("v2.1").unwrap().segments(), &[2, 1]);
    }

    #[test]
    fn trichotomy_holds_for_valid_pairs() {
        let versions = ["1.0", "1.0.0", "1.0.1", "1.2", "1.2.9", "1.3", "2.0.0", "0.9.9"];
        for a in &versions {
            for b in &versions {
                let newer = is_newer(a, b);
                let older = is_newer(b, a);
                let equal = Version::parse(a).unwrap().cmp(&Version::parse(b).unwrap())
                    == Ordering::Equal;
                let truths = [newer, older, equal].iter().filter(|t| **t).count();
                assert_eq!(truths, 1, "trichotomy violated for {a} vs {b}");
            }
        }
    }

    #[test]
    fn malformed_versions_fail_closed() {
        assert!(!is_newer("abc", "1.0.0"));
        assert!(!is_newer("2.0.0", "one.two"));
        assert!(!is_newer("1..2", "1.0"));
        assert!(!is_newer("", "1.0"));
        assert!(!is_newer("1.-2", "1.0"));
    }

    #[test]
    fn parse_reports_offending_segment() {
        let err = Version::parse("1.x.3").unwrap_err();
        assert_eq!(err.segment, "x");
        assert_eq!(err.input, "1.x.3");
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(Version::parse("v1.2.0").unwrap().to_string(), "1.2.0");
    }
}
