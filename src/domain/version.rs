use crate::error::{RelayError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Grammar accepted for release versions: exactly three dot-separated
/// non-negative integers, no leading zeros, no pre-release or build suffix.
fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)$")
            .expect("version pattern is valid")
    })
}

/// Semantic version of a published release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemVer {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string, accepting only the strict `X.Y.Z` grammar.
    ///
    /// Anything else fails with [RelayError::InvalidVersionFormat] carrying
    /// the offending input, so `"1.0.0.1"`, `"1.0.0-2"`, `"1.02.0"`,
    /// `"1.a.2"` and `"1.1"` are all rejected.
    pub fn parse(s: &str) -> Result<Self> {
        let captures = version_pattern()
            .captures(s)
            .ok_or_else(|| RelayError::invalid_version(s))?;

        // The grammar guarantees plain decimal digits; parse can only fail
        // on values exceeding u64.
        let part = |i: usize| -> Result<u64> {
            captures[i]
                .parse::<u64>()
                .map_err(|_| RelayError::invalid_version(s))
        };

        Ok(SemVer {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }

    /// Next auto-assigned version: the major component is incremented and
    /// minor/patch reset to zero.
    pub fn increment_major(&self) -> Self {
        SemVer {
            major: self.major + 1,
            minor: 0,
            patch: 0,
        }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
