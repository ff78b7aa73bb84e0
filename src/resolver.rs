//! Release-version resolution.
//!
//! Decides which version a push publishes: an explicitly requested version
//! is validated and guarded against conflicts, while an omitted version is
//! auto-assigned by incrementing the major component of the highest
//! published version.

use crate::domain::{ReleaseSet, SemVer};
use crate::error::{RelayError, Result};

/// Version assigned to the first release of a repository
pub const DEFAULT_RELEASE_VERSION: SemVer = SemVer {
    major: 1,
    minor: 0,
    patch: 0,
};

/// Resolve the version to publish for a push.
///
/// With a requested version: the string must satisfy the strict grammar,
/// and its canonical form must not already exist verbatim in the release
/// set. Both checks happen before any registry write, so a conflicting or
/// malformed request never reaches the push tool.
///
/// Without a requested version: entries that do not parse are ignored, the
/// first release of an empty repository is
/// [DEFAULT_RELEASE_VERSION], and otherwise the highest published version
/// gets its major component incremented. Only the major component moves:
/// nothing here inspects the manifest contents, so no finer-grained bump
/// can be justified.
pub fn resolve_version(
    releases: &ReleaseSet,
    requested: Option<&str>,
    organization: &str,
    repo: &str,
) -> Result<SemVer> {
    match requested {
        Some(raw) => {
            let version = SemVer::parse(raw)?;
            if releases.contains(&version.to_string()) {
                return Err(RelayError::VersionAlreadyExists {
                    organization: organization.to_string(),
                    repo: repo.to_string(),
                    version: version.to_string(),
                });
            }
            Ok(version)
        }
        None => Ok(releases
            .latest_semver()
            .map(|latest| latest.increment_major())
            .unwrap_or(DEFAULT_RELEASE_VERSION)),
    }
}
