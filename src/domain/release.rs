use crate::domain::SemVer;

/// The set of version strings currently published for a repository, as
/// reported by the registry.
///
/// The registry may contain release strings that predate this service or
/// were written by other tools, so entries are kept raw: version arithmetic
/// skips anything that does not parse, while deletion still sees every
/// entry verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSet {
    entries: Vec<String>,
}

impl ReleaseSet {
    /// Build a release set from raw registry entries
    pub fn new(entries: Vec<String>) -> Self {
        ReleaseSet { entries }
    }

    /// Raw entries as reported by the registry, unfiltered
    pub fn raw(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Verbatim membership check against the raw entries
    pub fn contains(&self, version: &str) -> bool {
        self.entries.iter().any(|e| e == version)
    }

    /// Entries that parse under the strict version grammar; everything
    /// else is skipped.
    pub fn semver_entries(&self) -> Vec<SemVer> {
        self.entries
            .iter()
            .filter_map(|e| SemVer::parse(e).ok())
            .collect()
    }

    /// Highest parseable version, or `None` when no entry parses
    pub fn latest_semver(&self) -> Option<SemVer> {
        self.semver_entries().into_iter().max()
    }
}

impl From<Vec<String>> for ReleaseSet {
    fn from(entries: Vec<String>) -> Self {
        ReleaseSet::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[&str]) -> ReleaseSet {
        ReleaseSet::new(entries.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_contains_is_verbatim() {
        let releases = set(&["1.0.0", "latest"]);
        assert!(releases.contains("1.0.0"));
        assert!(releases.contains("latest"));
        assert!(!releases.contains("2.0.0"));
    }

    #[test]
    fn test_latest_semver_empty() {
        assert_eq!(ReleaseSet::default().latest_semver(), None);
    }

    #[test]
    fn test_latest_semver_picks_max() {
        let releases = set(&["1.0.0", "4.3.2", "2.1.0"]);
        assert_eq!(releases.latest_semver(), Some(SemVer::new(4, 3, 2)));
    }

    #[test]
    fn test_foreign_entries_are_skipped() {
        let releases = set(&["1.0.0", "latest", "v2.0.0", "1.0"]);
        assert_eq!(releases.semver_entries(), vec![SemVer::new(1, 0, 0)]);
        assert_eq!(releases.latest_semver(), Some(SemVer::new(1, 0, 0)));
    }

    #[test]
    fn test_only_foreign_entries_yields_none() {
        let releases = set(&["latest", "stable"]);
        assert_eq!(releases.latest_semver(), None);
        // Raw view still sees everything for deletion
        assert_eq!(releases.raw().len(), 2);
    }
}
