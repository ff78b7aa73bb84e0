use std::collections::{HashMap, HashSet};

use crate::buildsys::{BuildSystem, FetchedArchive};
use crate::error::{RelayError, Result};

/// In-memory build system for testing without a build service.
#[derive(Default)]
pub struct MockBuildSystem {
    builds: HashMap<String, FetchedArchive>,
    non_operator_builds: HashSet<String>,
    archive_missing_builds: HashSet<String>,
}

impl MockBuildSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a build whose manifest archive resolves successfully
    pub fn add_build(
        &mut self,
        build_id: impl Into<String>,
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) {
        self.builds.insert(
            build_id.into(),
            FetchedArchive {
                filename: filename.into(),
                bytes,
            },
        );
    }

    /// Register a build that exists but is not an operator artifact
    pub fn add_non_operator_build(&mut self, build_id: impl Into<String>) {
        self.non_operator_builds.insert(build_id.into());
    }

    /// Register an operator build whose archive is missing
    pub fn add_build_with_missing_archive(&mut self, build_id: impl Into<String>) {
        self.archive_missing_builds.insert(build_id.into());
    }
}

impl BuildSystem for MockBuildSystem {
    fn fetch_manifest_archive(&self, build_id: &str) -> Result<FetchedArchive> {
        if let Some(archive) = self.builds.get(build_id) {
            return Ok(archive.clone());
        }
        if self.non_operator_builds.contains(build_id) {
            return Err(RelayError::NotAnOperatorArtifact(format!(
                "not an operator artifact: {}",
                build_id
            )));
        }
        if self.archive_missing_builds.contains(build_id) {
            return Err(RelayError::ManifestsArchiveNotFound(format!(
                "expected archive with manifests not found in build: {}",
                build_id
            )));
        }
        Err(RelayError::BuildNotFound(format!(
            "build not found: {}",
            build_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_build_system_fetch() {
        let mut buildsys = MockBuildSystem::new();
        buildsys.add_build("etcd-operator-1-1", "manifests.zip", b"zipbytes".to_vec());

        let archive = buildsys.fetch_manifest_archive("etcd-operator-1-1").unwrap();
        assert_eq!(archive.filename, "manifests.zip");
        assert_eq!(archive.bytes, b"zipbytes");
    }

    #[test]
    fn test_mock_build_system_error_taxonomy() {
        let mut buildsys = MockBuildSystem::new();
        buildsys.add_non_operator_build("plain-image-1-1");
        buildsys.add_build_with_missing_archive("stale-build-1-1");

        assert_eq!(
            buildsys
                .fetch_manifest_archive("missing-1-1")
                .unwrap_err()
                .kind(),
            "BuildNotFound"
        );
        assert_eq!(
            buildsys
                .fetch_manifest_archive("plain-image-1-1")
                .unwrap_err()
                .kind(),
            "NotAnOperatorArtifact"
        );
        assert_eq!(
            buildsys
                .fetch_manifest_archive("stale-build-1-1")
                .unwrap_err()
                .kind(),
            "ManifestsArchiveNotFound"
        );
    }
}
