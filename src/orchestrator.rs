//! Push orchestration.
//!
//! Sequences a push from source bytes to a published release:
//! obtain and validate the archive, read the current release set, resolve
//! the target version, invoke the registry push. Every step is an abort
//! point, and no registry write happens before version resolution
//! succeeds.

use serde::Serialize;
use tracing::info;

use crate::archive::ManifestArchive;
use crate::buildsys::BuildSystem;
use crate::error::{RelayError, Result};
use crate::registry::ReleaseRegistry;
use crate::resolver::resolve_version;

/// Where the archive bytes of a push come from
pub enum PushSource {
    /// Directly uploaded archive with its declared filename
    Upload { filename: String, bytes: Vec<u8> },
    /// Archive produced by a build, referenced by build identifier
    Build { build_id: String },
}

/// One push request; request-scoped, never persisted
pub struct PushRequest {
    pub organization: String,
    pub repo: String,
    /// Version to publish; `None` selects automatic version assignment
    pub requested_version: Option<String>,
    pub source: PushSource,
}

/// Outcome of a successful push
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushResult {
    pub organization: String,
    pub repo: String,
    pub version: String,
}

/// Drives the push sequence against injected collaborators.
///
/// Collaborator calls are blocking, and nothing is retried: a failed
/// registry push is reported as-is because the push tool's internal state
/// after a failure is not observable from here. Two concurrent pushes to
/// the same (organization, repo) with no requested version may read the
/// same highest version and collide on the write; no per-repository
/// serialization point exists in this layer.
pub struct PushOrchestrator<'a> {
    registry: &'a dyn ReleaseRegistry,
    build_system: &'a dyn BuildSystem,
    max_uncompressed_size: u64,
}

impl<'a> PushOrchestrator<'a> {
    pub fn new(
        registry: &'a dyn ReleaseRegistry,
        build_system: &'a dyn BuildSystem,
        max_uncompressed_size: u64,
    ) -> Self {
        PushOrchestrator {
            registry,
            build_system,
            max_uncompressed_size,
        }
    }

    /// Publish the archive described by `request` and report the resolved
    /// version.
    pub fn push(&self, request: PushRequest) -> Result<PushResult> {
        let archive = self.obtain_archive(request.source)?;

        let releases = self
            .registry
            .list_releases(&request.organization, &request.repo)?;

        let version = resolve_version(
            &releases,
            request.requested_version.as_deref(),
            &request.organization,
            &request.repo,
        )?;

        self.registry
            .push(
                &request.organization,
                &request.repo,
                archive.bytes(),
                &version.to_string(),
            )
            .map_err(|e| match e {
                // The push tool's diagnostic travels verbatim; anything
                // else is still a push failure and keeps the taxonomy
                // closed.
                RelayError::RegistryPush(_) => e,
                RelayError::Registry(diagnostic) => RelayError::RegistryPush(diagnostic),
                other => RelayError::registry_push(other.to_string()),
            })?;

        info!(
            organization = %request.organization,
            repo = %request.repo,
            version = %version,
            "published release"
        );

        Ok(PushResult {
            organization: request.organization,
            repo: request.repo,
            version: version.to_string(),
        })
    }

    /// Source bytes for the push, validated identically for both source
    /// kinds. Build-system failures pass through with their own taxonomy.
    fn obtain_archive(&self, source: PushSource) -> Result<ManifestArchive> {
        match source {
            PushSource::Upload { filename, bytes } => {
                ManifestArchive::open(&filename, bytes, self.max_uncompressed_size)
            }
            PushSource::Build { build_id } => {
                let fetched = self.build_system.fetch_manifest_archive(&build_id)?;
                ManifestArchive::open(
                    &fetched.filename,
                    fetched.bytes,
                    self.max_uncompressed_size,
                )
            }
        }
    }
}
