//! Build-system abstraction.
//!
//! Pushes may reference a build identifier instead of uploading an archive
//! directly; the build system resolves that identifier to the operator
//! manifest archive produced by the build. Failures keep the collaborator's
//! own taxonomy: [crate::error::RelayError::BuildNotFound],
//! [crate::error::RelayError::NotAnOperatorArtifact] and
//! [crate::error::RelayError::ManifestsArchiveNotFound] pass through the
//! orchestrator unreinterpreted.

pub mod http;
pub mod mock;

pub use http::HttpBuildSystem;
pub use mock::MockBuildSystem;

use crate::error::Result;

/// An archive fetched from the build system, with the filename its build
/// metadata reported
#[derive(Debug, Clone)]
pub struct FetchedArchive {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Operations the build system must provide
pub trait BuildSystem: Send + Sync {
    /// Resolve a build identifier to its operator manifest archive.
    fn fetch_manifest_archive(&self, build_id: &str) -> Result<FetchedArchive>;
}
