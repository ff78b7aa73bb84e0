//! Release registry abstraction.
//!
//! The registry is an external collaborator: the only operations this
//! service needs are listing the releases of a repository, pushing a new
//! versioned release, and deleting one. [HttpRegistry] talks to a real
//! registry; [MockRegistry] backs the tests.
//!
//! Implementations map their transport failures into the closed
//! [crate::error::RelayError] taxonomy; callers never see raw client
//! errors.

pub mod http;
pub mod mock;

pub use http::HttpRegistry;
pub use mock::MockRegistry;

use crate::domain::ReleaseSet;
use crate::error::Result;

/// Operations the release registry must provide.
///
/// All calls are blocking and request-scoped; implementors must be
/// `Send + Sync` so one client can be shared across request handlers.
pub trait ReleaseRegistry: Send + Sync {
    /// Raw version strings currently published for the repository,
    /// including entries that do not conform to the version grammar.
    ///
    /// Fails with [crate::error::RelayError::RegistryOrganization] when the
    /// organization is not configured or not accessible.
    fn list_releases(&self, organization: &str, repo: &str) -> Result<ReleaseSet>;

    /// Publish `archive` under `version`. A failure carries the push
    /// tool's diagnostic.
    fn push(&self, organization: &str, repo: &str, archive: &[u8], version: &str) -> Result<()>;

    /// Delete exactly the given raw version string.
    fn delete_release(&self, organization: &str, repo: &str, version: &str) -> Result<()>;
}
