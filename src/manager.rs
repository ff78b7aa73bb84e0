//! Release deletion.
//!
//! Deletion must reach every release the registry reports, including
//! version strings that never conformed to the version grammar, so the
//! listing is used raw and versions are deleted verbatim.

use serde::Serialize;
use tracing::info;

use crate::domain::ReleaseSet;
use crate::error::Result;
use crate::registry::ReleaseRegistry;

/// A delete that stopped partway: what failed and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteFailure {
    pub version: String,
    pub diagnostic: String,
}

/// Outcome of a delete request.
///
/// Deletions are not atomic: a bulk delete that fails partway reports the
/// versions removed so far together with the failing one's diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub organization: String,
    pub repo: String,
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<DeleteFailure>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Lists and removes published releases through an injected registry.
pub struct ReleaseManager<'a> {
    registry: &'a dyn ReleaseRegistry,
}

impl<'a> ReleaseManager<'a> {
    pub fn new(registry: &'a dyn ReleaseRegistry) -> Self {
        ReleaseManager { registry }
    }

    /// Raw release listing, unfiltered
    pub fn list_releases(&self, organization: &str, repo: &str) -> Result<ReleaseSet> {
        self.registry.list_releases(organization, repo)
    }

    /// Delete a single release identified by its raw version string.
    /// No version validation: any string the registry accepted as an
    /// identifier is deletable.
    pub fn delete_release(
        &self,
        organization: &str,
        repo: &str,
        version: &str,
    ) -> Result<DeleteOutcome> {
        self.registry.delete_release(organization, repo, version)?;
        info!(organization, repo, version, "deleted release");
        Ok(DeleteOutcome {
            organization: organization.to_string(),
            repo: repo.to_string(),
            deleted: vec![version.to_string()],
            failed: None,
        })
    }

    /// Delete every release of the repository.
    ///
    /// Stops at the first failing deletion and reports what was removed up
    /// to that point; there is no rollback.
    pub fn delete_all(&self, organization: &str, repo: &str) -> Result<DeleteOutcome> {
        let releases = self.registry.list_releases(organization, repo)?;

        let mut deleted = Vec::new();
        for version in releases.raw() {
            match self.registry.delete_release(organization, repo, version) {
                Ok(()) => deleted.push(version.clone()),
                Err(e) => {
                    return Ok(DeleteOutcome {
                        organization: organization.to_string(),
                        repo: repo.to_string(),
                        deleted,
                        failed: Some(DeleteFailure {
                            version: version.clone(),
                            diagnostic: e.to_string(),
                        }),
                    });
                }
            }
        }

        info!(
            organization,
            repo,
            count = deleted.len(),
            "deleted all releases"
        );
        Ok(DeleteOutcome {
            organization: organization.to_string(),
            repo: repo.to_string(),
            deleted,
            failed: None,
        })
    }
}
