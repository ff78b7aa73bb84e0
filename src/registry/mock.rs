use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::ReleaseSet;
use crate::error::{RelayError, Result};
use crate::registry::ReleaseRegistry;

/// In-memory registry for testing without a real registry service.
///
/// Organizations must be registered up front, mirroring the access model
/// of the HTTP client. Push and delete failures can be injected to
/// exercise error paths.
pub struct MockRegistry {
    organizations: HashSet<String>,
    releases: Mutex<HashMap<(String, String), Vec<String>>>,
    pushes: Mutex<Vec<(String, String, String)>>,
    push_error: Mutex<Option<String>>,
    delete_errors: Mutex<HashMap<String, String>>,
}

impl MockRegistry {
    /// Create a mock registry with a single accessible organization
    pub fn new(organization: impl Into<String>) -> Self {
        let mut organizations = HashSet::new();
        organizations.insert(organization.into());
        MockRegistry {
            organizations,
            releases: Mutex::new(HashMap::new()),
            pushes: Mutex::new(Vec::new()),
            push_error: Mutex::new(None),
            delete_errors: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a published release
    pub fn add_release(&self, organization: &str, repo: &str, version: impl Into<String>) {
        self.releases
            .lock()
            .unwrap()
            .entry((organization.to_string(), repo.to_string()))
            .or_default()
            .push(version.into());
    }

    /// Make the next push fail with the given diagnostic
    pub fn fail_next_push(&self, diagnostic: impl Into<String>) {
        *self.push_error.lock().unwrap() = Some(diagnostic.into());
    }

    /// Make deleting a specific version fail with the given diagnostic
    pub fn fail_delete(&self, version: impl Into<String>, diagnostic: impl Into<String>) {
        self.delete_errors
            .lock()
            .unwrap()
            .insert(version.into(), diagnostic.into());
    }

    /// Every successful push, in order
    pub fn pushes(&self) -> Vec<(String, String, String)> {
        self.pushes.lock().unwrap().clone()
    }

    fn check_organization(&self, organization: &str) -> Result<()> {
        if self.organizations.contains(organization) {
            Ok(())
        } else {
            Err(RelayError::registry_organization(format!(
                "organization '{}' is not configured",
                organization
            )))
        }
    }
}

impl ReleaseRegistry for MockRegistry {
    fn list_releases(&self, organization: &str, repo: &str) -> Result<ReleaseSet> {
        self.check_organization(organization)?;
        let releases = self.releases.lock().unwrap();
        Ok(ReleaseSet::new(
            releases
                .get(&(organization.to_string(), repo.to_string()))
                .cloned()
                .unwrap_or_default(),
        ))
    }

    fn push(&self, organization: &str, repo: &str, _archive: &[u8], version: &str) -> Result<()> {
        self.check_organization(organization)?;

        if let Some(diagnostic) = self.push_error.lock().unwrap().take() {
            return Err(RelayError::registry_push(diagnostic));
        }

        self.releases
            .lock()
            .unwrap()
            .entry((organization.to_string(), repo.to_string()))
            .or_default()
            .push(version.to_string());
        self.pushes.lock().unwrap().push((
            organization.to_string(),
            repo.to_string(),
            version.to_string(),
        ));
        Ok(())
    }

    fn delete_release(&self, organization: &str, repo: &str, version: &str) -> Result<()> {
        self.check_organization(organization)?;

        if let Some(diagnostic) = self.delete_errors.lock().unwrap().get(version) {
            return Err(RelayError::registry(diagnostic.clone()));
        }

        let mut releases = self.releases.lock().unwrap();
        let entry = releases
            .get_mut(&(organization.to_string(), repo.to_string()))
            .filter(|versions| versions.iter().any(|v| v == version))
            .ok_or_else(|| {
                RelayError::registry(format!(
                    "release {} not found in {}/{}",
                    version, organization, repo
                ))
            })?;
        entry.retain(|v| v != version);
        Ok(())
    }
}
