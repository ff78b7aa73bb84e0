use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::{OrganizationConfig, RegistryConfig};
use crate::domain::ReleaseSet;
use crate::error::{RelayError, Result};

/// One release entry as the registry API reports it
#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    release: String,
}

/// Blocking HTTP client for the release registry.
///
/// Constructed once at process start from validated configuration and
/// injected into request handlers; holds no per-request state. Only
/// organizations present in the configuration are accessible.
pub struct HttpRegistry {
    client: Client,
    base_url: String,
    organizations: std::collections::HashMap<String, OrganizationConfig>,
}

impl HttpRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| RelayError::registry(format!("cannot build registry client: {}", e)))?;

        Ok(HttpRegistry {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            organizations: config.organizations.clone(),
        })
    }

    /// Access settings for `organization`, or the organization error that
    /// must surface before any registry interaction.
    fn organization(&self, organization: &str) -> Result<&OrganizationConfig> {
        self.organizations.get(organization).ok_or_else(|| {
            RelayError::registry_organization(format!(
                "organization '{}' is not configured",
                organization
            ))
        })
    }

    fn package_url(&self, organization: &str, repo: &str) -> String {
        format!(
            "{}/api/v1/packages/{}/{}",
            self.base_url, organization, repo
        )
    }

    fn with_token(
        &self,
        request: reqwest::blocking::RequestBuilder,
        org: &OrganizationConfig,
    ) -> reqwest::blocking::RequestBuilder {
        match &org.token {
            Some(token) => request.header("Authorization", token.clone()),
            None => request,
        }
    }
}

impl super::ReleaseRegistry for HttpRegistry {
    fn list_releases(&self, organization: &str, repo: &str) -> Result<ReleaseSet> {
        let org = self.organization(organization)?;
        let url = self.package_url(organization, repo);

        let response = self
            .with_token(self.client.get(&url), org)
            .send()
            .map_err(|e| RelayError::registry(format!("cannot list releases: {}", e)))?;

        // A repository with no prior pushes does not exist yet on the
        // registry side; treat that as an empty release set.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ReleaseSet::default());
        }

        if !response.status().is_success() {
            return Err(RelayError::registry(format!(
                "cannot retrieve information about package {}/{}: HTTP {}",
                organization,
                repo,
                response.status().as_u16()
            )));
        }

        let entries: Vec<ReleaseEntry> = response
            .json()
            .map_err(|e| RelayError::registry(format!("malformed release listing: {}", e)))?;

        debug!(
            organization,
            repo,
            count = entries.len(),
            "listed releases"
        );
        Ok(ReleaseSet::new(
            entries.into_iter().map(|e| e.release).collect(),
        ))
    }

    fn push(&self, organization: &str, repo: &str, archive: &[u8], version: &str) -> Result<()> {
        let org = self.organization(organization)?;
        let url = format!("{}/{}", self.package_url(organization, repo), version);

        let response = self
            .with_token(self.client.post(&url), org)
            .header("Content-Type", "application/zip")
            .body(archive.to_vec())
            .send()
            .map_err(|e| RelayError::registry_push(e.to_string()))?;

        if !response.status().is_success() {
            // The response body is the push tool's diagnostic; hand it back
            // verbatim.
            let status = response.status().as_u16();
            let diagnostic = response.text().unwrap_or_default();
            return Err(RelayError::registry_push(if diagnostic.is_empty() {
                format!("HTTP {}", status)
            } else {
                diagnostic
            }));
        }

        debug!(organization, repo, version, "pushed release");
        Ok(())
    }

    fn delete_release(&self, organization: &str, repo: &str, version: &str) -> Result<()> {
        let org = self.organization(organization)?;
        let url = format!("{}/{}", self.package_url(organization, repo), version);

        let response = self
            .with_token(self.client.delete(&url), org)
            .send()
            .map_err(|e| RelayError::registry(format!("cannot delete release: {}", e)))?;

        if !response.status().is_success() {
            return Err(RelayError::registry(format!(
                "cannot delete release {} of {}/{}: HTTP {}",
                version,
                organization,
                repo,
                response.status().as_u16()
            )));
        }

        debug!(organization, repo, version, "deleted release");
        Ok(())
    }
}
