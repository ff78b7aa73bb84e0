use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::buildsys::FetchedArchive;
use crate::config::BuildSystemConfig;
use crate::error::{RelayError, Result};

#[derive(Debug, Deserialize, Default)]
struct BuildMetadata {
    #[serde(default)]
    extra: BuildExtra,
}

#[derive(Debug, Deserialize, Default)]
struct BuildExtra {
    #[serde(default)]
    typeinfo: BuildTypeinfo,
}

#[derive(Debug, Deserialize, Default)]
struct BuildTypeinfo {
    #[serde(rename = "operator-manifests", default)]
    operator_manifests: Option<OperatorManifests>,
}

#[derive(Debug, Deserialize)]
struct OperatorManifests {
    archive: String,
}

/// Blocking HTTP client for the build system.
///
/// Resolves build metadata from the hub URL, then downloads the
/// operator-manifests archive the metadata names from the root URL.
pub struct HttpBuildSystem {
    client: Client,
    hub_url: String,
    root_url: String,
}

impl HttpBuildSystem {
    pub fn new(config: &BuildSystemConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| RelayError::build(format!("cannot build hub client: {}", e)))?;

        Ok(HttpBuildSystem {
            client,
            hub_url: config.hub_url.trim_end_matches('/').to_string(),
            root_url: config.root_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_metadata(&self, build_id: &str) -> Result<BuildMetadata> {
        let url = format!("{}/builds/{}", self.hub_url, build_id);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RelayError::build(format!("cannot query build metadata: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RelayError::BuildNotFound(format!(
                "build not found: {}",
                build_id
            )));
        }
        if !response.status().is_success() {
            return Err(RelayError::build(format!(
                "metadata query for build {} failed: HTTP {}",
                build_id,
                response.status().as_u16()
            )));
        }

        // The hub reports unknown builds as a JSON null body.
        let metadata: Option<BuildMetadata> = response
            .json()
            .map_err(|e| RelayError::build(format!("malformed build metadata: {}", e)))?;
        metadata.ok_or_else(|| {
            RelayError::BuildNotFound(format!("build not found: {}", build_id))
        })
    }
}

impl super::BuildSystem for HttpBuildSystem {
    fn fetch_manifest_archive(&self, build_id: &str) -> Result<FetchedArchive> {
        let metadata = self.build_metadata(build_id)?;

        let filename = metadata
            .extra
            .typeinfo
            .operator_manifests
            .map(|info| info.archive)
            .ok_or_else(|| {
                RelayError::NotAnOperatorArtifact(format!(
                    "not an operator artifact: {}",
                    build_id
                ))
            })?;

        let url = format!(
            "{}/{}/files/operator-manifests/{}",
            self.root_url, build_id, filename
        );
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RelayError::build(format!("cannot download archive: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RelayError::ManifestsArchiveNotFound(format!(
                "expected archive '{}' with manifests not found in build: {}",
                filename, build_id
            )));
        }
        if !response.status().is_success() {
            return Err(RelayError::build(format!(
                "archive download for build {} failed: HTTP {}",
                build_id,
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| RelayError::build(format!("cannot read archive body: {}", e)))?
            .to_vec();

        debug!(build_id, filename = %filename, size = bytes.len(), "fetched manifest archive");
        Ok(FetchedArchive { filename, bytes })
    }
}
