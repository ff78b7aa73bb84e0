use thiserror::Error;

/// Unified error type for manifest-relay operations
///
/// The set of variants is closed: collaborator failures that do not fit a
/// specific variant are wrapped into [RelayError::Registry] or
/// [RelayError::Build] rather than propagated raw.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid version format: {0}")]
    InvalidVersionFormat(String),

    #[error("Version {version} already exists in {organization}/{repo}")]
    VersionAlreadyExists {
        organization: String,
        repo: String,
        version: String,
    },

    #[error("Uploaded file error: {0}")]
    UploadedFile(String),

    #[error("Expected file error: {0}")]
    ExpectedFile(String),

    #[error("Registry organization error: {0}")]
    RegistryOrganization(String),

    #[error("Failed to push to registry: {0}")]
    RegistryPush(String),

    #[error("Build not found: {0}")]
    BuildNotFound(String),

    #[error("Not an operator artifact: {0}")]
    NotAnOperatorArtifact(String),

    #[error("Manifests archive not found: {0}")]
    ManifestsArchiveNotFound(String),

    #[error("Build system error: {0}")]
    Build(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in manifest-relay
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Create an invalid version format error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        RelayError::InvalidVersionFormat(version.into())
    }

    /// Create an uploaded file error with context
    pub fn uploaded_file(msg: impl Into<String>) -> Self {
        RelayError::UploadedFile(msg.into())
    }

    /// Create an expected file error with context
    pub fn expected_file(msg: impl Into<String>) -> Self {
        RelayError::ExpectedFile(msg.into())
    }

    /// Create a registry organization error with context
    pub fn registry_organization(msg: impl Into<String>) -> Self {
        RelayError::RegistryOrganization(msg.into())
    }

    /// Create a registry push error carrying the push tool's diagnostic
    pub fn registry_push(diagnostic: impl Into<String>) -> Self {
        RelayError::RegistryPush(diagnostic.into())
    }

    /// Create a generic registry error with context
    pub fn registry(msg: impl Into<String>) -> Self {
        RelayError::Registry(msg.into())
    }

    /// Create a generic build system error with context
    pub fn build(msg: impl Into<String>) -> Self {
        RelayError::Build(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        RelayError::Config(msg.into())
    }

    /// Stable discriminant name used in structured error responses
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidVersionFormat(_) => "InvalidVersionFormat",
            RelayError::VersionAlreadyExists { .. } => "VersionAlreadyExists",
            RelayError::UploadedFile(_) => "UploadedFileError",
            RelayError::ExpectedFile(_) => "ExpectedFileError",
            RelayError::RegistryOrganization(_) => "RegistryOrganizationError",
            RelayError::RegistryPush(_) => "RegistryPushError",
            RelayError::BuildNotFound(_) => "BuildNotFound",
            RelayError::NotAnOperatorArtifact(_) => "NotAnOperatorArtifact",
            RelayError::ManifestsArchiveNotFound(_) => "ManifestsArchiveNotFound",
            RelayError::Build(_) => "BuildError",
            RelayError::Registry(_) => "RegistryError",
            RelayError::Config(_) => "ConfigError",
            RelayError::Io(_) => "IoError",
        }
    }

    /// HTTP status an API layer must map this error to:
    /// 400 for user input and validation errors, 500 for collaborator
    /// failures and everything else.
    pub fn http_status(&self) -> u16 {
        match self {
            RelayError::InvalidVersionFormat(_)
            | RelayError::VersionAlreadyExists { .. }
            | RelayError::UploadedFile(_)
            | RelayError::ExpectedFile(_) => 400,
            _ => 500,
        }
    }
}
