//! # Error Handling
//!
//! Error types for the Setu control plane core, built on `thiserror`.
//! Parse and validation failures abort the current call before the deployment
//! index is touched; unexpected failures inside a deployment are rewritten at
//! the orchestrator boundary into the canonical deployment error so callers
//! can identify the offending API without seeing internal state.

/// Custom result type for Setu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Setu control plane core
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// The project archive could not be opened or decompressed
    #[error("Invalid API project archive: {context}")]
    InvalidArchive {
        #[source]
        source: Option<zip::result::ZipError>,
        context: String,
    },

    /// The project contains no api.yaml or api.json entry
    #[error("could not find api.yaml or api.json")]
    ManifestAbsent,

    /// The manifest was present but could not be decoded
    #[error("Invalid API manifest: {message}")]
    InvalidManifest { message: String },

    /// Validation errors with an aggregated human-readable reason
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The project refers to an unsupported API type or endpoint implementation
    #[error("{message}")]
    UnsupportedType { message: String },

    /// Create attempted against an existing deployment without override
    #[error("Already exists")]
    AlreadyExists,

    /// Canonical deployment failure identifying the API by name, version and id
    #[error("{name}:{version} with UUID \"{api_id}\"")]
    Deployment {
        name: String,
        version: String,
        api_id: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Create an archive error without an underlying zip failure
    pub fn invalid_archive<S: Into<String>>(context: S) -> Self {
        Self::InvalidArchive { source: None, context: context.into() }
    }

    /// Create a manifest decode error
    pub fn invalid_manifest<S: Into<String>>(message: S) -> Self {
        Self::InvalidManifest { message: message.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create an unsupported-type error
    pub fn unsupported_type<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedType { message: message.into() }
    }

    /// Create the canonical deployment error for the given API identity
    pub fn deployment<N, V, I>(name: N, version: V, api_id: I) -> Self
    where
        N: Into<String>,
        V: Into<String>,
        I: Into<String>,
    {
        Self::Deployment { name: name.into(), version: version.into(), api_id: api_id.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether this error is the distinguished already-exists sentinel
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists)
    }
}

// Error conversions for common external error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(error: zip::result::ZipError) -> Self {
        Self::InvalidArchive {
            source: Some(error),
            context: "failed to read project archive".to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
