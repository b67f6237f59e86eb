//! # Configuration Settings
//!
//! Defines the configuration structure for the Setu control plane core.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Artifact directory configuration
    #[validate(nested)]
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Default gateway placement configuration
    #[validate(nested)]
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Administrative server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[validate(nested)]
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            artifacts: ArtifactsConfig::from_env(),
            gateway: GatewayConfig::from_env(),
            server: ServerConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        // Use validator crate for basic validation
        Validate::validate(self).map_err(Error::from)?;

        // Custom validation logic
        self.validate_custom()?;

        Ok(())
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        match self.observability.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(Error::validation(format!(
                    "Invalid log level '{}': must be one of trace, debug, info, warn, error",
                    other
                )));
            }
        }

        Ok(())
    }
}

/// Location of locally mounted API project artifacts
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ArtifactsConfig {
    /// Root directory containing the `apis/` subdirectory of mounted projects
    #[validate(length(min = 1, message = "Artifacts directory cannot be empty"))]
    pub directory: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self { directory: "./artifacts".to_string() }
    }
}

impl ArtifactsConfig {
    /// Create ArtifactsConfig from environment variables
    pub fn from_env() -> Self {
        let directory =
            std::env::var("SETU_ARTIFACTS_DIR").unwrap_or_else(|_| "./artifacts".to_string());
        Self { directory }
    }

    /// Directory holding the API projects to replay at startup
    pub fn apis_dir(&self) -> PathBuf {
        PathBuf::from(&self.directory).join("apis")
    }
}

/// Defaults applied when a project does not state its own placement or tenancy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Gateway environment used when a project carries no deployment list
    #[validate(length(min = 1, message = "Default environment cannot be empty"))]
    pub default_environment: String,

    /// Virtual host used when a project carries no deployment list
    #[validate(length(min = 1, message = "Default vhost cannot be empty"))]
    pub default_vhost: String,

    /// Organization assigned to projects that omit organizationId, taken from
    /// the control-plane-connected tenant
    #[validate(length(min = 1, message = "Default organization cannot be empty"))]
    pub default_organization: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_environment: "Default".to_string(),
            default_vhost: "localhost".to_string(),
            default_organization: "default".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create GatewayConfig from environment variables
    pub fn from_env() -> Self {
        let default_environment =
            std::env::var("SETU_DEFAULT_ENVIRONMENT").unwrap_or_else(|_| "Default".to_string());
        let default_vhost =
            std::env::var("SETU_DEFAULT_VHOST").unwrap_or_else(|_| "localhost".to_string());
        let default_organization =
            std::env::var("SETU_DEFAULT_ORGANIZATION").unwrap_or_else(|_| "default".to_string());

        Self { default_environment, default_vhost, default_organization }
    }
}

/// Administrative server configuration
///
/// Only the enabled flag matters to the core: when the admin server is down
/// there is no other way to submit projects, so an unreadable artifact
/// directory at startup becomes fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Whether the administrative server accepting apictl projects is enabled
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServerConfig {
    /// Create ServerConfig from environment variables
    pub fn from_env() -> Self {
        let enabled = std::env::var("SETU_SERVER_ENABLED")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);
        Self { enabled }
    }
}

/// Observability configuration for logging
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let log_level = std::env::var("SETU_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json_logging = std::env::var("SETU_JSON_LOGGING")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self { log_level, json_logging }
    }
}
