//! # Project Validation
//!
//! Enforces mandatory-field, endpoint-URL and supported-type rules on a
//! parsed project, before the deployment index is ever touched. Failures
//! carry an aggregated human-readable reason.

use crate::config::GatewayConfig;
use crate::errors::{Error, Result};
use crate::project::manifest::{ApiManifest, EndpointInfo};
use crate::project::model::{ApiProject, Deployment};

/// Supported API types
pub const API_TYPE_HTTP: &str = "HTTP";
pub const API_TYPE_WS: &str = "WS";
pub const API_TYPE_WEBHOOK: &str = "WEBHOOK";

/// Explicitly unsupported endpoint implementation
const INLINE_ENDPOINT_TYPE: &str = "INLINE";

/// Run all validation rules against a parsed project
pub fn validate_project(project: &ApiProject) -> Result<()> {
    let manifest = &project.manifest;
    validate_mandatory_fields(manifest)?;
    validate_endpoint_urls(manifest)?;
    validate_implementation_type(manifest)?;
    validate_api_type(manifest)?;
    Ok(())
}

/// Check that the always-required manifest fields are populated
///
/// Failures are aggregated into a single reason naming every missing field.
fn validate_mandatory_fields(manifest: &ApiManifest) -> Result<()> {
    let data = &manifest.data;
    let mut missing = String::new();
    let mut api_name = data.name.as_str();
    let mut api_version = data.version.as_str();

    if api_name.is_empty() {
        api_name = "unknownAPIName";
        missing.push_str("API Name ");
    }

    if api_version.is_empty() {
        api_version = "unknownAPIVersion";
        missing.push_str("API Version ");
    }

    if data.context.is_empty() {
        missing.push_str("API Context ");
    }

    if data.endpoint_config.production_endpoints.is_empty()
        && data.endpoint_config.sandbox_endpoints.is_empty()
    {
        missing.push_str("API production and sandbox endpoints ");
    }

    if !missing.is_empty() {
        return Err(Error::validation(format!(
            "{}fields cannot be empty for {} {}",
            missing, api_name, api_version
        )));
    }

    Ok(())
}

/// Reject blank or relative endpoint URLs
fn validate_endpoint_urls(manifest: &ApiManifest) -> Result<()> {
    let endpoint_config = &manifest.data.endpoint_config;
    check_urls(&endpoint_config.production_endpoints, "production")?;
    check_urls(&endpoint_config.sandbox_endpoints, "sandbox")?;
    Ok(())
}

fn check_urls(endpoints: &[EndpointInfo], flow: &str) -> Result<()> {
    for endpoint in endpoints {
        if endpoint.url.starts_with('/') || endpoint.url.trim().is_empty() {
            return Err(Error::validation(format!(
                "relative urls or empty values are not supported for API {} endpoints",
                flow
            )));
        }
    }
    Ok(())
}

fn validate_implementation_type(manifest: &ApiManifest) -> Result<()> {
    if manifest.data.endpoint_implementation_type == INLINE_ENDPOINT_TYPE {
        return Err(Error::unsupported_type(
            "inline endpointImplementationType is not currently supported",
        ));
    }
    Ok(())
}

/// Check that the project declares one of the supported API types
pub fn validate_api_type(manifest: &ApiManifest) -> Result<()> {
    match manifest.data.api_type.as_str() {
        API_TYPE_HTTP | API_TYPE_WS | API_TYPE_WEBHOOK => Ok(()),
        _ => Err(Error::unsupported_type("API type is not currently supported")),
    }
}

/// The placements a project should be deployed to
///
/// When the project carries no deployment list, a single deployment to the
/// default environment and vhost is synthesized.
pub fn effective_deployments(project: &ApiProject, gateway: &GatewayConfig) -> Vec<Deployment> {
    match &project.deployments {
        Some(deployments) => deployments.clone(),
        None => vec![Deployment {
            environment: gateway.default_environment.clone(),
            vhost: gateway.default_vhost.clone(),
            display_on_devportal: true,
        }],
    }
}
