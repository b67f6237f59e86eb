//! # API Manifest
//!
//! Typed schema for the `api.yaml` / `api.json` entry of an API project.
//!
//! To support both formats with one decoder, manifest bytes are first
//! canonicalized into a JSON document and then decoded into [`ApiManifest`].
//! The polymorphic `production_endpoints` / `sandbox_endpoints` fields (a
//! single object or an array of objects, depending on the producer) are
//! decoded into the [`RawEndpoints`] variant and normalized into plain lists
//! before the manifest leaves this module, so downstream code never branches
//! on the raw shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::errors::{Error, Result};

/// Envelope of an `api.yaml` / `api.json` manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiManifest {
    /// Artifact type tag, e.g. `api`
    #[serde(rename = "type", default)]
    pub artifact_type: String,

    /// Artifact schema version
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub data: ApiData,
}

/// The `data` block of the manifest, describing the API itself
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiData {
    #[serde(rename = "Id", default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub context: String,

    #[serde(default)]
    pub version: String,

    #[serde(rename = "revisionId", default)]
    pub revision_id: u32,

    /// API type, one of HTTP, WS or WEBHOOK after normalization
    #[serde(rename = "type", default)]
    pub api_type: String,

    #[serde(rename = "lifeCycleStatus", default)]
    pub life_cycle_status: String,

    #[serde(rename = "endpointImplementationType", default)]
    pub endpoint_implementation_type: String,

    #[serde(rename = "authorizationHeader", default)]
    pub authorization_header: String,

    #[serde(rename = "securityScheme", default)]
    pub security_scheme: Vec<String>,

    #[serde(rename = "organizationId", default)]
    pub organization_id: String,

    #[serde(rename = "endpointConfig", default)]
    pub endpoint_config: EndpointConfig,

    #[serde(rename = "Operations", default)]
    pub operations: Vec<Operation>,
}

/// Upstream endpoint configuration of the manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(rename = "endpoint_type", default)]
    pub endpoint_type: String,

    #[serde(rename = "algoCombo", default)]
    pub load_balance_algo: String,

    #[serde(rename = "sessionManagement", default)]
    pub session_management: String,

    #[serde(rename = "sessionTimeOut", default)]
    pub session_timeout: String,

    #[serde(rename = "endpoint_security", default)]
    pub endpoint_security: ApiEndpointSecurity,

    /// Raw production endpoints as they appeared in the manifest
    #[serde(rename = "production_endpoints", default)]
    pub raw_production_endpoints: RawEndpoints,

    #[serde(rename = "production_failovers", default)]
    pub production_failovers: Vec<EndpointInfo>,

    /// Raw sandbox endpoints as they appeared in the manifest
    #[serde(rename = "sandbox_endpoints", default)]
    pub raw_sandbox_endpoints: RawEndpoints,

    #[serde(rename = "sandbox_failovers", default)]
    pub sandbox_failovers: Vec<EndpointInfo>,

    #[serde(rename = "implementation_status", default)]
    pub implementation_status: String,

    /// Normalized production endpoints, populated by [`ApiManifest::post_process`]
    #[serde(skip)]
    pub production_endpoints: Vec<EndpointInfo>,

    /// Normalized sandbox endpoints, populated by [`ApiManifest::post_process`]
    #[serde(skip)]
    pub sandbox_endpoints: Vec<EndpointInfo>,
}

/// The raw shape of a manifest endpoint list
///
/// Producers emit either a single endpoint object or an array of them. Any
/// other shape resolves to an empty list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEndpoints {
    #[default]
    Absent,
    Single(EndpointInfo),
    Many(Vec<EndpointInfo>),
    Other(serde_json::Value),
}

impl RawEndpoints {
    /// Resolve the raw shape into an ordered endpoint list
    ///
    /// `flow` names the endpoint list for the unrecognized-shape log line.
    pub fn resolve(&self, flow: &str) -> Vec<EndpointInfo> {
        match self {
            RawEndpoints::Absent => Vec::new(),
            RawEndpoints::Single(endpoint) => vec![endpoint.clone()],
            RawEndpoints::Many(endpoints) => endpoints.clone(),
            RawEndpoints::Other(_) => {
                warn!("No {} endpoints provided", flow);
                Vec::new()
            }
        }
    }
}

/// Endpoint security split into production and sandbox credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiEndpointSecurity {
    #[serde(default)]
    pub production: EndpointSecurity,

    #[serde(default)]
    pub sandbox: EndpointSecurity,
}

/// Credentials guarding calls to an upstream endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointSecurity {
    #[serde(rename = "type", default)]
    pub security_type: String,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(rename = "customparameters", default)]
    pub custom_parameters: HashMap<String, String>,
}

/// A single upstream endpoint with its retry configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointInfo {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub config: EndpointTimeouts,
}

/// Per-endpoint action and retry durations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointTimeouts {
    #[serde(rename = "actionDuration", default)]
    pub action_duration: String,

    #[serde(rename = "retryTimeOut", default)]
    pub retry_timeout: String,
}

/// An API operation: a path template, an HTTP verb and its policy flows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub target: String,

    #[serde(default)]
    pub verb: String,

    #[serde(rename = "operationPolicies", default)]
    pub policies: OperationPolicies,
}

/// The three ordered policy flows of an operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationPolicies {
    #[serde(rename = "in", default)]
    pub in_flow: PolicyList,

    #[serde(rename = "out", default)]
    pub out_flow: PolicyList,

    #[serde(default)]
    pub fault: PolicyList,
}

/// Ordered sequence of policies in one flow of an operation
pub type PolicyList = Vec<Policy>;

/// A single attached policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    #[serde(rename = "policyName", default)]
    pub policy_name: String,

    #[serde(default)]
    pub action: String,

    /// Stable sort key within the flow
    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl ApiManifest {
    /// Decode manifest bytes in either YAML or JSON format
    ///
    /// `default_organization` is assigned when the manifest omits
    /// `organizationId`, matching the control-plane-connected tenant.
    pub fn from_bytes(bytes: &[u8], default_organization: &str) -> Result<Self> {
        let document = to_json_document(bytes)?;
        let mut manifest: ApiManifest = serde_json::from_value(document)
            .map_err(|e| Error::invalid_manifest(format!("failed to decode api manifest: {}", e)))?;
        manifest.post_process(default_organization);
        Ok(manifest)
    }

    /// Format parameters and apply defaults after decoding
    pub fn post_process(&mut self, default_organization: &str) {
        self.data.api_type = self.data.api_type.to_uppercase();
        self.data.life_cycle_status = self.data.life_cycle_status.to_uppercase();

        if self.data.organization_id.is_empty() {
            self.data.organization_id = default_organization.to_string();
        }

        let endpoint_config = &mut self.data.endpoint_config;
        endpoint_config.production_endpoints =
            endpoint_config.raw_production_endpoints.resolve("production");
        endpoint_config.sandbox_endpoints =
            endpoint_config.raw_sandbox_endpoints.resolve("sandbox");
    }
}

/// Canonicalize manifest bytes into a JSON document
///
/// JSON input is taken as-is; anything else is treated as YAML.
fn to_json_document(bytes: &[u8]) -> Result<serde_json::Value> {
    match serde_json::from_slice(bytes) {
        Ok(document) => Ok(document),
        Err(json_err) => serde_yaml::from_slice(bytes).map_err(|yaml_err| {
            Error::invalid_manifest(format!(
                "manifest is neither valid JSON ({}) nor valid YAML ({})",
                json_err, yaml_err
            ))
        }),
    }
}
