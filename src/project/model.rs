//! # API Project Model
//!
//! The [`ApiProject`] aggregate: the unit of deployment assembled by the
//! parser from an apictl-style archive or directory, plus the schemas of the
//! auxiliary artifact files that travel with the manifest.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::manifest::ApiManifest;

/// A packaged, self-contained API definition
#[derive(Debug, Clone, Default)]
pub struct ApiProject {
    /// Decoded api.yaml / api.json manifest
    pub manifest: ApiManifest,

    /// OpenAPI source stored verbatim, when the project carries one
    pub openapi_definition: Option<Vec<u8>>,

    /// Upstream certificate bytes keyed by filename
    pub upstream_certs: HashMap<String, Vec<u8>>,

    /// Endpoint-certificate index: certificate filename to endpoint URL
    pub endpoint_certs: HashMap<String, String>,

    /// Operation policy containers keyed by policy name
    pub policies: HashMap<String, PolicyContainer>,

    /// Requested placements; `None` means the default deployment applies
    pub deployments: Option<Vec<Deployment>>,

    /// Revision metadata from api_meta.yaml, when present
    pub revision_meta: Option<RevisionMeta>,

    /// Environment-specific overrides keyed by gateway environment
    pub env_props: HashMap<String, EnvProps>,
}

impl ApiProject {
    /// The effective revision: api_meta.yaml wins over the manifest value
    pub fn revision_id(&self) -> u32 {
        self.revision_meta
            .as_ref()
            .map(|meta| meta.revision_id)
            .unwrap_or(self.manifest.data.revision_id)
    }
}

/// A requested placement of the project on a gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(rename = "deploymentEnvironment", default)]
    pub environment: String,

    #[serde(rename = "deploymentVhost", default)]
    pub vhost: String,

    #[serde(rename = "displayOnDevportal", default)]
    pub display_on_devportal: bool,
}

/// Schema of the optional `deployment_environments.yaml` artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentEnvironmentsFile {
    #[serde(rename = "type", default)]
    pub artifact_type: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub data: Vec<Deployment>,
}

/// Schema of the optional `api_meta.yaml` artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionMeta {
    #[serde(rename = "revisionId", default)]
    pub revision_id: u32,
}

/// An operation policy container from the `Policies/` directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyContainer {
    #[serde(rename = "type", default)]
    pub artifact_type: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub data: serde_json::Value,
}

/// Schema of the `Endpoint-certificates/endpoint_certificates.yaml` index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointCertificatesFile {
    #[serde(rename = "type", default)]
    pub artifact_type: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub data: Vec<EndpointCertificate>,
}

/// One entry of the endpoint-certificate index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointCertificate {
    #[serde(default)]
    pub alias: String,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub certificate: String,
}

/// Environment-specific override properties supplied by the management plane
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvProps {
    #[serde(rename = "productionEndpoint", default)]
    pub production_endpoint: Option<String>,

    #[serde(rename = "sandboxEndpoint", default)]
    pub sandbox_endpoint: Option<String>,
}

/// Acknowledgement emitted by the index on each successful deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedRevision {
    pub api_id: String,
    pub revision_id: u32,
    pub organization_id: String,
    pub vhost: String,
    pub environments: Vec<String>,
}

/// Listing result of the deployed APIs of an organization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    /// Matching deployments before the limit was applied
    pub total: usize,

    /// Entries returned in this listing
    pub count: usize,

    pub list: Vec<ApiMetaEntry>,
}

/// One row of an API listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetaEntry {
    pub id: String,
    pub name: String,
    pub version: String,
    pub api_type: String,
    pub context: String,
    pub gateway_envs: Vec<String>,
}
