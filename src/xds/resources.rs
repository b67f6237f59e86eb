//! # Discovery Resources
//!
//! The output schema consumed by the discovery transport, and the projection
//! of an accepted [`ApiProject`](crate::project::ApiProject) into it. The
//! projection is pure: it reads the project and never touches index state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::project::manifest::{
    EndpointInfo, EndpointSecurity, OperationPolicies as ManifestPolicies,
    Policy as ManifestPolicy,
};
use crate::project::ApiProject;

pub const PRODUCTION_CLUSTER_PREFIX: &str = "clusterProd";
pub const SANDBOX_CLUSTER_PREFIX: &str = "clusterSand";

/// Default throttling tier applied when the manifest states none
const UNLIMITED_TIER: &str = "Unlimited";

/// One API as published to the discovery layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    pub id: String,
    pub name: String,
    pub version: String,
    pub api_type: String,
    pub context: String,
    pub vhost: String,
    pub organization_id: String,
    pub lifecycle_status: String,
    pub authorization_header: String,
    pub security_scheme: Vec<String>,
    pub resources: Vec<Resource>,
    pub production_endpoints: Option<EndpointCluster>,
    pub sandbox_endpoints: Option<EndpointCluster>,
}

/// One resource (path template) of an API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub path: String,
    pub methods: Vec<Operation>,
    pub summary: String,
    pub description: String,
    pub production_endpoints: Option<EndpointCluster>,
    pub sandbox_endpoints: Option<EndpointCluster>,
    pub security: BTreeMap<String, String>,
    pub consumes: Vec<String>,
    pub schemes: Vec<String>,
    pub tags: Vec<String>,
}

/// One HTTP method of a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub method: String,
    pub security: Vec<SecurityList>,
    pub tier: String,
    pub disable_security: bool,
    pub policies: OperationPolicies,
    pub mocked_api_config: Option<MockedApiConfig>,
}

/// Security requirement attached to an operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityList {
    pub scheme: String,
    pub scopes: Vec<String>,
}

/// The ordered policy flows of an operation as seen by the gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationPolicies {
    pub request: Vec<Policy>,
    pub response: Vec<Policy>,
    pub fault: Vec<Policy>,
}

/// A single policy with its stable sort key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub policy_name: String,
    pub action: String,
    pub order: u32,
    pub parameters: BTreeMap<String, String>,
}

/// Mocked-response configuration of a prototyped operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockedApiConfig {
    pub responses: Vec<MockedResponseConfig>,
}

/// One mocked response by status code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockedResponseConfig {
    pub status_code: String,
    pub content: String,
}

/// A named upstream endpoint group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCluster {
    pub name: String,
    pub urls: Vec<UpstreamEndpoint>,
    pub failovers: Vec<UpstreamEndpoint>,
    pub security: Option<ClusterSecurity>,
}

/// One upstream endpoint of a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamEndpoint {
    pub url: String,
    pub action_duration: String,
    pub retry_timeout: String,
}

/// Upstream credentials carried with a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSecurity {
    pub security_type: String,
    pub enabled: bool,
    pub username: String,
    pub password: String,
    pub custom_parameters: BTreeMap<String, String>,
}

/// Project an accepted API project into the discovery schema for one vhost
pub fn api_from_project(project: &ApiProject, vhost: &str) -> Api {
    let data = &project.manifest.data;
    let endpoint_config = &data.endpoint_config;

    let production_endpoints = build_cluster(
        PRODUCTION_CLUSTER_PREFIX,
        vhost,
        &data.id,
        &endpoint_config.production_endpoints,
        &endpoint_config.production_failovers,
        &endpoint_config.endpoint_security.production,
    );
    let sandbox_endpoints = build_cluster(
        SANDBOX_CLUSTER_PREFIX,
        vhost,
        &data.id,
        &endpoint_config.sandbox_endpoints,
        &endpoint_config.sandbox_failovers,
        &endpoint_config.endpoint_security.sandbox,
    );

    let schemes = url_schemes(endpoint_config);
    let mocked = endpoint_config.implementation_status.eq_ignore_ascii_case("mocked");

    let resources = group_resources(project, &schemes, mocked);

    Api {
        id: data.id.clone(),
        name: data.name.clone(),
        version: data.version.clone(),
        api_type: data.api_type.clone(),
        context: data.context.clone(),
        vhost: vhost.to_string(),
        organization_id: data.organization_id.clone(),
        lifecycle_status: data.life_cycle_status.clone(),
        authorization_header: data.authorization_header.clone(),
        security_scheme: data.security_scheme.clone(),
        resources,
        production_endpoints,
        sandbox_endpoints,
    }
}

/// Group manifest operations into resources, one per path template,
/// preserving first-seen order
fn group_resources(project: &ApiProject, schemes: &[String], mocked: bool) -> Vec<Resource> {
    let data = &project.manifest.data;
    let security: BTreeMap<String, String> = data
        .security_scheme
        .iter()
        .map(|scheme| (scheme.clone(), "default".to_string()))
        .collect();

    let mut resources: Vec<Resource> = Vec::new();
    for operation in &data.operations {
        let method = build_operation(operation, &data.security_scheme, mocked);
        match resources.iter().position(|r| r.path == operation.target) {
            Some(index) => resources[index].methods.push(method),
            None => resources.push(Resource {
                id: Uuid::new_v4().to_string(),
                path: operation.target.clone(),
                methods: vec![method],
                security: security.clone(),
                schemes: schemes.to_vec(),
                ..Resource::default()
            }),
        }
    }
    resources
}

fn build_operation(
    operation: &crate::project::manifest::Operation,
    security_scheme: &[String],
    mocked: bool,
) -> Operation {
    Operation {
        method: operation.verb.to_uppercase(),
        security: security_scheme
            .iter()
            .map(|scheme| SecurityList { scheme: scheme.clone(), scopes: Vec::new() })
            .collect(),
        tier: UNLIMITED_TIER.to_string(),
        disable_security: security_scheme.is_empty(),
        policies: project_policies(&operation.policies),
        mocked_api_config: mocked.then(MockedApiConfig::default),
    }
}

/// Project the manifest policy flows, sorted stably by their order key
fn project_policies(policies: &ManifestPolicies) -> OperationPolicies {
    OperationPolicies {
        request: project_flow(&policies.in_flow),
        response: project_flow(&policies.out_flow),
        fault: project_flow(&policies.fault),
    }
}

fn project_flow(flow: &[ManifestPolicy]) -> Vec<Policy> {
    let mut projected: Vec<Policy> = flow
        .iter()
        .map(|policy| Policy {
            policy_name: policy.policy_name.clone(),
            action: policy.action.clone(),
            order: policy.order,
            parameters: stringify_parameters(&policy.parameters),
        })
        .collect();
    projected.sort_by_key(|policy| policy.order);
    projected
}

/// Flatten polymorphic policy parameters into string values
fn stringify_parameters(parameters: &serde_json::Value) -> BTreeMap<String, String> {
    match parameters {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn build_cluster(
    prefix: &str,
    vhost: &str,
    api_id: &str,
    endpoints: &[EndpointInfo],
    failovers: &[EndpointInfo],
    security: &EndpointSecurity,
) -> Option<EndpointCluster> {
    if endpoints.is_empty() {
        return None;
    }

    Some(EndpointCluster {
        name: format!("{}_{}_{}", prefix, vhost, api_id),
        urls: endpoints.iter().map(upstream_endpoint).collect(),
        failovers: failovers.iter().map(upstream_endpoint).collect(),
        security: security.enabled.then(|| ClusterSecurity {
            security_type: security.security_type.clone(),
            enabled: security.enabled,
            username: security.username.clone(),
            password: security.password.clone(),
            custom_parameters: security
                .custom_parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }),
    })
}

fn upstream_endpoint(endpoint: &EndpointInfo) -> UpstreamEndpoint {
    UpstreamEndpoint {
        url: endpoint.url.clone(),
        action_duration: endpoint.config.action_duration.clone(),
        retry_timeout: endpoint.config.retry_timeout.clone(),
    }
}

/// Distinct URL schemes of the configured endpoints, production first
fn url_schemes(endpoint_config: &crate::project::manifest::EndpointConfig) -> Vec<String> {
    let mut schemes: Vec<String> = Vec::new();
    for endpoint in endpoint_config
        .production_endpoints
        .iter()
        .chain(endpoint_config.sandbox_endpoints.iter())
    {
        if let Some((scheme, _)) = endpoint.url.split_once("://") {
            let scheme = scheme.to_ascii_lowercase();
            if !schemes.contains(&scheme) {
                schemes.push(scheme);
            }
        }
    }
    schemes
}
