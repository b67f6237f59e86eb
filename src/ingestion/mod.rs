//! # Ingestion Orchestrator
//!
//! The public surface of the ingestion pipeline. Entry points sequence
//! Parser → Validator → Planner → Index → discovery projection, and every
//! deployment runs behind a panic boundary that rewrites unexpected failures
//! into the canonical error naming the API, so internal state never leaks to
//! callers and the index never observes a partially applied mutation.

pub mod planner;

use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::errors::{Error, Result};
use crate::project::{parser, validation, ApiMeta, ApiProject, DeployedRevision, EnvProps};
use crate::xds::XdsState;
use planner::plan_deployments;

/// File suffix of zipped API projects in the artifact directory
const ZIP_EXT: &str = ".zip";

/// Query key selecting an API-type filter in [`Orchestrator::list_apis`]
const API_TYPE_FILTER_KEY: &str = "type";

/// Sequences the ingestion pipeline over the shared discovery state
pub struct Orchestrator {
    state: Arc<XdsState>,
}

impl Orchestrator {
    pub fn new(state: Arc<XdsState>) -> Self {
        Self { state }
    }

    /// Apply a packaged project pushed by the management plane
    ///
    /// `vhost_to_envs` is the desired placement; `api_env_props` carries
    /// per-API environment overrides keyed by API id. Returns the revisions
    /// deployed, one per updated vhost.
    pub async fn apply_from_management_plane(
        &self,
        payload: &[u8],
        vhost_to_envs: &BTreeMap<String, Vec<String>>,
        api_env_props: &HashMap<String, HashMap<String, EnvProps>>,
    ) -> Result<Vec<DeployedRevision>> {
        let default_organization = &self.state.config.gateway.default_organization;
        let mut project = parser::from_archive(payload, default_organization)?;

        if let Some(env_props) = api_env_props.get(&project.manifest.data.id) {
            info!(uuid = %project.manifest.data.id, "Environment specific values found for the API");
            project.env_props = env_props.clone();
        }

        validation::validate_project(&project)?;

        // The empty vhost label is reserved; deploying to it is undefined.
        if vhost_to_envs.keys().any(|vhost| vhost.is_empty()) {
            return Err(Error::validation("deployment vhost cannot be empty"));
        }

        let data = &project.manifest.data;
        let (name, version, api_id, organization_id) = (
            data.name.clone(),
            data.version.clone(),
            data.id.clone(),
            data.organization_id.clone(),
        );
        info!(api = %name, version = %version, organization = %organization_id, "Deploying api");

        let state = self.state.clone();
        guard_deployment(&name, &version, &api_id, || {
            let plan = plan_deployments(&state.index, &api_id, vhost_to_envs);

            let mut deployed_revisions = Vec::with_capacity(plan.applies.len());
            for apply in &plan.applies {
                debug!(
                    vhost = %apply.vhost,
                    environments = ?apply.environments,
                    uuid = %api_id,
                    "Updating all environments of API"
                );
                let deployed = state
                    .index
                    .update_api(&apply.vhost, &project, &apply.environments)
                    .map_err(|err| {
                        error!(%err, uuid = %api_id, "Failed to update API");
                        Error::deployment(&name, &version, &api_id)
                    })?;
                deployed_revisions.push(deployed);
            }

            // Undeploy from vhosts that lost an environment to this request.
            for remove in &plan.removes {
                info!(
                    vhost = %remove.vhost,
                    environments = ?remove.environments,
                    uuid = %api_id,
                    "Un-deploying API from relocated vhost"
                );
                state.index.delete_apis_with_uuid(
                    &remove.vhost,
                    &api_id,
                    &remove.environments,
                    &organization_id,
                )?;
            }

            Ok(deployed_revisions)
        })
    }

    /// Apply a packaged project submitted directly to this node
    ///
    /// With `override_existing` unset the call fails with the already-exists
    /// sentinel when the project is deployed on any of its vhosts.
    pub async fn apply_standalone(&self, payload: &[u8], override_existing: bool) -> Result<()> {
        let default_organization = &self.state.config.gateway.default_organization;
        let project = parser::from_archive(payload, default_organization)?;
        self.deploy_standalone(&project, override_existing)
    }

    /// Replay every project found in the `apis/` artifact subdirectory
    ///
    /// Each child directory is parsed as an unpacked project and each
    /// `*.zip` child as an archive; anything else is noise. A broken
    /// artifact is logged and skipped, never aborting the bootstrap. An
    /// unreadable directory is fatal only when the administrative server is
    /// disabled, because then no other ingestion path exists.
    pub async fn bootstrap_from_artifacts(&self) -> Result<()> {
        let apis_dir = self.state.config.artifacts.apis_dir();

        let mut entries = match tokio::fs::read_dir(&apis_dir).await {
            Ok(entries) => entries,
            Err(err) => {
                error!(%err, directory = %apis_dir.display(), "Error while reading api artifacts during startup");
                if !self.state.config.server.enabled {
                    return Err(Error::io(
                        err,
                        format!("failed to read api artifacts directory {}", apis_dir.display()),
                    ));
                }
                return Ok(());
            }
        };

        loop {
            let entry = entries.next_entry().await.map_err(|err| {
                Error::io(
                    err,
                    format!("failed to enumerate api artifacts in {}", apis_dir.display()),
                )
            })?;
            let Some(entry) = entry else { break };

            let path = entry.path();
            let artifact = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry.file_type().await.map(|kind| kind.is_dir()).unwrap_or(false);

            if is_dir {
                let default_organization = &self.state.config.gateway.default_organization;
                let result = parser::from_directory(&path, default_organization)
                    .and_then(|project| self.deploy_standalone(&project, false));
                if let Err(err) = result {
                    error!(%err, artifact = %artifact, "Error while processing api artifact during startup");
                }
                continue;
            }

            if !artifact.ends_with(ZIP_EXT) {
                debug!(artifact = %artifact, "Skipping unrecognized artifact");
                continue;
            }

            let payload = match tokio::fs::read(&path).await {
                Ok(payload) => payload,
                Err(err) => {
                    error!(%err, artifact = %artifact, "Error while reading api artifact during startup");
                    continue;
                }
            };
            if let Err(err) = self.apply_standalone(&payload, false).await {
                error!(%err, artifact = %artifact, "Error while processing api artifact during startup");
            }
        }

        Ok(())
    }

    /// List the deployed APIs of an organization
    ///
    /// A query of the form `type:<value>` filters by uppercased API type;
    /// any other query yields the unfiltered list.
    pub fn list_apis(
        &self,
        query: Option<&str>,
        limit: Option<usize>,
        organization_id: &str,
    ) -> ApiMeta {
        if let Some((key, value)) = query.and_then(|q| q.split_once(':')) {
            if key == API_TYPE_FILTER_KEY {
                return self.state.index.list_apis(
                    &value.to_uppercase(),
                    organization_id,
                    limit,
                );
            }
        }
        self.state.index.list_apis("", organization_id, limit)
    }

    /// Validate and deploy a parsed project to its own deployment targets
    fn deploy_standalone(&self, project: &ApiProject, override_existing: bool) -> Result<()> {
        validation::validate_project(project)?;

        let deployments =
            validation::effective_deployments(project, &self.state.config.gateway);
        let data = &project.manifest.data;
        let (name, version, api_id) = (data.name.clone(), data.version.clone(), data.id.clone());

        let state = self.state.clone();
        guard_deployment(&name, &version, &api_id, || {
            if !override_existing {
                // If the API already exists on at least one of the vhosts,
                // break deployment of the API.
                let exists = deployments.iter().any(|deployment| {
                    state.index.is_api_exist(
                        &deployment.vhost,
                        &api_id,
                        &name,
                        &version,
                        &data.organization_id,
                    )
                });
                if exists {
                    info!(api = %name, version = %version, "Error creating new API. API already exists.");
                    return Err(Error::AlreadyExists);
                }
            }

            let mut vhost_to_envs: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for deployment in &deployments {
                vhost_to_envs
                    .entry(deployment.vhost.clone())
                    .or_default()
                    .push(deployment.environment.clone());
            }

            for (vhost, environments) in &vhost_to_envs {
                state.index.update_api(vhost, project, environments)?;
            }
            Ok(())
        })
    }
}

/// Convert a panic inside a deployment into the canonical deployment error
///
/// The closure must not mutate shared state before its last fallible step;
/// index commits are infallible once reached, so a caught panic implies the
/// index was left untouched by the failing stage.
fn guard_deployment<T>(
    name: &str,
    version: &str,
    api_id: &str,
    deploy: impl FnOnce() -> Result<T>,
) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(deploy)) {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            error!(reason = %reason, "Recovered from panic");
            Err(Error::deployment(name, version, api_id))
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
