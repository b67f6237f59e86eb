//! # Deployment Index
//!
//! Process-wide state mapping organizations, vhosts, gateway environments and
//! API identities to deployed revisions. All mutations go through this type
//! under a single writer lock; reads run concurrently with other reads.
//!
//! Mutations follow a compute-then-commit discipline: everything fallible
//! (type and endpoint checks, the discovery projection) happens before the
//! write guard is taken, and the commit itself is infallible. The snapshot
//! version bump and the republish signal are emitted while the guard is still
//! held, so subscribers always observe a snapshot consistent with the mapping
//! just committed.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::project::validation;
use crate::project::{ApiMeta, ApiMetaEntry, ApiProject, DeployedRevision};
use crate::xds::resources::{api_from_project, Api};

/// Identity of one deployment of an API under a vhost
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DeploymentKey {
    vhost: String,
    organization_id: String,
    api_id: String,
}

/// A deployed revision held by the index
#[derive(Debug)]
struct DeployedApi {
    revision_id: u32,
    environments: BTreeSet<String>,
    api: Arc<Api>,
}

#[derive(Default)]
struct IndexInner {
    /// `(api_id, environment)` to the single vhost serving it there
    vhost_by_env: HashMap<(String, String), String>,

    /// Active revision per `(vhost, organization, api_id)`
    deployments: HashMap<DeploymentKey, DeployedApi>,
}

/// The multi-tenant deployment index feeding the discovery layer
#[derive(Debug)]
pub struct DeploymentIndex {
    inner: RwLock<IndexInner>,
    version: AtomicU64,
    update_tx: broadcast::Sender<u64>,
}

impl std::fmt::Debug for IndexInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexInner")
            .field("deployments", &self.deployments.len())
            .field("environment_mappings", &self.vhost_by_env.len())
            .finish()
    }
}

impl Default for DeploymentIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentIndex {
    pub fn new() -> Self {
        let (update_tx, _) = broadcast::channel(128);
        Self { inner: RwLock::new(IndexInner::default()), version: AtomicU64::new(1), update_tx }
    }

    /// Whether this exact API (by id, name and version) is deployed under the vhost
    pub fn is_api_exist(
        &self,
        vhost: &str,
        api_id: &str,
        name: &str,
        version: &str,
        organization_id: &str,
    ) -> bool {
        let inner = self.inner.read();
        inner
            .deployments
            .get(&DeploymentKey {
                vhost: vhost.to_string(),
                organization_id: organization_id.to_string(),
                api_id: api_id.to_string(),
            })
            .map(|deployed| deployed.api.name == name && deployed.api.version == version)
            .unwrap_or(false)
    }

    /// The vhost an API is served from in the given environment, if any
    pub fn get_vhost_of_api(&self, api_id: &str, environment: &str) -> Option<String> {
        let inner = self.inner.read();
        inner.vhost_by_env.get(&(api_id.to_string(), environment.to_string())).cloned()
    }

    /// The revision currently active for a deployment, if any
    pub fn get_active_revision(
        &self,
        vhost: &str,
        api_id: &str,
        organization_id: &str,
    ) -> Option<u32> {
        let inner = self.inner.read();
        inner
            .deployments
            .get(&DeploymentKey {
                vhost: vhost.to_string(),
                organization_id: organization_id.to_string(),
                api_id: api_id.to_string(),
            })
            .map(|deployed| deployed.revision_id)
    }

    /// Union of the requested environments and those the API already occupies
    /// under the same vhost
    ///
    /// A partial re-deploy must not orphan environments that an earlier call
    /// placed under this vhost.
    pub fn get_all_environments(
        &self,
        api_id: &str,
        vhost: &str,
        requested: &[String],
    ) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        for environment in requested {
            if !merged.contains(environment) {
                merged.push(environment.clone());
            }
        }

        let inner = self.inner.read();
        for (key, deployed) in &inner.deployments {
            if key.vhost == vhost && key.api_id == api_id {
                for environment in &deployed.environments {
                    if !merged.contains(environment) {
                        merged.push(environment.clone());
                    }
                }
            }
        }
        merged
    }

    /// Deploy or replace an API revision under the vhost for the given environments
    pub fn update_api(
        &self,
        vhost: &str,
        project: &ApiProject,
        environments: &[String],
    ) -> Result<DeployedRevision> {
        let data = &project.manifest.data;

        // Defense in depth; the validator ran before the orchestrator got here.
        if vhost.is_empty() {
            return Err(Error::validation("deployment vhost cannot be empty"));
        }
        validation::validate_project(project)?;

        let key = DeploymentKey {
            vhost: vhost.to_string(),
            organization_id: data.organization_id.clone(),
            api_id: data.id.clone(),
        };
        let revision_id = project.revision_id();
        let api = Arc::new(api_from_project(project, vhost));
        let deployed = DeployedApi {
            revision_id,
            environments: environments.iter().cloned().collect(),
            api,
        };

        let version = {
            let mut inner = self.inner.write();
            for environment in environments {
                inner
                    .vhost_by_env
                    .insert((data.id.clone(), environment.clone()), vhost.to_string());
            }
            inner.deployments.insert(key, deployed);
            self.bump_version()
        };

        info!(
            api = %data.name,
            version = %data.version,
            uuid = %data.id,
            vhost = %vhost,
            revision = revision_id,
            snapshot = version,
            "Deployed API revision"
        );

        Ok(DeployedRevision {
            api_id: data.id.clone(),
            revision_id,
            organization_id: data.organization_id.clone(),
            vhost: vhost.to_string(),
            environments: environments.to_vec(),
        })
    }

    /// Undeploy an API from the stated environments of one vhost
    ///
    /// An empty vhost is a no-op: the reserved empty label is never stored,
    /// and removing "all vhosts" by accident must be impossible. When the
    /// last environment of a deployment is removed the project is evicted.
    pub fn delete_apis_with_uuid(
        &self,
        vhost: &str,
        api_id: &str,
        environments: &[String],
        organization_id: &str,
    ) -> Result<()> {
        if vhost.is_empty() {
            debug!(uuid = %api_id, "Skipping undeploy for empty vhost");
            return Ok(());
        }

        let key = DeploymentKey {
            vhost: vhost.to_string(),
            organization_id: organization_id.to_string(),
            api_id: api_id.to_string(),
        };

        let version = {
            let mut inner = self.inner.write();
            for environment in environments {
                let env_key = (api_id.to_string(), environment.clone());
                // Only clear the mapping while it still points at this vhost;
                // a relocation may already have claimed the environment.
                if inner.vhost_by_env.get(&env_key).map(String::as_str) == Some(vhost) {
                    inner.vhost_by_env.remove(&env_key);
                }
            }

            let evict = match inner.deployments.get_mut(&key) {
                Some(deployed) => {
                    for environment in environments {
                        deployed.environments.remove(environment);
                    }
                    deployed.environments.is_empty()
                }
                None => false,
            };
            if evict {
                inner.deployments.remove(&key);
            }
            self.bump_version()
        };

        info!(
            uuid = %api_id,
            vhost = %vhost,
            environments = ?environments,
            snapshot = version,
            "Undeployed API"
        );
        Ok(())
    }

    /// List deployed APIs of an organization, optionally filtered by type
    pub fn list_apis(
        &self,
        api_type: &str,
        organization_id: &str,
        limit: Option<usize>,
    ) -> ApiMeta {
        let inner = self.inner.read();
        let mut entries: Vec<ApiMetaEntry> = inner
            .deployments
            .iter()
            .filter(|(key, deployed)| {
                key.organization_id == organization_id
                    && (api_type.is_empty() || deployed.api.api_type == api_type)
            })
            .map(|(_, deployed)| ApiMetaEntry {
                id: deployed.api.id.clone(),
                name: deployed.api.name.clone(),
                version: deployed.api.version.clone(),
                api_type: deployed.api.api_type.clone(),
                context: deployed.api.context.clone(),
                gateway_envs: deployed.environments.iter().cloned().collect(),
            })
            .collect();

        entries.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
        let total = entries.len();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        ApiMeta { total, count: entries.len(), list: entries }
    }

    /// The APIs currently deployed to a gateway environment
    pub fn snapshot_for_environment(&self, environment: &str) -> Vec<Arc<Api>> {
        let inner = self.inner.read();
        let mut apis: Vec<Arc<Api>> = inner
            .deployments
            .values()
            .filter(|deployed| deployed.environments.contains(environment))
            .map(|deployed| deployed.api.clone())
            .collect();
        apis.sort_by(|a, b| (&a.name, &a.version, &a.vhost).cmp(&(&b.name, &b.version, &b.vhost)));
        apis
    }

    /// Current snapshot version
    pub fn get_version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Subscribe to snapshot republish signals
    pub fn subscribe_updates(&self) -> broadcast::Receiver<u64> {
        self.update_tx.subscribe()
    }

    fn bump_version(&self) -> u64 {
        let new_version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self.update_tx.send(new_version);
        new_version
    }
}
