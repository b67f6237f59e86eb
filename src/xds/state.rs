//! Shared discovery-layer state: the deployment index plus the snapshot
//! version observed by discovery subscribers.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::xds::index::DeploymentIndex;

/// Shared xDS server state, owning the deployment index and configuration
#[derive(Debug)]
pub struct XdsState {
    pub config: AppConfig,
    pub index: DeploymentIndex,
}

impl XdsState {
    pub fn new(config: AppConfig) -> Self {
        Self { config, index: DeploymentIndex::new() }
    }

    /// Wrap the state for sharing with the orchestrator and collaborators
    pub fn shared(config: AppConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn get_version(&self) -> String {
        self.index.get_version().to_string()
    }

    pub fn get_version_number(&self) -> u64 {
        self.index.get_version()
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<u64> {
        self.index.subscribe_updates()
    }
}
