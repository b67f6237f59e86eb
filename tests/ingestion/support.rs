use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::sync::Arc;

use serde_json::json;
use zip::write::SimpleFileOptions;

use setu::config::AppConfig;
use setu::ingestion::Orchestrator;
use setu::xds::XdsState;

pub struct IngestionApp {
    pub state: Arc<XdsState>,
    pub orchestrator: Orchestrator,
}

pub fn setup_app() -> IngestionApp {
    setup_app_with_config(AppConfig::default())
}

pub fn setup_app_with_config(config: AppConfig) -> IngestionApp {
    let state = XdsState::shared(config);
    let orchestrator = Orchestrator::new(state.clone());
    IngestionApp { state, orchestrator }
}

/// Declarative description of a test API project
pub struct ProjectSpec {
    pub id: String,
    pub name: String,
    pub version: String,
    pub api_type: String,
    pub context: String,
    pub organization_id: Option<String>,
    pub revision_id: u32,
    pub production_endpoints: serde_json::Value,
    pub sandbox_endpoints: serde_json::Value,
    /// `(environment, vhost)` pairs; empty means no deployment file is written
    pub deployments: Vec<(String, String)>,
}

impl Default for ProjectSpec {
    fn default() -> Self {
        Self {
            id: "api-1".to_string(),
            name: "PetStore".to_string(),
            version: "1.0.0".to_string(),
            api_type: "HTTP".to_string(),
            context: "/petstore".to_string(),
            organization_id: None,
            revision_id: 1,
            production_endpoints: json!({"url": "https://backend:9443"}),
            sandbox_endpoints: serde_json::Value::Null,
            deployments: Vec::new(),
        }
    }
}

impl ProjectSpec {
    pub fn named(id: &str, name: &str) -> Self {
        Self { id: id.to_string(), name: name.to_string(), ..Self::default() }
    }

    pub fn with_deployment(mut self, environment: &str, vhost: &str) -> Self {
        self.deployments.push((environment.to_string(), vhost.to_string()));
        self
    }

    pub fn manifest(&self) -> serde_json::Value {
        let mut data = json!({
            "Id": self.id,
            "name": self.name,
            "context": self.context,
            "version": self.version,
            "revisionId": self.revision_id,
            "type": self.api_type,
            "lifeCycleStatus": "PUBLISHED",
            "endpointConfig": {
                "endpoint_type": "http",
                "production_endpoints": self.production_endpoints,
                "sandbox_endpoints": self.sandbox_endpoints,
            },
            "Operations": [
                {"target": "/pets", "verb": "GET", "operationPolicies": {}},
                {"target": "/pets", "verb": "POST", "operationPolicies": {}}
            ]
        });
        if let Some(org) = &self.organization_id {
            data["organizationId"] = json!(org);
        }
        json!({"type": "api", "version": "v4", "data": data})
    }

    fn deployments_file(&self) -> String {
        let entries: Vec<serde_json::Value> = self
            .deployments
            .iter()
            .map(|(environment, vhost)| {
                json!({
                    "displayOnDevportal": true,
                    "deploymentEnvironment": environment,
                    "deploymentVhost": vhost,
                })
            })
            .collect();
        serde_json::to_string(&json!({"type": "deployment_environments", "data": entries}))
            .expect("serialize deployments file")
    }

    /// Entries to write into an archive or a project directory
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries = vec![(
            format!("{}-{}/api.json", self.name, self.version),
            serde_json::to_vec(&self.manifest()).expect("serialize manifest"),
        )];
        if !self.deployments.is_empty() {
            entries.push((
                format!("{}-{}/deployment_environments.yaml", self.name, self.version),
                self.deployments_file().into_bytes(),
            ));
        }
        entries
    }

    pub fn zip(&self) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, bytes) in self.entries() {
                writer
                    .start_file(name, SimpleFileOptions::default())
                    .expect("start archive entry");
                writer.write_all(&bytes).expect("write archive entry");
            }
            writer.finish().expect("finish archive");
        }
        cursor.into_inner()
    }

    /// Write the project as an unpacked directory under `parent`
    pub fn write_directory(&self, parent: &std::path::Path) {
        for (name, bytes) in self.entries() {
            let path = parent.join(name);
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).expect("create project subdirectory");
            }
            std::fs::write(path, bytes).expect("write project file");
        }
    }
}

pub fn vhost_map(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(vhost, envs)| (vhost.to_string(), envs.iter().map(|e| e.to_string()).collect()))
        .collect()
}
