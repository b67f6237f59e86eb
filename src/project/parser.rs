//! # Project Parser
//!
//! Builds an [`ApiProject`] from an apictl-style archive or an unpacked
//! project directory. Every entry is dispatched on its path; unrecognized
//! entries are ignored for forward compatibility.

use std::io::{Cursor, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;
use zip::ZipArchive;

use crate::errors::{Error, Result};
use crate::project::manifest::ApiManifest;
use crate::project::model::{
    ApiProject, DeploymentEnvironmentsFile, EndpointCertificatesFile, PolicyContainer,
    RevisionMeta,
};

const MANIFEST_YAML: &str = "api.yaml";
const MANIFEST_JSON: &str = "api.json";
const DEPLOYMENTS_FILE: &str = "deployment_environments.yaml";
const REVISION_META_FILE: &str = "api_meta.yaml";
const ENDPOINT_CERTS_INDEX: &str = "endpoint_certificates.yaml";
const DEFINITIONS_DIR: &str = "Definitions/";
const ENDPOINT_CERTS_DIR: &str = "Endpoint-certificates/";
const POLICIES_DIR: &str = "Policies/";

/// Parse a zipped API project
pub fn from_archive(payload: &[u8], default_organization: &str) -> Result<ApiProject> {
    let mut archive = ZipArchive::new(Cursor::new(payload))?;
    let mut builder = ProjectBuilder::new(default_organization);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        debug!(entry = %name, "Reading project archive entry");

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io(e, format!("failed to read archive entry {}", name)))?;
        builder.process_entry(&name, bytes)?;
    }

    builder.finish()
}

/// Parse an unpacked API project directory
pub fn from_directory(root: &Path, default_organization: &str) -> Result<ApiProject> {
    let mut builder = ProjectBuilder::new(default_organization);
    visit_directory(root, root, &mut builder)?;
    builder.finish()
}

fn visit_directory(root: &Path, dir: &Path, builder: &mut ProjectBuilder) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::io(e, format!("failed to read project directory {}", dir.display())))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| Error::io(e, format!("failed to read project directory {}", dir.display())))?;
        let path = entry.path();
        if path.is_dir() {
            visit_directory(root, &path, builder)?;
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(&path);
        let name = relative.to_string_lossy().replace('\\', "/");
        debug!(entry = %name, "Reading project directory entry");

        let bytes = std::fs::read(&path)
            .map_err(|e| Error::io(e, format!("failed to read project file {}", path.display())))?;
        builder.process_entry(&name, bytes)?;
    }

    Ok(())
}

struct ProjectBuilder {
    project: ApiProject,
    manifest_seen: bool,
    default_organization: String,
}

impl ProjectBuilder {
    fn new(default_organization: &str) -> Self {
        Self {
            project: ApiProject::default(),
            manifest_seen: false,
            default_organization: default_organization.to_string(),
        }
    }

    /// Dispatch one project entry on its path
    fn process_entry(&mut self, entry_name: &str, bytes: Vec<u8>) -> Result<()> {
        let basename = entry_name.rsplit('/').next().unwrap_or(entry_name);

        if basename == MANIFEST_YAML || basename == MANIFEST_JSON {
            self.project.manifest = ApiManifest::from_bytes(&bytes, &self.default_organization)?;
            self.manifest_seen = true;
        } else if basename == DEPLOYMENTS_FILE {
            let file: DeploymentEnvironmentsFile = decode_entry(entry_name, &bytes)?;
            self.project.deployments = Some(file.data);
        } else if basename == REVISION_META_FILE {
            let meta: RevisionMeta = decode_entry(entry_name, &bytes)?;
            self.project.revision_meta = Some(meta);
        } else if entry_name.contains(DEFINITIONS_DIR)
            && (basename == "swagger.yaml" || basename == "swagger.json")
        {
            self.project.openapi_definition = Some(bytes);
        } else if basename == ENDPOINT_CERTS_INDEX {
            let file: EndpointCertificatesFile = decode_entry(entry_name, &bytes)?;
            for cert in file.data {
                self.project.endpoint_certs.insert(cert.certificate, cert.endpoint);
            }
        } else if entry_name.contains(ENDPOINT_CERTS_DIR) {
            self.project.upstream_certs.insert(basename.to_string(), bytes);
        } else if entry_name.contains(POLICIES_DIR) && has_extension(basename, &["yaml", "json"]) {
            let container: PolicyContainer = decode_entry(entry_name, &bytes)?;
            let policy_name = basename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(basename);
            self.project.policies.insert(policy_name.to_string(), container);
        } else {
            debug!(entry = %entry_name, "Ignoring unrecognized project entry");
        }

        Ok(())
    }

    fn finish(self) -> Result<ApiProject> {
        if !self.manifest_seen {
            return Err(Error::ManifestAbsent);
        }
        Ok(self.project)
    }
}

fn has_extension(basename: &str, extensions: &[&str]) -> bool {
    basename
        .rsplit_once('.')
        .map(|(_, ext)| extensions.contains(&ext))
        .unwrap_or(false)
}

/// Decode an auxiliary YAML or JSON project entry
fn decode_entry<T: DeserializeOwned>(entry_name: &str, bytes: &[u8]) -> Result<T> {
    let document: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(document) => document,
        Err(json_err) => serde_yaml::from_slice(bytes).map_err(|yaml_err| {
            Error::invalid_manifest(format!(
                "project entry {} is neither valid JSON ({}) nor valid YAML ({})",
                entry_name, json_err, yaml_err
            ))
        })?,
    };

    serde_json::from_value(document).map_err(|e| {
        Error::invalid_manifest(format!("failed to decode project entry {}: {}", entry_name, e))
    })
}
