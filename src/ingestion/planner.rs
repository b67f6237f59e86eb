//! # Deployment Planner
//!
//! Computes the placements to add and remove for one requested deployment,
//! against a snapshot of the current index. Applies are listed before
//! removes: during a cross-vhost relocation readers must observe a window
//! where the API exists under both vhosts rather than neither.

use std::collections::BTreeMap;

use crate::xds::DeploymentIndex;

/// One vhost to update together with every environment it should serve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedApply {
    pub vhost: String,
    pub environments: Vec<String>,
}

/// One vhost to undeploy from the stated environments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRemove {
    pub vhost: String,
    pub environments: Vec<String>,
}

/// The computed placement changes of one deployment request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub applies: Vec<PlannedApply>,
    pub removes: Vec<PlannedRemove>,
}

/// Compute the apply and remove sets for a requested `vhost → environments` map
///
/// For each requested vhost the apply set carries the union of the requested
/// environments and those the API already occupies under that vhost, so a
/// partial re-deploy does not orphan environments. For each requested
/// environment already served from a different vhost, that `(vhost, env)`
/// pair lands in the remove set.
pub fn plan_deployments(
    index: &DeploymentIndex,
    api_id: &str,
    vhost_to_envs: &BTreeMap<String, Vec<String>>,
) -> DeploymentPlan {
    let mut removes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut applies = Vec::new();

    for (vhost, environments) in vhost_to_envs {
        for environment in environments {
            if let Some(existing) = index.get_vhost_of_api(api_id, environment) {
                if existing != *vhost {
                    removes.entry(existing).or_default().push(environment.clone());
                }
            }
        }

        applies.push(PlannedApply {
            vhost: vhost.clone(),
            environments: index.get_all_environments(api_id, vhost, environments),
        });
    }

    DeploymentPlan {
        applies,
        removes: removes
            .into_iter()
            .map(|(vhost, environments)| PlannedRemove { vhost, environments })
            .collect(),
    }
}
