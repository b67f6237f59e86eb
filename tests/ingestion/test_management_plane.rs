use std::collections::HashMap;

use setu::errors::Error;
use setu::project::EnvProps;

use super::support::{setup_app, vhost_map, ProjectSpec};

fn no_env_props() -> HashMap<String, HashMap<String, EnvProps>> {
    HashMap::new()
}

#[tokio::test]
async fn deploys_to_every_requested_environment() {
    let app = setup_app();
    let spec = ProjectSpec::default();

    let deployed = app
        .orchestrator
        .apply_from_management_plane(
            &spec.zip(),
            &vhost_map(&[("api.example.com", &["Production", "Sandbox"])]),
            &no_env_props(),
        )
        .await
        .expect("deploy from management plane");

    assert_eq!(deployed.len(), 1);
    assert_eq!(deployed[0].vhost, "api.example.com");
    assert_eq!(deployed[0].revision_id, 1);
    for environment in ["Production", "Sandbox"] {
        assert_eq!(
            app.state.index.get_vhost_of_api("api-1", environment).as_deref(),
            Some("api.example.com")
        );
    }
}

#[tokio::test]
async fn cross_vhost_relocation_removes_old_vhost() {
    let app = setup_app();
    let spec = ProjectSpec::default();

    app.orchestrator
        .apply_from_management_plane(&spec.zip(), &vhost_map(&[("v1", &["e1"])]), &no_env_props())
        .await
        .expect("seed deployment on v1");

    app.orchestrator
        .apply_from_management_plane(&spec.zip(), &vhost_map(&[("v2", &["e1"])]), &no_env_props())
        .await
        .expect("relocate to v2");

    assert_eq!(app.state.index.get_vhost_of_api("api-1", "e1").as_deref(), Some("v2"));
    assert!(!app.state.index.is_api_exist("v1", "api-1", "PetStore", "1.0.0", "default"));
    assert!(app.state.index.is_api_exist("v2", "api-1", "PetStore", "1.0.0", "default"));
}

#[tokio::test]
async fn partial_redeploy_keeps_prior_environments() {
    let app = setup_app();
    let spec = ProjectSpec::default();

    app.orchestrator
        .apply_from_management_plane(
            &spec.zip(),
            &vhost_map(&[("v1", &["e1", "e2"])]),
            &no_env_props(),
        )
        .await
        .expect("seed both environments");

    let deployed = app
        .orchestrator
        .apply_from_management_plane(&spec.zip(), &vhost_map(&[("v1", &["e1"])]), &no_env_props())
        .await
        .expect("partial redeploy");

    // e2 must not be orphaned by the partial request.
    assert!(deployed[0].environments.contains(&"e2".to_string()));
    assert_eq!(app.state.index.get_vhost_of_api("api-1", "e2").as_deref(), Some("v1"));
}

#[tokio::test]
async fn identical_calls_are_idempotent() {
    let app = setup_app();
    let spec = ProjectSpec::default();
    let placement = vhost_map(&[("v1", &["e1"])]);

    let first = app
        .orchestrator
        .apply_from_management_plane(&spec.zip(), &placement, &no_env_props())
        .await
        .expect("first apply");
    let second = app
        .orchestrator
        .apply_from_management_plane(&spec.zip(), &placement, &no_env_props())
        .await
        .expect("second apply");

    assert_eq!(first, second);
    let listing = app.orchestrator.list_apis(None, None, "default");
    assert_eq!(listing.count, 1);
}

#[tokio::test]
async fn empty_vhost_key_is_rejected() {
    let app = setup_app();
    let spec = ProjectSpec::default();

    let err = app
        .orchestrator
        .apply_from_management_plane(&spec.zip(), &vhost_map(&[("", &["e1"])]), &no_env_props())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert!(app.state.index.get_vhost_of_api("api-1", "e1").is_none());
}

#[tokio::test]
async fn republish_signal_fires_inside_deployment() {
    let app = setup_app();
    let mut updates = app.state.subscribe_updates();
    let spec = ProjectSpec::default();

    app.orchestrator
        .apply_from_management_plane(&spec.zip(), &vhost_map(&[("v1", &["e1"])]), &no_env_props())
        .await
        .expect("deploy");

    let version = updates.try_recv().expect("republish signal");
    assert_eq!(version, app.state.get_version_number());
    assert_eq!(app.state.index.snapshot_for_environment("e1").len(), 1);
}

#[tokio::test]
async fn environment_props_are_merged_by_api_id() {
    let app = setup_app();
    let spec = ProjectSpec::default();

    let mut api_env_props = HashMap::new();
    let mut props = HashMap::new();
    props.insert(
        "e1".to_string(),
        EnvProps {
            production_endpoint: Some("https://override:9443".to_string()),
            sandbox_endpoint: None,
        },
    );
    api_env_props.insert("api-1".to_string(), props);

    app.orchestrator
        .apply_from_management_plane(&spec.zip(), &vhost_map(&[("v1", &["e1"])]), &api_env_props)
        .await
        .expect("deploy with env props");

    // Overrides for an unrelated API id must not block the deployment.
    assert!(app.state.index.is_api_exist("v1", "api-1", "PetStore", "1.0.0", "default"));
}
