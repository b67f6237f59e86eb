use setu::errors::Error;

use super::support::{setup_app, ProjectSpec};

#[tokio::test]
async fn create_new_api_deploys_to_default_vhost() {
    let app = setup_app();
    let spec = ProjectSpec::default();

    app.orchestrator
        .apply_standalone(&spec.zip(), false)
        .await
        .expect("create new API");

    assert!(app.state.index.is_api_exist("localhost", "api-1", "PetStore", "1.0.0", "default"));
    assert_eq!(
        app.state.index.get_vhost_of_api("api-1", "Default").as_deref(),
        Some("localhost")
    );
}

#[tokio::test]
async fn duplicate_without_override_is_rejected_and_state_unchanged() {
    let app = setup_app();
    let spec = ProjectSpec::default();

    app.orchestrator.apply_standalone(&spec.zip(), false).await.expect("first create");
    let version_before = app.state.get_version_number();

    let err = app.orchestrator.apply_standalone(&spec.zip(), false).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists));
    assert_eq!(err.to_string(), "Already exists");
    assert_eq!(app.state.get_version_number(), version_before);
}

#[tokio::test]
async fn override_replaces_active_revision() {
    let app = setup_app();
    let first = ProjectSpec::default();
    app.orchestrator.apply_standalone(&first.zip(), false).await.expect("first create");

    let second = ProjectSpec { revision_id: 2, ..ProjectSpec::default() };
    app.orchestrator.apply_standalone(&second.zip(), true).await.expect("override deploy");

    let snapshot = app.state.index.snapshot_for_environment("Default");
    assert_eq!(snapshot.len(), 1);
    assert!(app.state.index.is_api_exist("localhost", "api-1", "PetStore", "1.0.0", "default"));
    assert_eq!(app.state.index.get_active_revision("localhost", "api-1", "default"), Some(2));
}

#[tokio::test]
async fn standalone_honors_project_deployment_list() {
    let app = setup_app();
    let spec = ProjectSpec::default()
        .with_deployment("Production", "api.example.com")
        .with_deployment("Sandbox", "sandbox.example.com");

    app.orchestrator.apply_standalone(&spec.zip(), false).await.expect("create");

    assert_eq!(
        app.state.index.get_vhost_of_api("api-1", "Production").as_deref(),
        Some("api.example.com")
    );
    assert_eq!(
        app.state.index.get_vhost_of_api("api-1", "Sandbox").as_deref(),
        Some("sandbox.example.com")
    );
    assert!(app.state.index.get_vhost_of_api("api-1", "Default").is_none());
}

#[tokio::test]
async fn organization_defaults_to_control_plane_tenant() {
    let app = setup_app();
    let spec = ProjectSpec::default();
    app.orchestrator.apply_standalone(&spec.zip(), false).await.expect("create");

    // The manifest carried no organizationId; the configured default applies.
    let listing = app.orchestrator.list_apis(None, None, "default");
    assert_eq!(listing.count, 1);
    assert_eq!(listing.list[0].name, "PetStore");
}
