use setu::config::{AppConfig, ArtifactsConfig, ServerConfig};

use super::support::{setup_app_with_config, ProjectSpec};

fn config_for(artifacts_root: &std::path::Path) -> AppConfig {
    AppConfig {
        artifacts: ArtifactsConfig { directory: artifacts_root.to_string_lossy().to_string() },
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn bootstrap_deploys_valid_artifacts_and_skips_broken_ones() {
    let root = tempfile::tempdir().expect("create artifacts root");
    let apis_dir = root.path().join("apis");
    std::fs::create_dir_all(&apis_dir).expect("create apis dir");

    // One valid unpacked project directory.
    ProjectSpec::named("api-dir", "Mounted").write_directory(&apis_dir);

    // One valid zipped project.
    let zipped = ProjectSpec::named("api-zip", "Zipped");
    std::fs::write(apis_dir.join("zipped.zip"), zipped.zip()).expect("write zip artifact");

    // One corrupt archive and one unrecognized file; both must be skipped.
    std::fs::write(apis_dir.join("broken.zip"), b"not really a zip").expect("write broken zip");
    std::fs::write(apis_dir.join("readme.txt"), b"noise").expect("write noise file");

    let app = setup_app_with_config(config_for(root.path()));
    app.orchestrator.bootstrap_from_artifacts().await.expect("bootstrap succeeds");

    assert!(app.state.index.is_api_exist("localhost", "api-dir", "Mounted", "1.0.0", "default"));
    assert!(app.state.index.is_api_exist("localhost", "api-zip", "Zipped", "1.0.0", "default"));
    let listing = app.orchestrator.list_apis(None, None, "default");
    assert_eq!(listing.count, 2);
}

#[tokio::test]
async fn bootstrap_artifacts_use_standalone_create_semantics() {
    let root = tempfile::tempdir().expect("create artifacts root");
    let apis_dir = root.path().join("apis");
    std::fs::create_dir_all(&apis_dir).expect("create apis dir");

    let spec = ProjectSpec::default().with_deployment("Production", "api.example.com");
    std::fs::write(apis_dir.join("petstore.zip"), spec.zip()).expect("write zip artifact");

    let app = setup_app_with_config(config_for(root.path()));
    app.orchestrator.bootstrap_from_artifacts().await.expect("bootstrap succeeds");

    assert_eq!(
        app.state.index.get_vhost_of_api("api-1", "Production").as_deref(),
        Some("api.example.com")
    );
}

#[tokio::test]
async fn unreadable_directory_fails_only_when_server_disabled() {
    let root = tempfile::tempdir().expect("create artifacts root");
    // No apis/ subdirectory is created, so read_dir fails.

    let enabled = setup_app_with_config(config_for(root.path()));
    enabled
        .orchestrator
        .bootstrap_from_artifacts()
        .await
        .expect("server enabled proceeds with empty state");
    assert_eq!(enabled.orchestrator.list_apis(None, None, "default").count, 0);

    let disabled = setup_app_with_config(AppConfig {
        server: ServerConfig { enabled: false },
        ..config_for(root.path())
    });
    let err = disabled.orchestrator.bootstrap_from_artifacts().await.unwrap_err();
    assert!(matches!(err, setu::errors::Error::Io { .. }));
}
