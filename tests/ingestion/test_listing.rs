use super::support::{setup_app, ProjectSpec};

#[tokio::test]
async fn listing_filters_by_type_and_isolates_organizations() {
    let app = setup_app();

    let http = ProjectSpec::named("api-http", "Alpha");
    app.orchestrator.apply_standalone(&http.zip(), false).await.expect("deploy http api");

    let ws = ProjectSpec { api_type: "WS".to_string(), ..ProjectSpec::named("api-ws", "Beta") };
    app.orchestrator.apply_standalone(&ws.zip(), false).await.expect("deploy ws api");

    let foreign = ProjectSpec {
        organization_id: Some("acme".to_string()),
        ..ProjectSpec::named("api-acme", "Gamma")
    };
    app.orchestrator.apply_standalone(&foreign.zip(), false).await.expect("deploy acme api");

    let all = app.orchestrator.list_apis(None, None, "default");
    assert_eq!(all.count, 2);
    assert_eq!(all.list[0].name, "Alpha");
    assert_eq!(all.list[1].name, "Beta");

    // The type value is uppercased before matching.
    let ws_only = app.orchestrator.list_apis(Some("type:ws"), None, "default");
    assert_eq!(ws_only.count, 1);
    assert_eq!(ws_only.list[0].name, "Beta");
    assert_eq!(ws_only.list[0].api_type, "WS");

    // Unknown query keys fall back to the unfiltered list.
    let fallback = app.orchestrator.list_apis(Some("name:Alpha"), None, "default");
    assert_eq!(fallback.count, 2);

    let acme = app.orchestrator.list_apis(None, None, "acme");
    assert_eq!(acme.count, 1);
    assert_eq!(acme.list[0].name, "Gamma");
}

#[tokio::test]
async fn listing_limit_truncates_but_reports_total() {
    let app = setup_app();
    for (id, name) in [("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")] {
        let spec = ProjectSpec::named(id, name);
        app.orchestrator.apply_standalone(&spec.zip(), false).await.expect("deploy");
    }

    let limited = app.orchestrator.list_apis(None, Some(2), "default");
    assert_eq!(limited.total, 3);
    assert_eq!(limited.count, 2);
    assert_eq!(limited.list.len(), 2);

    let listing = app.orchestrator.list_apis(None, None, "default");
    assert_eq!(listing.list[0].gateway_envs, vec!["Default".to_string()]);
}
