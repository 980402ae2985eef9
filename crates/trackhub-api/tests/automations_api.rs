//! HTTP-level tests for the automations API surface, driven against a
//! mock GraphQL backend.

use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trackhub_api::{Api, ApiError, AutomationsFilter, CreateOptions, Settings};
use trackhub_automations::{
    Automation, AutomationUpdates, Event, NoOpActionInput, Scope, ScopeType,
};

fn wrapped_filter() -> String {
    let inner = json!({"$or": [{"$and": []}]});
    json!({"filter": inner.to_string()}).to_string()
}

fn trigger_json(id: &str, name: &str, description: Option<&str>) -> Value {
    json!({
        "id": id,
        "createdBy": {"id": "VXNlcjox", "username": "test-user"},
        "createdAt": "2026-05-01T12:00:00Z",
        "updatedAt": null,
        "name": name,
        "description": description,
        "enabled": true,
        "scope": {"__typename": "Project", "id": "UHJvamVjdDox", "name": "test-project"},
        "event": {
            "__typename": "FilterEventTriggeringCondition",
            "eventType": "CREATE_ARTIFACT",
            "filter": wrapped_filter(),
        },
        "action": {"__typename": "NoOpTriggeredAction", "noOp": true},
    })
}

fn run_metric_trigger_json(id: &str, name: &str) -> Value {
    let metric_filter = json!({
        "name": "loss",
        "window_size": 5,
        "agg_op": "AVERAGE",
        "cmp_op": "$gt",
        "threshold": 0.5,
    });
    let run_metric = json!({
        "run_filter": json!({"$and": []}).to_string(),
        "metric_filter": metric_filter.to_string(),
    });
    json!({
        "id": id,
        "createdBy": {"id": "VXNlcjox"},
        "createdAt": "2026-05-01T12:00:00Z",
        "updatedAt": null,
        "name": name,
        "description": null,
        "enabled": true,
        "scope": {"__typename": "Project", "id": "UHJvamVjdDox", "name": "test-project"},
        "event": {
            "__typename": "FilterEventTriggeringCondition",
            "eventType": "RUN_METRIC",
            "filter": run_metric.to_string(),
        },
        "action": {
            "__typename": "GenericWebhookTriggeredAction",
            "integration": {"id": "SW50ZWdyYXRpb246MQ==", "name": "ci-hook"},
            "requestPayload": "{}",
        },
    })
}

fn page_json(triggers: Vec<Value>, has_next_page: bool, end_cursor: Option<&str>) -> Value {
    json!({
        "data": {
            "searchScope": {
                "projects": {
                    "edges": [{"node": {"triggers": triggers}}],
                    "pageInfo": {"hasNextPage": has_next_page, "endCursor": end_cursor},
                }
            }
        }
    })
}

async fn api_for(server: &MockServer) -> Api {
    Api::new(Settings::new(server.uri())).unwrap()
}

#[tokio::test]
async fn test_pagination_preserves_count_and_order() {
    let server = MockServer::start().await;

    // Page 1 (no cursor yet): two records, more to come.
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("TriggersForViewer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![trigger_json("VDox", "a", None), trigger_json("VDoy", "b", None)],
            true,
            Some("cursor-1"),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Page 2, requested with the cursor from page 1: final page.
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("cursor-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![trigger_json("VDoz", "c", None)],
            false,
            None,
        )))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let mut pager = api.automations(&AutomationsFilter::default());

    // More pages remain before anything was fetched.
    assert!(pager.more());
    assert_eq!(pager.cursor(), None);

    let first = pager.next_page().await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(pager.more());
    assert_eq!(pager.cursor(), Some("cursor-1"));

    let second = pager.next_page().await.unwrap();
    assert_eq!(second.len(), 1);
    assert!(!pager.more());

    let names: Vec<&str> = first
        .iter()
        .chain(second.iter())
        .map(|automation| automation.name.as_str())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);

    // Past the end, the pager yields empty pages without a fetch.
    assert_eq!(pager.next_page().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_page_shape_is_a_descriptive_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"searchScope": {"projects": {"edges": "not-a-list"}}}
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let mut pager = api.automations(&AutomationsFilter::default());
    let err = pager.next_page().await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_create_then_fetch_then_delete_round_trip() {
    let server = MockServer::start().await;
    let trigger = trigger_json("VHJpZ2dlcjox", "test-automation", Some("test-description"));

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("CreateFilterTrigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"createFilterTrigger": {"trigger": trigger}}
        })))
        .mount(&server)
        .await;
    // First listing returns the created automation, the one after the
    // delete is empty.
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("TriggersForViewer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![trigger.clone()], false, None)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("DeleteTrigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"deleteTrigger": {"success": true}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("TriggersForViewer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], false, None)))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let draft = Event::on_create_artifact(Scope::project("UHJvamVjdDox"))
        >> NoOpActionInput::default();
    let options = CreateOptions {
        updates: AutomationUpdates::new()
            .name("test-automation")
            .description("test-description"),
        ..CreateOptions::default()
    };

    let created = api.create_automation(&draft, &options).await.unwrap();
    assert_eq!(created.name, "test-automation");

    // Fetching by name returns a value equal to the created one.
    let fetched = api.automation("test-automation", None).await.unwrap();
    assert_eq!(fetched, created);

    // Deleting and re-listing by that name returns an empty result.
    api.delete_automation(&created.id).await.unwrap();
    let remaining = api
        .automations(&AutomationsFilter::by_name("test-automation"))
        .collect_all()
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_duplicate_name_raises_conflict_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("CreateFilterTrigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "a trigger with this name already exists"}],
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let draft = Event::on_create_artifact(Scope::project("UHJvamVjdDox"))
        >> NoOpActionInput::default();
    let options = CreateOptions {
        updates: AutomationUpdates::new().name("test-automation"),
        ..CreateOptions::default()
    };

    let err = api.create_automation(&draft, &options).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(matches!(err, ApiError::Api { .. }));
}

#[tokio::test]
async fn test_duplicate_name_fetches_existing_when_requested() {
    let server = MockServer::start().await;
    // The first creation wrote "original description"; the conflicting
    // retry must get that record back, not its own overrides.
    let existing = trigger_json("VHJpZ2dlcjox", "test-automation", Some("original description"));

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("CreateFilterTrigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "a trigger with this name already exists"}],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("TriggersForViewer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![existing.clone()], false, None)),
        )
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let draft = Event::on_create_artifact(Scope::project("UHJvamVjdDox"))
        >> NoOpActionInput::default();
    let options = CreateOptions {
        updates: AutomationUpdates::new()
            .name("test-automation")
            .description("ignored description"),
        fetch_existing: true,
    };

    let automation = api.create_automation(&draft, &options).await.unwrap();
    assert_eq!(automation.description.as_deref(), Some("original description"));
    let expected: Automation = serde_json::from_value(existing).unwrap();
    assert_eq!(automation, expected);
}

#[tokio::test]
async fn test_run_metric_scope_update_is_backend_validated() {
    let server = MockServer::start().await;

    // The backend rejects artifact-collection scopes for RUN_METRIC.
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("UpdateFilterTrigger"))
        .and(body_string_contains("ARTIFACT_COLLECTION"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "RUN_METRIC triggers only support project scopes"}],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("UpdateFilterTrigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"updateFilterTrigger": {
                "trigger": run_metric_trigger_json("VHJpZ2dlcjoy", "metric-watch"),
            }}
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let automation: Automation =
        serde_json::from_value(run_metric_trigger_json("VHJpZ2dlcjoy", "metric-watch")).unwrap();

    // No local validation: the incompatible combination goes to the
    // backend and comes back as a remote error.
    let err = api
        .update_automation(
            &automation,
            &AutomationUpdates::new().scope(Scope::artifact_collection("QXJ0OjE=")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Api { .. }));

    let updated = api
        .update_automation(
            &automation,
            &AutomationUpdates::new().scope(Scope::project("UHJvamVjdDoy")),
        )
        .await
        .unwrap();
    assert_eq!(updated.scope.scope_type(), ScopeType::Project);
}

#[tokio::test]
async fn test_update_overrides_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("UpdateFilterTrigger"))
        .and(body_string_contains("new-name"))
        .and(body_string_contains("\"enabled\":false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"updateFilterTrigger": {
                "trigger": trigger_json("VHJpZ2dlcjox", "new-name", None),
            }}
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let automation: Automation =
        serde_json::from_value(trigger_json("VHJpZ2dlcjox", "old-name", None)).unwrap();

    let updated = api
        .update_automation(
            &automation,
            &AutomationUpdates::new().name("new-name").enabled(false),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "new-name");
}

#[tokio::test]
async fn test_fetch_one_requires_exactly_one_match() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], false, None)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("doubled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![
                trigger_json("VDox", "doubled", None),
                trigger_json("VDoy", "doubled", None),
            ],
            false,
            None,
        )))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    assert!(matches!(
        api.automation("missing", None).await.unwrap_err(),
        ApiError::NotFound(_)
    ));
    assert!(matches!(
        api.automation("doubled", None).await.unwrap_err(),
        ApiError::Ambiguous(_)
    ));
}

#[tokio::test]
async fn test_by_entity_listing_uses_entity_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("TriggersByEntity"))
        .and(body_string_contains("test-entity"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![trigger_json("VDox", "a", None)], false, None)),
        )
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let filter = AutomationsFilter {
        entity: Some("test-entity".to_string()),
        ..AutomationsFilter::default()
    };
    let automations = api.automations(&filter).collect_all().await.unwrap();
    assert_eq!(automations.len(), 1);
}

#[tokio::test]
async fn test_backend_http_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api
        .automations(&AutomationsFilter::default())
        .collect_all()
        .await
        .unwrap_err();
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("expected an Api error, got {other:?}"),
    }
}
