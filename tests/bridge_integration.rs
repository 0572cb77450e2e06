//! Request bridge tests: validation → token → mock gateway → ToolResult.

mod common;

use common::{MockGateway, Scripted, HOTEL};
use opera_cloud_mcp::auth::TokenProvider;
use opera_cloud_mcp::bridge::{RequestBridge, ToolInvocation, ToolResult};
use opera_cloud_mcp::tools::{HealthStatus, ToolRegistry};
use opera_cloud_mcp::types::FailureKind;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

fn call(tool: &str, arguments: Value) -> ToolInvocation {
    ToolInvocation::new(tool, arguments)
}

fn expect_failure(result: &ToolResult) -> (FailureKind, bool, Option<u16>, u32, &str) {
    match result {
        ToolResult::Failure {
            kind,
            message,
            retryable,
            status,
            attempts,
        } => (*kind, *retryable, *status, *attempts, message.as_str()),
        ToolResult::Success { payload } => panic!("expected failure, got {}", payload),
    }
}

fn expect_payload(result: ToolResult) -> Value {
    match result {
        ToolResult::Success { payload } => payload,
        ToolResult::Failure { kind, message, .. } => panic!("expected success, got {}: {}", kind, message),
    }
}

// =============================================================================
// Tokens
// =============================================================================

#[tokio::test]
async fn test_token_reused_across_invocations() {
    let gw = MockGateway::start().await;
    let (bridge, _) = gw.bridge(4);

    for _ in 0..3 {
        let result = bridge.invoke(call("search_reservations", json!({}))).await;
        assert!(result.is_success());
    }
    assert_eq!(gw.state.token_calls(), 1);
    assert_eq!(gw.state.resource_calls(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invocations_share_one_exchange() {
    let gw = MockGateway::start().await;
    gw.state.delay_tokens(Duration::from_millis(100));
    let (bridge, _) = gw.bridge(4);
    let bridge = Arc::new(bridge);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .invoke(call("get_reservation", json!({"reservationId": format!("R{}", i)})))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }
    assert_eq!(gw.state.token_calls(), 1);
    assert_eq!(gw.state.resource_calls(), 10);
    for request in gw.state.requests() {
        assert_eq!(request.header("authorization"), Some("Bearer token-1"));
    }
}

#[tokio::test]
async fn test_auth_failure_surfaces_without_upstream_call() {
    let gw = MockGateway::start().await;
    gw.state.fail_tokens(&[503, 503, 503]);
    let (bridge, _) = gw.bridge(4);

    let result = bridge.invoke(call("search_reservations", json!({}))).await;
    let (kind, retryable, status, attempts, _) = expect_failure(&result);
    assert_eq!(kind, FailureKind::Auth);
    assert!(retryable);
    assert_eq!(status, None);
    assert_eq!(attempts, 0);
    assert_eq!(gw.state.resource_calls(), 0);
}

// =============================================================================
// Retry and refresh
// =============================================================================

#[tokio::test]
async fn test_server_errors_retried_up_to_cap() {
    let gw = MockGateway::start().await;
    gw.state.always(Scripted::json(503, json!({"title": "Service Unavailable"})));
    let (bridge, _) = gw.bridge(4);

    let result = bridge.invoke(call("search_reservations", json!({}))).await;
    let (kind, retryable, status, attempts, message) = expect_failure(&result);
    assert_eq!(kind, FailureKind::Upstream);
    assert!(retryable);
    assert_eq!(status, Some(503));
    assert_eq!(attempts, 4);
    assert!(message.contains("Service Unavailable"));
    assert_eq!(gw.state.resource_calls(), 4);
    assert_eq!(gw.state.token_calls(), 1);
}

#[tokio::test]
async fn test_single_401_triggers_one_refresh() {
    let gw = MockGateway::start().await;
    gw.state.push(Scripted::json(401, json!({"title": "Unauthorized"})));
    let (bridge, _) = gw.bridge(4);

    let result = bridge
        .invoke(call("get_reservation", json!({"reservationId": "R1"})))
        .await;
    assert!(result.is_success());
    assert_eq!(gw.state.token_calls(), 2);
    assert_eq!(gw.state.resource_calls(), 2);

    let requests = gw.state.requests();
    assert_eq!(requests[0].header("authorization"), Some("Bearer token-1"));
    assert_eq!(requests[1].header("authorization"), Some("Bearer token-2"));
}

#[tokio::test]
async fn test_second_401_fails_without_retry() {
    let gw = MockGateway::start().await;
    gw.state.always(Scripted::json(401, json!({"title": "Unauthorized"})));
    let (bridge, _) = gw.bridge(4);

    let result = bridge
        .invoke(call("get_reservation", json!({"reservationId": "R1"})))
        .await;
    let (kind, retryable, status, attempts, _) = expect_failure(&result);
    assert_eq!(kind, FailureKind::Upstream);
    assert!(!retryable);
    assert_eq!(status, Some(401));
    assert_eq!(attempts, 2);
    assert_eq!(gw.state.token_calls(), 2);
    assert_eq!(gw.state.resource_calls(), 2);
}

#[tokio::test]
async fn test_client_error_attempted_once() {
    let gw = MockGateway::start().await;
    gw.state.push(Scripted::json(400, json!({"detail": "arrivalStartDate is in the past"})));
    let (bridge, _) = gw.bridge(4);

    let result = bridge.invoke(call("search_reservations", json!({}))).await;
    let (kind, retryable, status, attempts, message) = expect_failure(&result);
    assert_eq!(kind, FailureKind::Upstream);
    assert!(!retryable);
    assert_eq!(status, Some(400));
    assert_eq!(attempts, 1);
    assert!(message.contains("arrivalStartDate is in the past"));
    assert_eq!(gw.state.resource_calls(), 1);
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let gw = MockGateway::start().await;
    gw.state.push(Scripted::json(429, json!({"title": "Too Many Requests"})).retry_after(0));
    let (bridge, _) = gw.bridge(4);

    let result = bridge.invoke(call("search_reservations", json!({}))).await;
    assert!(result.is_success());
    assert_eq!(gw.state.resource_calls(), 2);
}

#[tokio::test]
async fn test_retries_reuse_request_id() {
    let gw = MockGateway::start().await;
    gw.state.push(Scripted::raw(502, "Bad Gateway"));
    let (bridge, _) = gw.bridge(4);

    assert!(bridge.invoke(call("search_reservations", json!({}))).await.is_success());
    let requests = gw.state.requests();
    assert_eq!(requests.len(), 2);
    let first = requests[0].header("x-request-id").unwrap();
    assert_eq!(uuid::Uuid::parse_str(first).unwrap().get_version_num(), 4);
    assert_eq!(requests[1].header("x-request-id"), Some(first));
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_unknown_tool() {
    let gw = MockGateway::start().await;
    let (bridge, _) = gw.bridge(4);

    let result = bridge.invoke(call("does-not-exist", json!({}))).await;
    let (kind, retryable, _, attempts, _) = expect_failure(&result);
    assert_eq!(kind, FailureKind::UnknownTool);
    assert!(!retryable);
    assert_eq!(attempts, 0);
    assert_eq!(gw.state.token_calls(), 0);
    assert_eq!(gw.state.resource_calls(), 0);
}

#[tokio::test]
async fn test_missing_hotel_without_default() {
    let gw = MockGateway::start().await;
    let mut settings = gw.settings(4);
    settings.default_hotel_id = None;
    let provider: Arc<dyn TokenProvider> = Arc::new(gw.token_manager());
    let bridge =
        RequestBridge::new(Arc::new(ToolRegistry::opera().unwrap()), provider, settings).unwrap();

    let result = bridge.invoke(call("search_reservations", json!({}))).await;
    let (kind, retryable, _, _, message) = expect_failure(&result);
    assert_eq!(kind, FailureKind::InvalidArgument);
    assert!(!retryable);
    assert!(message.contains("hotelId"));
    assert_eq!(gw.state.token_calls(), 0);
}

#[tokio::test]
async fn test_invalid_arguments_rejected_before_network() {
    let gw = MockGateway::start().await;
    let (bridge, _) = gw.bridge(4);

    for (tool, args) in [
        ("get_reservation", json!({})),
        ("search_reservations", json!({"bogus": 1})),
        ("search_reservations", json!({"arrivalDate": "2026-11-05", "departureDate": "2026-11-01"})),
        ("search_reservations", json!({"limit": 500})),
        ("search_reservations", json!(["not", "an", "object"])),
    ] {
        let result = bridge.invoke(call(tool, args.clone())).await;
        let (kind, retryable, _, _, _) = expect_failure(&result);
        assert_eq!(kind, FailureKind::InvalidArgument, "{} {}", tool, args);
        assert!(!retryable);
    }
    assert_eq!(gw.state.token_calls(), 0);
    assert_eq!(gw.state.resource_calls(), 0);
}

// =============================================================================
// Responses
// =============================================================================

#[tokio::test]
async fn test_malformed_success_bodies() {
    let gw = MockGateway::start().await;
    let (bridge, _) = gw.bridge(4);

    gw.state.push(Scripted::json(200, json!({"reservations": "not-a-list"})));
    gw.state.push(Scripted::raw(200, "<html>maintenance</html>"));
    gw.state.push(Scripted::json(200, json!([1, 2, 3])));

    for _ in 0..3 {
        let result = bridge.invoke(call("search_reservations", json!({}))).await;
        let (kind, retryable, _, attempts, _) = expect_failure(&result);
        assert_eq!(kind, FailureKind::MalformedResponse);
        assert!(!retryable);
        assert_eq!(attempts, 1);
    }
    assert_eq!(gw.state.resource_calls(), 3);
}

#[tokio::test]
async fn test_empty_success_body_is_empty_object() {
    let gw = MockGateway::start().await;
    gw.state.push(Scripted::raw(200, ""));
    let (bridge, _) = gw.bridge(4);

    let payload = expect_payload(
        bridge
            .invoke(call(
                "cancel_reservation",
                json!({"reservationId": "R1", "reason": "Guest request"}),
            ))
            .await,
    );
    assert_eq!(payload, json!({}));
}

#[tokio::test]
async fn test_outbound_request_shape() {
    let gw = MockGateway::start().await;
    let (bridge, _) = gw.bridge(4);

    let result = bridge
        .invoke(call(
            "search_reservations",
            json!({"guestName": "Lovelace", "status": ["Reserved", "InHouse"], "limit": 5}),
        ))
        .await;
    assert!(result.is_success());

    let request = &gw.state.requests()[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, format!("/rsv/v1/hotels/{}/reservations", HOTEL));
    let query = request.query.clone().unwrap();
    assert!(query.contains("surname=Lovelace"));
    assert!(query.contains("reservationStatus=Reserved&reservationStatus=InHouse"));
    assert!(query.contains("limit=5"));
    assert_eq!(request.header("x-hotelid"), Some(HOTEL));
    assert_eq!(request.header("accept"), Some("application/json"));
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn test_create_reservation_body() {
    let gw = MockGateway::start().await;
    gw.state.push(Scripted::json(201, json!({"reservationId": "R42"})));
    let (bridge, _) = gw.bridge(4);

    let payload = expect_payload(
        bridge
            .invoke(call(
                "create_reservation",
                json!({
                    "hotelId": "OTHER",
                    "guestFirstName": "Ada",
                    "guestLastName": "Lovelace",
                    "guestEmail": "",
                    "arrivalDate": "2026-11-01",
                    "departureDate": "2026-11-03",
                    "roomType": "KING",
                    "rateCode": "BAR",
                    "sourceCode": "WEB"
                }),
            ))
            .await,
    );
    assert_eq!(payload["reservationId"], "R42");

    let request = &gw.state.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/rsv/v1/hotels/OTHER/reservations");
    assert_eq!(request.header("x-hotelid"), Some("OTHER"));
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(
        request.json(),
        json!({
            "reservation": {
                "guest": {"givenName": "Ada", "surname": "Lovelace"},
                "stay": {
                    "arrivalDate": "2026-11-01",
                    "departureDate": "2026-11-03",
                    "roomType": "KING",
                    "ratePlanCode": "BAR",
                    "adults": 1,
                    "children": 0
                }
            },
            "sourceCode": "WEB"
        })
    );
}

#[tokio::test]
async fn test_create_reservation_rejects_shadowing_extras() {
    let gw = MockGateway::start().await;
    let (bridge, _) = gw.bridge(4);

    let base = json!({
        "guestFirstName": "Ada",
        "guestLastName": "Lovelace",
        "arrivalDate": "2026-11-01",
        "departureDate": "2026-11-03",
        "roomType": "KING",
        "rateCode": "BAR"
    });

    let mut shadowing = base.clone();
    shadowing["reservation"] = json!("x");
    let result = bridge.invoke(call("create_reservation", shadowing)).await;
    let (kind, retryable, _, attempts, message) = expect_failure(&result);
    assert_eq!(kind, FailureKind::InvalidArgument);
    assert!(!retryable);
    assert_eq!(attempts, 0);
    assert!(message.contains("reservation"), "{}", message);

    let mut blank = base.clone();
    blank["roomType"] = json!("");
    let result = bridge.invoke(call("create_reservation", blank)).await;
    let (kind, _, _, _, message) = expect_failure(&result);
    assert_eq!(kind, FailureKind::InvalidArgument);
    assert!(message.contains("roomType"), "{}", message);

    assert_eq!(gw.state.token_calls(), 0);
    assert_eq!(gw.state.resource_calls(), 0);
}

#[tokio::test]
async fn test_per_tool_base_url() {
    let primary = MockGateway::start().await;
    let secondary = MockGateway::start().await;

    let mut settings = primary.settings(4);
    settings
        .tool_base_urls
        .insert("get_guest_folio".to_string(), secondary.base_url());
    let provider: Arc<dyn TokenProvider> = Arc::new(primary.token_manager());
    let bridge =
        RequestBridge::new(Arc::new(ToolRegistry::opera().unwrap()), provider, settings).unwrap();

    let registry = bridge.registry();
    let folio = registry.resolve("get_guest_folio").unwrap();
    let mut args = Map::new();
    for param in folio.required_params() {
        if param.name != "hotelId" {
            args.insert(param.name.clone(), json!("X1"));
        }
    }
    assert!(bridge.invoke(call("get_guest_folio", Value::Object(args))).await.is_success());
    assert!(bridge.invoke(call("search_reservations", json!({}))).await.is_success());

    assert_eq!(secondary.state.resource_calls(), 1);
    assert_eq!(primary.state.resource_calls(), 1);
    assert_eq!(primary.state.token_calls(), 1);
}

#[tokio::test]
async fn test_health_tracks_outcomes() {
    let gw = MockGateway::start().await;
    gw.state.push(Scripted::json(404, json!({"detail": "not found"})));
    let (bridge, _) = gw.bridge(1);

    bridge
        .invoke(call("get_reservation", json!({"reservationId": "R1"})))
        .await;
    bridge
        .invoke(call("get_reservation", json!({"reservationId": "R2"})))
        .await;
    bridge.invoke(call("nope", json!({}))).await;

    let report = bridge.health_report().await;
    let tool = report
        .tools
        .iter()
        .find(|t| t.tool == "get_reservation")
        .unwrap();
    assert_eq!(tool.total_calls, 2);
    assert_eq!(tool.last_upstream_status, Some(200));
    assert!(report.tools.iter().all(|t| t.tool != "nope"));
    assert_ne!(report.status, HealthStatus::Unhealthy);
}

// =============================================================================
// Properties
// =============================================================================

fn arg_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[A-Z0-9]{0,8}".prop_map(Value::from),
        "20[0-9]{2}-[01][0-9]-[0-3][0-9]".prop_map(Value::from),
        prop::collection::vec("[a-z]{1,5}", 0..3).prop_map(|v| json!(v)),
    ]
}

fn arg_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("hotelId".to_string()),
        Just("reservationId".to_string()),
        Just("arrivalDate".to_string()),
        Just("departureDate".to_string()),
        Just("guestName".to_string()),
        Just("limit".to_string()),
        Just("status".to_string()),
        "[a-z]{1,6}",
    ]
}

proptest! {
    #[test]
    fn prop_validation_is_deterministic(
        tool_index in 0usize..64,
        args in prop::collection::btree_map(arg_name(), arg_value(), 0..6),
        default_hotel in prop::option::of("[A-Z]{3,6}"),
    ) {
        let registry = ToolRegistry::opera().unwrap();
        let tools = registry.list_tools();
        let tool = &tools[tool_index % tools.len()];
        let args: Map<String, Value> = args.into_iter().collect();

        let first = tool
            .prepare(&args, default_hotel.as_deref())
            .map_err(|e| e.to_string());
        let second = registry
            .resolve(&tool.name)
            .unwrap()
            .prepare(&args, default_hotel.as_deref())
            .map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }
}
