// crates/repsheet-store-rest/tests/rest_backend_unit.rs
// ============================================================================
// Module: Rest Backend Integration Tests
// Description: Tabular seam tests against a scripted local gateway.
// Purpose: Verify routes, payloads, auth, and error mapping over real sockets.
// ============================================================================

//! ## Overview
//! Drives the gateway client's tabular seam against a scripted `tiny_http`
//! server bound to a loopback port. Each test scripts the responses the
//! gateway returns, runs one backend operation, then inspects the requests
//! the fixture captured: route shape, query parameters, request bodies, and
//! the bearer header. Failure tests cover status mapping, undecodable and
//! oversized bodies, timeouts, and unreachable gateways.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use repsheet_core::BackendError;
use repsheet_core::EqFilter;
use repsheet_core::RawRow;
use repsheet_core::RowPatch;
use repsheet_core::SelectQuery;
use repsheet_core::TableId;
use repsheet_core::TabularBackend;
use repsheet_core::TenantId;
use repsheet_store_rest::RestBackend;
use repsheet_store_rest::RestBackendConfig;
use serde_json::Value;
use serde_json::json;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// One request the scripted gateway saw, captured for assertions.
struct RecordedRequest {
    /// HTTP method, uppercase.
    method: String,
    /// Path plus query string as received.
    url: String,
    /// Request body decoded as UTF-8.
    body: String,
    /// Authorization header value when present.
    authorization: Option<String>,
}

/// Scripted gateway bound to a loopback port.
struct GatewayFixture {
    /// Base URL the client should address.
    base: String,
    /// Requests captured in arrival order.
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Serving thread, joined by [`GatewayFixture::finish`].
    handle: thread::JoinHandle<()>,
}

impl GatewayFixture {
    /// Waits for the script to run out and returns the captured requests.
    fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().unwrap();
        match Arc::try_unwrap(self.requests) {
            Ok(mutex) => mutex.into_inner().unwrap(),
            Err(_) => panic!("request sink still shared after join"),
        }
    }
}

/// Starts a gateway answering each request with the next scripted response.
fn scripted_gateway(script: Vec<(u16, String)>) -> GatewayFixture {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let base = format!("http://{addr}");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&requests);
    let handle = thread::spawn(move || {
        for (status, body) in script {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut content = String::new();
            let _ = request.as_reader().read_to_string(&mut content);
            let authorization = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.as_str().to_string());
            let record = RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body: content,
                authorization,
            };
            sink.lock().unwrap().push(record);
            let _ = request.respond(Response::from_string(body).with_status_code(status));
        }
    });
    GatewayFixture {
        base,
        requests,
        handle,
    }
}

/// Builds a client permitted to talk cleartext to the fixture.
fn local_backend(base: &str) -> RestBackend {
    RestBackend::new(RestBackendConfig {
        base_url: base.to_string(),
        allow_http: true,
        ..RestBackendConfig::default()
    })
    .unwrap()
}

/// Builds a client that presents a bearer credential.
fn authorized_backend(base: &str, key: &str) -> RestBackend {
    RestBackend::new(RestBackendConfig {
        base_url: base.to_string(),
        allow_http: true,
        api_key: Some(key.to_string()),
        ..RestBackendConfig::default()
    })
    .unwrap()
}

/// Builds a client with a small response-size cap.
fn capped_backend(base: &str, max_bytes: usize) -> RestBackend {
    RestBackend::new(RestBackendConfig {
        base_url: base.to_string(),
        allow_http: true,
        max_response_bytes: max_bytes,
        ..RestBackendConfig::default()
    })
    .unwrap()
}

/// Builds a client with a short request timeout.
fn impatient_backend(base: &str, timeout_ms: u64) -> RestBackend {
    RestBackend::new(RestBackendConfig {
        base_url: base.to_string(),
        allow_http: true,
        timeout_ms,
        ..RestBackendConfig::default()
    })
    .unwrap()
}

/// Accepts one connection and leaves it unanswered past the client timeout.
fn silent_server() -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0_u8; 1024];
            let _ = stream.read(&mut buf);
            thread::sleep(Duration::from_millis(600));
        }
    });
    (format!("http://{addr}"), handle)
}

/// Reserves a loopback address with no listener behind it.
fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Converts a JSON object literal into a raw row.
fn raw_row(value: Value) -> RawRow {
    serde_json::from_value(value).unwrap()
}

/// Tenant under test.
fn tenant() -> TenantId {
    TenantId::new("user-7")
}

// ============================================================================
// SECTION: Route and Payload Shape
// ============================================================================

/// Select issues one GET on the rows route with filter and order rendered.
#[test]
fn select_hits_rows_route_with_query() {
    let gateway = scripted_gateway(vec![(
        200,
        json!([{"id": "w-1", "user_id": "user-7", "weight_kg": 80.5}]).to_string(),
    )]);
    let backend = local_backend(&gateway.base);
    let query = SelectQuery::new()
        .with_eq("user_id", "user-7")
        .with_order("recorded_at", false);

    let rows = backend
        .select(&tenant(), &TableId::new("weight_history"), &query)
        .unwrap();
    let seen = gateway.finish();

    assert_eq!(rows.len(), 1);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(
        seen[0].url,
        "/tenants/user-7/tables/weight_history/rows?user_id=eq.user-7&order=recorded_at.desc"
    );
    assert!(seen[0].authorization.is_none());
}

/// A configured api key arrives as a bearer Authorization header.
#[test]
fn bearer_credential_rides_every_request() {
    let gateway = scripted_gateway(vec![(200, "[]".to_string())]);
    let backend = authorized_backend(&gateway.base, "sheet-key-1");

    let rows = backend
        .select(&tenant(), &TableId::new("profiles"), &SelectQuery::new())
        .unwrap();
    let seen = gateway.finish();

    assert!(rows.is_empty());
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer sheet-key-1"));
}

/// Insert posts the raw row as the JSON request body.
#[test]
fn insert_posts_row_body() {
    let gateway = scripted_gateway(vec![(200, "{}".to_string())]);
    let backend = local_backend(&gateway.base);
    let row = raw_row(json!({
        "id": "w-2",
        "user_id": "user-7",
        "weight_kg": 81.0,
    }));

    backend
        .insert(&tenant(), &TableId::new("weight_history"), row)
        .unwrap();
    let seen = gateway.finish();

    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].url, "/tenants/user-7/tables/weight_history/rows");
    let sent: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(
        sent,
        json!({"id": "w-2", "user_id": "user-7", "weight_kg": 81.0})
    );
}

/// Update patches through the filter and returns the gateway's count.
#[test]
fn update_patches_through_filter() {
    let gateway = scripted_gateway(vec![(200, json!({"updated": 2}).to_string())]);
    let backend = local_backend(&gateway.base);
    let patch = RowPatch::new().set("weight_kg", 81.0);
    let filter = EqFilter::new("user_id", "user-7");

    let count = backend
        .update(&tenant(), &TableId::new("profiles"), &patch, &filter)
        .unwrap();
    let seen = gateway.finish();

    assert_eq!(count, 2);
    assert_eq!(seen[0].method, "PATCH");
    assert_eq!(
        seen[0].url,
        "/tenants/user-7/tables/profiles/rows?user_id=eq.user-7"
    );
    let sent: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(sent, json!({"weight_kg": 81.0}));
}

/// Delete addresses the filtered rows route and reports the removal count.
#[test]
fn delete_reports_removed_count() {
    let gateway = scripted_gateway(vec![(200, json!({"deleted": 1}).to_string())]);
    let backend = local_backend(&gateway.base);
    let filter = EqFilter::new("id", "w-2");

    let count = backend
        .delete(&tenant(), &TableId::new("weight_history"), &filter)
        .unwrap();
    let seen = gateway.finish();

    assert_eq!(count, 1);
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(
        seen[0].url,
        "/tenants/user-7/tables/weight_history/rows?id=eq.w-2"
    );
}

/// The readiness probe issues a GET on the health route.
#[test]
fn readiness_probes_health_route() {
    let gateway = scripted_gateway(vec![(200, "ok".to_string())]);
    let backend = local_backend(&gateway.base);

    backend.readiness().unwrap();
    let seen = gateway.finish();

    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].url, "/health");
}

// ============================================================================
// SECTION: Failure Mapping
// ============================================================================

/// Gateway 5xx responses surface as unavailable with the status in the reason.
#[test]
fn server_error_maps_to_unavailable() {
    let gateway = scripted_gateway(vec![(503, "rate limited".to_string())]);
    let backend = local_backend(&gateway.base);

    let result = backend.select(&tenant(), &TableId::new("profiles"), &SelectQuery::new());
    let _ = gateway.finish();

    assert!(matches!(
        result,
        Err(BackendError::Unavailable { ref reason }) if reason.contains("503")
    ));
}

/// Credential rejections surface as denied, never as retryable.
#[test]
fn auth_rejection_maps_to_denied() {
    let gateway = scripted_gateway(vec![(401, String::new())]);
    let backend = local_backend(&gateway.base);

    let result = backend.select(&tenant(), &TableId::new("profiles"), &SelectQuery::new());
    let _ = gateway.finish();

    assert!(matches!(
        result,
        Err(BackendError::Denied { ref reason }) if reason.contains("401")
    ));
}

/// A 200 with a non-JSON body is malformed, not a transport failure.
#[test]
fn undecodable_body_maps_to_malformed() {
    let gateway = scripted_gateway(vec![(200, "not json".to_string())]);
    let backend = local_backend(&gateway.base);

    let result = backend.select(&tenant(), &TableId::new("profiles"), &SelectQuery::new());
    let _ = gateway.finish();

    assert!(matches!(result, Err(BackendError::Malformed { .. })));
}

/// An update reply without the count field fails decoding as malformed.
#[test]
fn update_reply_missing_count_is_malformed() {
    let gateway = scripted_gateway(vec![(200, "{}".to_string())]);
    let backend = local_backend(&gateway.base);
    let patch = RowPatch::new().set("weight_kg", 81.0);
    let filter = EqFilter::new("user_id", "user-7");

    let result = backend.update(&tenant(), &TableId::new("profiles"), &patch, &filter);
    let _ = gateway.finish();

    assert!(matches!(result, Err(BackendError::Malformed { .. })));
}

/// A body larger than the response cap is rejected before decoding.
#[test]
fn oversized_body_maps_to_malformed() {
    let gateway = scripted_gateway(vec![(200, "x".repeat(600))]);
    let backend = capped_backend(&gateway.base, 64);

    let result = backend.select(&tenant(), &TableId::new("profiles"), &SelectQuery::new());
    let _ = gateway.finish();

    assert!(matches!(
        result,
        Err(BackendError::Malformed { ref detail }) if detail.contains("size limit")
    ));
}

/// A gateway that accepts but never answers trips the client timeout.
#[test]
fn stalled_gateway_times_out_as_unavailable() {
    let (base, handle) = silent_server();
    let backend = impatient_backend(&base, 100);

    let result = backend.select(&tenant(), &TableId::new("profiles"), &SelectQuery::new());
    handle.join().unwrap();

    assert!(matches!(
        result,
        Err(BackendError::Unavailable { ref reason }) if reason.contains("timed out")
    ));
}

/// A connection failure maps to unavailable.
#[test]
fn unreachable_gateway_maps_to_unavailable() {
    let backend = local_backend(&dead_address());

    let result = backend.select(&tenant(), &TableId::new("profiles"), &SelectQuery::new());

    assert!(matches!(result, Err(BackendError::Unavailable { .. })));
}
