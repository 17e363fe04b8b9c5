// crates/repsheet-store-rest/tests/rest_sharing_unit.rs
// ============================================================================
// Module: Rest Sharing Integration Tests
// Description: Sharing seam tests against a scripted local gateway.
// Purpose: Verify grant routes, payloads, and revocation semantics on the wire.
// ============================================================================

//! ## Overview
//! Drives the gateway client's sharing seam against a scripted `tiny_http`
//! server: listing grants, creating grants with the posted email and role,
//! and revoking by id. The revocation tests pin the absent-grant contract:
//! a 404 from the gateway is success, while auth rejections and outages map
//! into the backend taxonomy like every other request.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use repsheet_core::BackendError;
use repsheet_core::GrantId;
use repsheet_core::GrantRole;
use repsheet_core::SharingBackend;
use repsheet_core::SheetId;
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

/// Sheet under test.
fn sheet() -> SheetId {
    SheetId::new("sheet-9")
}

/// Canned gateway rendering of a writer grant for the coach address.
fn coach_grant_json() -> String {
    json!({
        "id": "grant-1",
        "email_address": "coach@example.com",
        "role": "writer",
        "display_name": null,
    })
    .to_string()
}

// ============================================================================
// SECTION: Grant Routes
// ============================================================================

/// Listing issues one GET on the sheet's permissions route and decodes grants.
#[test]
fn list_grants_hits_permissions_route() {
    let gateway = scripted_gateway(vec![(200, format!("[{}]", coach_grant_json()))]);
    let backend = local_backend(&gateway.base);

    let grants = backend.list_grants(&sheet()).unwrap();
    let seen = gateway.finish();

    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].id, GrantId::new("grant-1"));
    assert_eq!(grants[0].email_address, "coach@example.com");
    assert_eq!(grants[0].role, GrantRole::Writer);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].url, "/sheets/sheet-9/permissions");
}

/// Creation posts the email and role and returns the gateway's grant.
#[test]
fn create_grant_posts_email_and_role() {
    let gateway = scripted_gateway(vec![(200, coach_grant_json())]);
    let backend = local_backend(&gateway.base);

    let grant = backend
        .create_grant(&sheet(), "coach@example.com", GrantRole::Writer)
        .unwrap();
    let seen = gateway.finish();

    assert_eq!(grant.id, GrantId::new("grant-1"));
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].url, "/sheets/sheet-9/permissions");
    let sent: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(
        sent,
        json!({"email_address": "coach@example.com", "role": "writer"})
    );
}

/// Revocation deletes the single-grant route under the sheet.
#[test]
fn revoke_deletes_single_grant_route() {
    let gateway = scripted_gateway(vec![(200, String::new())]);
    let backend = local_backend(&gateway.base);

    backend
        .delete_grant(&sheet(), &GrantId::new("grant-3"))
        .unwrap();
    let seen = gateway.finish();

    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(seen[0].url, "/sheets/sheet-9/permissions/grant-3");
}

/// Sharing requests carry the bearer credential like tabular ones.
#[test]
fn bearer_credential_rides_sharing_requests() {
    let gateway = scripted_gateway(vec![(200, "[]".to_string())]);
    let backend = authorized_backend(&gateway.base, "sheet-key-1");

    let grants = backend.list_grants(&sheet()).unwrap();
    let seen = gateway.finish();

    assert!(grants.is_empty());
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer sheet-key-1"));
}

// ============================================================================
// SECTION: Revocation Semantics and Failures
// ============================================================================

/// A 404 on revocation means the grant is already gone, which is success.
#[test]
fn revoke_missing_grant_is_success() {
    let gateway = scripted_gateway(vec![(404, "no such grant".to_string())]);
    let backend = local_backend(&gateway.base);

    let result = backend.delete_grant(&sheet(), &GrantId::new("grant-404"));
    let _ = gateway.finish();

    assert!(result.is_ok());
}

/// A 403 on revocation is a real denial, not the absent-grant case.
#[test]
fn revoke_auth_rejection_is_denied() {
    let gateway = scripted_gateway(vec![(403, String::new())]);
    let backend = local_backend(&gateway.base);

    let result = backend.delete_grant(&sheet(), &GrantId::new("grant-3"));
    let _ = gateway.finish();

    assert!(matches!(result, Err(BackendError::Denied { .. })));
}

/// Gateway outages during listing surface as unavailable.
#[test]
fn grant_listing_outage_is_unavailable() {
    let gateway = scripted_gateway(vec![(500, String::new())]);
    let backend = local_backend(&gateway.base);

    let result = backend.list_grants(&sheet());
    let _ = gateway.finish();

    assert!(matches!(result, Err(BackendError::Unavailable { .. })));
}

/// A grant listing that is not an array fails decoding as malformed.
#[test]
fn malformed_grant_listing_is_malformed() {
    let gateway = scripted_gateway(vec![(200, json!({"nope": 1}).to_string())]);
    let backend = local_backend(&gateway.base);

    let result = backend.list_grants(&sheet());
    let _ = gateway.finish();

    assert!(matches!(result, Err(BackendError::Malformed { .. })));
}
