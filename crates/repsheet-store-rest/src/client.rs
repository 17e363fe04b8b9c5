// crates/repsheet-store-rest/src/client.rs
// ============================================================================
// Module: Rest Backend Client
// Description: Blocking REST client implementing the tabular and sharing seams.
// Purpose: Translate record-store operations into gateway requests and back.
// Dependencies: repsheet-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! Blocking REST client for the hosted sheet gateway. Implements the tabular
//! and sharing seams from `repsheet-core` over a fixed URL dialect: row
//! operations live under `tenants/{tenant}/tables/{table}/rows`, grants under
//! `sheets/{sheet}/permissions`, and the readiness probe under `health`.
//! Equality filters travel as `{column}=eq.{literal}` query parameters and
//! ordering as `order={column}.{asc|desc}`, so the gateway answers with rows
//! already filtered and sorted.
//!
//! ## Invariants
//! - Redirects are never followed; the configured gateway answers directly.
//! - Response bodies pass through a hard size cap before decoding.
//! - Every request-time failure maps into [`BackendError`]; no transport
//!   error type crosses this boundary.
//! - Revoking a grant the sheet does not hold is a success, not an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use repsheet_core::BackendError;
use repsheet_core::EqFilter;
use repsheet_core::GrantId;
use repsheet_core::GrantRole;
use repsheet_core::PermissionGrant;
use repsheet_core::RawRow;
use repsheet_core::RowPatch;
use repsheet_core::SelectQuery;
use repsheet_core::SharingBackend;
use repsheet_core::SheetId;
use repsheet_core::TableId;
use repsheet_core::TabularBackend;
use repsheet_core::TenantId;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::RestBackendConfig;
use crate::config::RestBackendError;

// ============================================================================
// SECTION: Wire Envelopes
// ============================================================================

/// Gateway acknowledgement for a patch request.
#[derive(Debug, Deserialize)]
struct UpdateReply {
    /// Number of rows the gateway matched and patched.
    updated: u64,
}

/// Gateway acknowledgement for a delete request.
#[derive(Debug, Deserialize)]
struct DeleteReply {
    /// Number of rows the gateway removed.
    deleted: u64,
}

/// Grant-creation payload posted to the permissions endpoint.
#[derive(Debug, Serialize)]
struct GrantRequest<'a> {
    /// Address receiving access.
    email_address: &'a str,
    /// Role granted to the address.
    role: GrantRole,
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// REST client for a hosted sheet gateway.
///
/// # Invariants
/// - The base URL is validated once at construction; request-time URL
///   assembly cannot produce a different origin.
/// - The bearer credential, when configured, is attached to every request.
/// - Responses exceeding configured limits fail closed.
pub struct RestBackend {
    /// Validated connection settings.
    config: RestBackendConfig,
    /// Parsed gateway base URL.
    base_url: Url,
    /// Blocking HTTP client with timeout and redirect policy applied.
    client: Client,
}

impl RestBackend {
    /// Creates a new gateway client from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`RestBackendError`] when the settings fail validation or the
    /// HTTP client cannot be built.
    pub fn new(config: RestBackendConfig) -> Result<Self, RestBackendError> {
        let base_url = config.validate()?;
        let client = build_client(&config)?;
        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Returns the settings the client was built from.
    #[must_use]
    pub const fn config(&self) -> &RestBackendConfig {
        &self.config
    }

    /// Attaches the bearer credential when one is configured.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Sends the request and admits only successful statuses.
    fn execute(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().map_err(map_transport_error)?;
        classify_status(response.status())?;
        Ok(response)
    }

    /// Reads the capped response body and decodes it as JSON.
    fn decode_json<T: DeserializeOwned>(&self, response: &mut Response) -> Result<T, BackendError> {
        let body = read_body_limited(response, self.config.max_response_bytes)?;
        serde_json::from_slice(&body).map_err(|error| BackendError::Malformed {
            detail: format!("gateway response is not valid json: {error}"),
        })
    }
}

/// Builds the blocking HTTP client from the validated settings.
fn build_client(config: &RestBackendConfig) -> Result<Client, RestBackendError> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .build()
        .map_err(|_| RestBackendError::Client {
            reason: "http client build failed".to_string(),
        })
}

// ============================================================================
// SECTION: Tabular Seam
// ============================================================================

impl TabularBackend for RestBackend {
    fn select(
        &self,
        tenant: &TenantId,
        table: &TableId,
        query: &SelectQuery,
    ) -> Result<Vec<RawRow>, BackendError> {
        let url = select_url(&self.base_url, tenant, table, query)?;
        let request = self.authorize(self.client.get(url));
        let mut response = self.execute(request)?;
        self.decode_json(&mut response)
    }

    fn insert(
        &self,
        tenant: &TenantId,
        table: &TableId,
        row: RawRow,
    ) -> Result<(), BackendError> {
        let url = table_rows_url(&self.base_url, tenant, table)?;
        let body = encode_json_body(&row)?;
        let request = self
            .authorize(self.client.post(url))
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.execute(request)?;
        Ok(())
    }

    fn update(
        &self,
        tenant: &TenantId,
        table: &TableId,
        patch: &RowPatch,
        filter: &EqFilter,
    ) -> Result<u64, BackendError> {
        let url = filtered_url(&self.base_url, tenant, table, filter)?;
        let body = encode_json_body(&patch.to_row())?;
        let request = self
            .authorize(self.client.patch(url))
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let mut response = self.execute(request)?;
        let reply: UpdateReply = self.decode_json(&mut response)?;
        Ok(reply.updated)
    }

    fn delete(
        &self,
        tenant: &TenantId,
        table: &TableId,
        filter: &EqFilter,
    ) -> Result<u64, BackendError> {
        let url = filtered_url(&self.base_url, tenant, table, filter)?;
        let request = self.authorize(self.client.delete(url));
        let mut response = self.execute(request)?;
        let reply: DeleteReply = self.decode_json(&mut response)?;
        Ok(reply.deleted)
    }

    fn readiness(&self) -> Result<(), BackendError> {
        let url = health_url(&self.base_url)?;
        let request = self.authorize(self.client.get(url));
        self.execute(request)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Sharing Seam
// ============================================================================

impl SharingBackend for RestBackend {
    fn list_grants(&self, sheet: &SheetId) -> Result<Vec<PermissionGrant>, BackendError> {
        let url = permissions_url(&self.base_url, sheet)?;
        let request = self.authorize(self.client.get(url));
        let mut response = self.execute(request)?;
        self.decode_json(&mut response)
    }

    fn create_grant(
        &self,
        sheet: &SheetId,
        email: &str,
        role: GrantRole,
    ) -> Result<PermissionGrant, BackendError> {
        let url = permissions_url(&self.base_url, sheet)?;
        let body = encode_json_body(&GrantRequest {
            email_address: email,
            role,
        })?;
        let request = self
            .authorize(self.client.post(url))
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let mut response = self.execute(request)?;
        self.decode_json(&mut response)
    }

    fn delete_grant(&self, sheet: &SheetId, grant: &GrantId) -> Result<(), BackendError> {
        let url = grant_url(&self.base_url, sheet, grant)?;
        let response = self
            .authorize(self.client.delete(url))
            .send()
            .map_err(map_transport_error)?;
        // Absent grants are already revoked.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        classify_status(response.status())
    }
}

// ============================================================================
// SECTION: URL Construction
// ============================================================================

/// Builds the rows collection URL for a tenant table.
pub(crate) fn table_rows_url(
    base: &Url,
    tenant: &TenantId,
    table: &TableId,
) -> Result<Url, BackendError> {
    append_segments(
        base,
        &["tenants", tenant.as_str(), "tables", table.as_str(), "rows"],
    )
}

/// Builds a select URL carrying the query's filter and ordering parameters.
pub(crate) fn select_url(
    base: &Url,
    tenant: &TenantId,
    table: &TableId,
    query: &SelectQuery,
) -> Result<Url, BackendError> {
    let mut url = table_rows_url(base, tenant, table)?;
    if let Some(filter) = &query.filter {
        append_filter(&mut url, filter);
    }
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        url.query_pairs_mut()
            .append_pair("order", &format!("{}.{direction}", order.column));
    }
    Ok(url)
}

/// Builds a rows URL narrowed by an equality filter.
pub(crate) fn filtered_url(
    base: &Url,
    tenant: &TenantId,
    table: &TableId,
    filter: &EqFilter,
) -> Result<Url, BackendError> {
    let mut url = table_rows_url(base, tenant, table)?;
    append_filter(&mut url, filter);
    Ok(url)
}

/// Builds the readiness probe URL.
pub(crate) fn health_url(base: &Url) -> Result<Url, BackendError> {
    append_segments(base, &["health"])
}

/// Builds the permissions collection URL for a sheet.
pub(crate) fn permissions_url(base: &Url, sheet: &SheetId) -> Result<Url, BackendError> {
    append_segments(base, &["sheets", sheet.as_str(), "permissions"])
}

/// Builds the URL of a single grant on a sheet.
pub(crate) fn grant_url(
    base: &Url,
    sheet: &SheetId,
    grant: &GrantId,
) -> Result<Url, BackendError> {
    append_segments(
        base,
        &["sheets", sheet.as_str(), "permissions", grant.as_str()],
    )
}

/// Appends path segments to a copy of the base URL.
fn append_segments(base: &Url, segments: &[&str]) -> Result<Url, BackendError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| BackendError::Unavailable {
            reason: "gateway base url cannot hold path segments".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Appends an equality filter as a `{column}=eq.{literal}` query pair.
fn append_filter(url: &mut Url, filter: &EqFilter) {
    url.query_pairs_mut()
        .append_pair(&filter.column, &format!("eq.{}", filter_literal(&filter.value)));
}

/// Renders a filter value as the gateway's query literal.
///
/// Strings travel bare; every other JSON value uses its compact rendering,
/// so `null`, booleans, and numbers read naturally in the query string.
pub(crate) fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Transport Mapping
// ============================================================================

/// Maps a response status into the backend taxonomy.
///
/// Timeout-flavored statuses (408, 425, 429) and server errors count as
/// unavailability, which callers may retry. Remaining client errors are
/// denials. Redirects arrive here unfollowed and count as unavailability.
pub(crate) fn classify_status(status: StatusCode) -> Result<(), BackendError> {
    if status.is_success() {
        return Ok(());
    }
    let code = status.as_u16();
    if matches!(code, 408 | 425 | 429) || status.is_server_error() {
        return Err(BackendError::Unavailable {
            reason: format!("gateway returned status {code}"),
        });
    }
    if status.is_client_error() {
        return Err(BackendError::Denied {
            reason: format!("gateway returned status {code}"),
        });
    }
    Err(BackendError::Unavailable {
        reason: format!("gateway returned unexpected status {code}"),
    })
}

/// Maps a transport-level failure into the backend taxonomy.
fn map_transport_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        return BackendError::Unavailable {
            reason: "gateway request timed out".to_string(),
        };
    }
    BackendError::Unavailable {
        reason: format!("gateway transport failure: {error}"),
    }
}

/// Serializes a request payload as a JSON body.
fn encode_json_body<T: Serialize>(payload: &T) -> Result<Vec<u8>, BackendError> {
    serde_json::to_vec(payload).map_err(|error| BackendError::Malformed {
        detail: format!("request body does not encode as json: {error}"),
    })
}

/// Reads the response body through the configured size cap.
///
/// The advertised `Content-Length` is checked before the body is pulled, the
/// read itself stops one byte past the cap, and a body shorter than the
/// advertised length is treated as a torn read.
fn read_body_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, BackendError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes).map_err(|_| BackendError::Malformed {
        detail: "response size limit exceeds u64".to_string(),
    })?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(BackendError::Malformed {
            detail: "gateway response exceeds size limit".to_string(),
        });
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle
        .read_to_end(&mut buf)
        .map_err(|_| BackendError::Unavailable {
            reason: "failed to read gateway response".to_string(),
        })?;
    if buf.len() > max_bytes {
        return Err(BackendError::Malformed {
            detail: "gateway response exceeds size limit".to_string(),
        });
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected).map_err(|_| BackendError::Malformed {
            detail: "gateway response length is invalid".to_string(),
        })?;
        if buf.len() < expected {
            return Err(BackendError::Unavailable {
                reason: "gateway response truncated".to_string(),
            });
        }
    }
    Ok(buf)
}
