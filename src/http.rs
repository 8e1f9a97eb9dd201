//! HTTP transport for the federated schema
//!
//! Provides helpers for:
//! - Extracting or minting a request id for log correlation
//! - The GraphQL handler executing requests against the schema
//! - The router serving `/graphql` and `/health`

use async_graphql::{Request, Response};
use axum::{
    extract::Extension,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::schema::AccountsSchema;
use crate::telemetry;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id attached to each GraphQL request's data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Take the request id from the `x-request-id` header, or mint a new one
pub fn extract_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| RequestId(s.to_string()))
        .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()))
}

/// GraphQL handler
///
/// Runs each request inside a `graphql` span carrying its request id and
/// parented on the caller's `traceparent`, if any.
pub async fn graphql_handler(
    Extension(schema): Extension<AccountsSchema>,
    headers: HeaderMap,
    req: Json<Request>,
) -> Json<Response> {
    let request_id = extract_request_id(&headers);
    let span = tracing::info_span!("graphql", request_id = %request_id.0);
    telemetry::set_remote_parent(&span, &headers);

    let request = req.0.data(request_id);
    let response = schema.execute(request).instrument(span.clone()).await;

    if response.is_err() {
        span.in_scope(|| {
            tracing::info!(errors = response.errors.len(), "request completed with errors");
        });
    }

    Json(response)
}

async fn health() -> &'static str {
    "ok"
}

/// Router serving the schema at `/graphql`
pub fn router(schema: AccountsSchema) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/health", get(health))
        .layer(Extension(schema))
}
