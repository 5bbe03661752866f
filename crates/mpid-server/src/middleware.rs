use axum::{
    extract::{Request, State},
    http::{header::HOST, HeaderValue},
    middleware::Next,
    response::Response,
};
use mpid_core::{CoreError, RequestContext};
use tracing::Instrument;
use uuid::Uuid;

use crate::{app::AppState, pipeline};

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Recorded on a `request` tracing span wrapping the rest of the stack
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut res = next.run(req).instrument(span).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware running the personalization pipeline over the inner response.
pub async fn personalize(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let context = request_context(&req);
    let response = next.run(req).await;
    pipeline::personalize(&state, context, response).await
}

/// Absolute URL of the request as the client addressed it.
///
/// Scheme comes from `X-Forwarded-Proto`, then the URI, then `http`; the
/// authority from `Host`, then the URI.
fn request_context(req: &Request) -> Result<RequestContext, CoreError> {
    let headers = req.headers();
    let uri = req.uri();

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");

    let authority = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(axum::http::uri::Authority::as_str))
        .unwrap_or_default();

    let path_and_query = uri
        .path_and_query()
        .map_or("/", axum::http::uri::PathAndQuery::as_str);

    RequestContext::from_parts(scheme, authority, path_and_query)
}
