use axum::{
    Json,
    extract::{MatchedPath, Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::{AppState, ErrorResponse};

static SECURITY_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "no-referrer"),
    // Responses carry bearer tokens and personal addresses.
    (header::CACHE_CONTROL, "no-store"),
];

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus_handle {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Metrics are disabled".to_string(),
            }),
        )
            .into_response(),
    }
}

/// Coarse grouping of routes, used as a metrics label.
fn route_family(route: &str) -> &'static str {
    match route {
        "/register" | "/login" | "/logout" | "/check-auth" | "/change-password" => "account",
        "/health" | "/metrics" => "system",
        "/get-tokens" | "/add-token" | "/generate-address" | "/addresses" => "alias",
        r if r.starts_with("/delete-token/") || r.starts_with("/address/") => "alias",
        r if r.starts_with("/admin/") => "admin",
        r if r == "/" || r.starts_with("/static") => "static",
        _ => "other",
    }
}

/// Wraps every request in a span. The span's `user_id` starts out empty and
/// is recorded by the authentication gate once the token resolves.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or("<unmatched>", MatchedPath::as_str)
        .to_string();
    let family = route_family(&route);

    let span = info_span!(
        "request",
        id = %Uuid::new_v4(),
        method = %method,
        path = %req.uri().path(),
        family,
        user_id = tracing::field::Empty,
    );

    let response = next.run(req).instrument(span.clone()).await;

    let status = response.status();
    let elapsed = started.elapsed();

    metrics::counter!(
        "http_requests_total",
        "family" => family,
        "method" => method.to_string(),
        "route" => route,
        "status" => status.as_str().to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "family" => family)
        .record(elapsed.as_secs_f64());

    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        if status.is_server_error() {
            warn!(status = status.as_u16(), elapsed_ms, "Request failed");
        } else {
            info!(status = status.as_u16(), elapsed_ms, "Request finished");
        }
    });

    response
}

/// Adds the fixed security headers unless the handler already set them.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in &SECURITY_HEADERS {
        headers
            .entry(name)
            .or_insert_with(|| HeaderValue::from_static(*value));
    }

    response
}
