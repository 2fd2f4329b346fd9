//! Request middleware: security headers, rate limiting, tenant resolution.

use crate::error::ErrorBody;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hivebase_platform::tenancy::TenantSelection;
use std::net::SocketAddr;
use tracing::warn;

use crate::rest::AppState;

/// Attach the resolved tenant to the request. Resolution happens exactly
/// once; handlers read the `TenantSelection` extension and never
/// re-resolve.
pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    let organization = query_param(request.uri().query(), "organization");

    let mut selection = state.resolver.resolve(host, organization.as_deref());
    if !state.binds.contains(&selection.name) {
        warn!(tenant = %selection.name, "No bind for tenant, serving from default");
        selection.fell_back = true;
    }

    request.extensions_mut().insert(selection);
    next.run(request).await
}

/// Enforce the per-tenant rate limits, keyed by client IP.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let tenant = request
        .extensions()
        .get::<TenantSelection>()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "default".to_string());
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "local".to_string());

    let decision = state.limiter.check(&format!("{client}:{tenant}"), &tenant);
    if !decision.allowed {
        metrics::counter!("api.rate_limited").increment(1);
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody {
                code: StatusCode::TOO_MANY_REQUESTS.as_u16(),
                name: "rate_limited".to_string(),
                description: "Rate limit exceeded".to_string(),
            }),
        )
            .into_response();
        set_rate_headers(&mut response, decision.limit, decision.remaining);
        return response;
    }

    let mut response = next.run(request).await;
    set_rate_headers(&mut response, decision.limit, decision.remaining);
    response
}

fn set_rate_headers(response: &mut Response, limit: u32, remaining: u32) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", value);
    }
}

/// Add the security headers to every response.
pub async fn security_headers(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let security = &state.config.security;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    if let Ok(value) = HeaderValue::from_str(&security.frame_options) {
        headers.insert("x-frame-options", value);
    }
    if security.force_https {
        if let Ok(value) = HeaderValue::from_str(&format!(
            "max-age={}; includeSubDomains",
            security.hsts_max_age
        )) {
            headers.insert("strict-transport-security", value);
        }
    }
    if let Ok(value) =
        HeaderValue::from_str(&format!("default-src {}", security.csp_default_src))
    {
        headers.insert("content-security-policy", value);
    }

    response
}

/// Extract one query parameter without re-parsing in handlers.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param(Some("organization=acme&format=csv"), "organization"),
            Some("acme".to_string())
        );
        assert_eq!(
            query_param(Some("organization=acme%20co"), "organization"),
            Some("acme co".to_string())
        );
        assert_eq!(query_param(Some("format=csv"), "organization"), None);
        assert_eq!(query_param(None, "organization"), None);
    }
}
