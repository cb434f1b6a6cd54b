//! Middleware for authentication and other cross-cutting concerns

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::GatewayError;
use crate::state::GatewayState;

/// Pull a bearer token out of the Authorization header, falling back to a
/// `token` query parameter (WebSocket clients cannot always set headers).
pub fn extract_token(request: &Request) -> Option<String> {
    let header_token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    let query_token = request.uri().query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some("token"), Some(value)) => Some(value.to_string()),
                _ => None,
            }
        })
    });

    header_token.or(query_token)
}

/// Bind the caller's identity and stash it in request extensions.
/// Credential failures refuse the request before any handler runs.
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = extract_token(&request).ok_or_else(|| {
        GatewayError::AuthenticationFailed("missing authentication token".to_string())
    })?;

    let identity = state.authenticator.bind_identity(&token).await?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
