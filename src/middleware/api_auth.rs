use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::auth::credential::verify_hs256;
use crate::error::ApiError;

/// Verified claims of the API caller, inserted by [`api_auth_middleware`].
#[derive(Clone, Debug)]
pub struct ApiClaims(pub Map<String, Value>);

#[derive(Debug)]
pub struct ApiAuth {
    secret: String,
}

impl ApiAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

/// Token check for `/api/*`: missing token is 403, a token that fails verification is 401
pub async fn api_auth_middleware(
    State(auth): State<Arc<ApiAuth>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(&headers) {
        Some(token) => token,
        None => return ApiError::forbidden("Token is required").into_response(),
    };

    if auth.secret.is_empty() {
        tracing::error!("API token check invoked but no token secret is configured");
        return ApiError::internal_server_error("Token verification unavailable").into_response();
    }

    match verify_hs256(token, &auth.secret) {
        Ok(claims) => {
            request.extensions_mut().insert(ApiClaims(claims));
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("API token rejected: {}", e);
            ApiError::unauthorized("Invalid Token").into_response()
        }
    }
}

/// Accepts both a raw token and the `Bearer <token>` form.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}
