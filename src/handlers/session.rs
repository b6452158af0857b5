use axum::Extension;

use crate::error::ApiError;
use crate::middleware::{ApiClaims, ApiResponse};

/// GET /api/session - claims of the verified API token
///
/// ```json
/// { "success": true, "data": { "role": "manager", "sub": "12", "exp": 1735689600, "iat": 1735603200 } }
/// ```
pub async fn session_get(
    claims: Option<Extension<ApiClaims>>,
) -> Result<ApiResponse<serde_json::Map<String, serde_json::Value>>, ApiError> {
    let Extension(ApiClaims(claims)) =
        claims.ok_or_else(|| ApiError::unauthorized("Token verification required"))?;
    Ok(ApiResponse::success(claims))
}

/// Fallback for unknown `/api/*` routes.
pub async fn api_not_found() -> ApiError {
    ApiError::not_found("No such API endpoint")
}
