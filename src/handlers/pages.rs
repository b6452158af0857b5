use axum::{extract::OriginalUri, Extension};
use serde::Serialize;

use crate::middleware::{ApiResponse, SessionUser};

#[derive(Debug, Serialize)]
pub struct PagePlaceholder {
    pub path: String,
    pub role: Option<String>,
}

/// Stand-in for the dashboard pages when no static directory is configured.
/// Reports which page was reached and under which role.
pub async fn page_placeholder(
    OriginalUri(uri): OriginalUri,
    session: Option<Extension<SessionUser>>,
) -> ApiResponse<PagePlaceholder> {
    ApiResponse::success(PagePlaceholder {
        path: uri.path().to_string(),
        role: session.and_then(|Extension(user)| user.role),
    })
}
