use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::gate::{canonical_path, evaluate_verbose, Decision, GatePolicy, TriggerSurface};

/// Session context for requests the gate let through with a credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub role: Option<String>,
}

/// Shared, read-only state of the access gate middleware.
#[derive(Debug)]
pub struct AccessGate {
    pub policy: GatePolicy,
    pub surface: TriggerSurface,
    pub cookie_name: String,
}

impl AccessGate {
    pub fn new(policy: GatePolicy, surface: TriggerSurface, cookie_name: impl Into<String>) -> Self {
        Self {
            policy,
            surface,
            cookie_name: cookie_name.into(),
        }
    }
}

/// Runs the gate for paths on the trigger surface and applies its decision.
///
/// Paths are canonicalized first, so `//x`, `/./x` and `/%78` are judged as `/x`.
pub async fn access_gate(
    State(gate): State<Arc<AccessGate>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(path) = canonical_path(request.uri().path()) else {
        tracing::debug!(path = %request.uri().path(), "undecodable path, redirecting to login");
        return Redirect::temporary(&gate.policy.login_path).into_response();
    };
    if !gate.surface.covers(&path) {
        return next.run(request).await;
    }

    // An empty cookie counts as no cookie at all.
    let token = jar
        .get(&gate.cookie_name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty());

    let verdict = evaluate_verbose(&path, token.as_deref(), &gate.policy);
    match verdict.decision {
        Decision::Proceed => {
            tracing::debug!(path = %path, role = ?verdict.role, "access granted");
            if token.is_some() {
                request.extensions_mut().insert(SessionUser { role: verdict.role });
            }
            next.run(request).await
        }
        Decision::RedirectTo(location) => {
            match &verdict.denial {
                Some(denial) => tracing::debug!(path = %path, to = %location, reason = %denial, "access redirected"),
                None => tracing::debug!(path = %path, to = %location, "signed in, redirecting home"),
            }
            Redirect::temporary(&location).into_response()
        }
    }
}
