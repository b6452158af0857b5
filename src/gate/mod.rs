//! Request-time authorization gate.
//!
//! [`evaluate`] is a pure function of the requested path, the raw `token`
//! cookie value and a [`GatePolicy`]. The HTTP side lives in
//! `middleware::access_gate` and only applies the returned [`Decision`].

pub mod matching;
pub mod routes;

use thiserror::Error;

use crate::auth::{decode_credential, CredentialError, TokenVerification};

pub use matching::{canonical_path, PathMatching, TriggerPattern, TriggerSurface};
pub use routes::{RouteTable, RouteTableError};

pub const DEFAULT_LOGIN_PATH: &str = "/signin";
pub const DEFAULT_FALLBACK_HOME: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    RedirectTo(String),
}

/// Why a request was redirected. Never shown to the client.
#[derive(Debug, Error)]
pub enum Denial {
    #[error("no credential")]
    MissingCredential,
    #[error("malformed credential: {0}")]
    MalformedCredential(#[from] CredentialError),
    #[error("role {0:?} is not in the route table")]
    UnknownRole(Option<String>),
    #[error("role '{role}' may not access {path}")]
    PathNotAllowed { role: String, path: String },
}

/// Outcome of a single evaluation together with the reason behind it.
#[derive(Debug)]
pub struct Verdict {
    pub decision: Decision,
    pub denial: Option<Denial>,
    pub role: Option<String>,
}

impl Verdict {
    fn proceed(role: Option<String>) -> Self {
        Self { decision: Decision::Proceed, denial: None, role }
    }

    fn redirect(to: &str, denial: Option<Denial>, role: Option<String>) -> Self {
        Self { decision: Decision::RedirectTo(to.to_string()), denial, role }
    }
}

/// Everything the gate needs besides the request: immutable, built once at startup.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub table: RouteTable,
    pub login_path: String,
    pub fallback_home: String,
    pub matching: PathMatching,
    pub verification: TokenVerification,
}

impl GatePolicy {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            fallback_home: DEFAULT_FALLBACK_HOME.to_string(),
            matching: PathMatching::default(),
            verification: TokenVerification::default(),
        }
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn with_fallback_home(mut self, fallback_home: impl Into<String>) -> Self {
        self.fallback_home = fallback_home.into();
        self
    }

    pub fn with_matching(mut self, matching: PathMatching) -> Self {
        self.matching = matching;
        self
    }

    pub fn with_verification(mut self, verification: TokenVerification) -> Self {
        self.verification = verification;
        self
    }

    /// Home path for `role`, or the fallback home when the role has none.
    pub fn home_for(&self, role: Option<&str>) -> &str {
        role.and_then(|r| self.table.home(r)).unwrap_or(&self.fallback_home)
    }

    /// The default trigger surface: every table prefix as a subtree plus the login path.
    pub fn default_trigger_surface(&self) -> TriggerSurface {
        TriggerSurface::covering(&self.table.all_prefixes(), &self.login_path)
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::new(RouteTable::builtin())
    }
}

pub fn evaluate(path: &str, cookie: Option<&str>, policy: &GatePolicy) -> Decision {
    evaluate_verbose(path, cookie, policy).decision
}

pub fn evaluate_verbose(path: &str, cookie: Option<&str>, policy: &GatePolicy) -> Verdict {
    let on_login = path == policy.login_path;

    let Some(token) = cookie else {
        if on_login {
            return Verdict::proceed(None);
        }
        return Verdict::redirect(&policy.login_path, Some(Denial::MissingCredential), None);
    };

    let credential = match decode_credential(token, &policy.verification) {
        Ok(credential) => credential,
        Err(e) => return Verdict::redirect(&policy.login_path, Some(e.into()), None),
    };
    let role = credential.role().map(str::to_string);

    if on_login {
        // Already signed in: send them home instead of showing the login page again.
        let denial = match role.as_deref() {
            Some(r) if policy.table.home(r).is_some() => None,
            _ => Some(Denial::UnknownRole(role.clone())),
        };
        let home = policy.home_for(role.as_deref()).to_string();
        return Verdict::redirect(&home, denial, role);
    }

    let allowed = role.as_deref().map(|r| policy.table.allowed(r)).unwrap_or(&[]);
    if allowed.is_empty() {
        return Verdict::redirect(&policy.login_path, Some(Denial::UnknownRole(role.clone())), role);
    }

    if allowed.iter().any(|prefix| policy.matching.matches(prefix, path)) {
        return Verdict::proceed(role);
    }

    let denial = Denial::PathNotAllowed {
        role: role.clone().unwrap_or_default(),
        path: path.to_string(),
    };
    Verdict::redirect(&policy.login_path, Some(denial), role)
}
