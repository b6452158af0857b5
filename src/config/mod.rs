use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::auth::TokenVerification;
use crate::gate::{
    GatePolicy, PathMatching, RouteTable, RouteTableError, TriggerSurface, DEFAULT_FALLBACK_HOME,
    DEFAULT_LOGIN_PATH,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signature verification is enabled but GATE_TOKEN_SECRET is empty")]
    MissingSecret,
    #[error("{key} must start with '/', got '{value}'")]
    InvalidPath { key: &'static str, value: String },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error(transparent)]
    Routes(#[from] RouteTableError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub gate: GateConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub login_path: String,
    pub fallback_home: String,
    pub cookie_name: String,
    pub path_matching: PathMatching,
    pub verify_signature: bool,
    pub routes_file: Option<PathBuf>,
    /// Matcher patterns; empty means "derive from the route table".
    pub trigger_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub token_secret: String,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub token_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`, then validate the result.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("CRM_GATE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("CRM_GATE_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Gate overrides
        if let Some(v) = lookup("GATE_LOGIN_PATH") {
            self.gate.login_path = v;
        }
        if let Some(v) = lookup("GATE_FALLBACK_HOME") {
            self.gate.fallback_home = v;
        }
        if let Some(v) = lookup("GATE_COOKIE_NAME") {
            self.gate.cookie_name = v;
        }
        if let Some(v) = lookup("GATE_PATH_MATCHING") {
            self.gate.path_matching = v
                .parse()
                .map_err(|reason| ConfigError::InvalidValue { key: "GATE_PATH_MATCHING", reason })?;
        }
        if let Some(v) = lookup("GATE_VERIFY_SIGNATURE") {
            self.gate.verify_signature = v.parse().unwrap_or(self.gate.verify_signature);
        }
        if let Some(v) = lookup("GATE_ROUTES_FILE") {
            self.gate.routes_file = Some(PathBuf::from(v)).filter(|p| !p.as_os_str().is_empty());
        }
        if let Some(v) = lookup("GATE_TRIGGER_PATTERNS") {
            self.gate.trigger_patterns = split_list(&v);
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_STATIC_DIR") {
            self.api.static_dir = Some(PathBuf::from(v)).filter(|p| !p.as_os_str().is_empty());
        }

        // Security overrides
        if let Some(v) = lookup("GATE_TOKEN_SECRET") {
            self.security.token_secret = v;
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Some(v) = lookup("SECURITY_TOKEN_EXPIRY_HOURS") {
            self.security.token_expiry_hours = v.parse().unwrap_or(self.security.token_expiry_hours);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("GATE_LOGIN_PATH", &self.gate.login_path),
            ("GATE_FALLBACK_HOME", &self.gate.fallback_home),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidPath { key, value: value.clone() });
            }
        }
        if self.gate.verify_signature && self.security.token_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(())
    }

    pub fn token_verification(&self) -> TokenVerification {
        if self.gate.verify_signature {
            TokenVerification::Verified { secret: self.security.token_secret.clone() }
        } else {
            TokenVerification::Unverified
        }
    }

    /// Build the immutable gate policy, loading the route table file if one is configured.
    pub fn gate_policy(&self) -> Result<GatePolicy, ConfigError> {
        let table = match &self.gate.routes_file {
            Some(path) => RouteTable::from_yaml_file(path)?,
            None => RouteTable::builtin(),
        };

        Ok(GatePolicy::new(table)
            .with_login_path(self.gate.login_path.clone())
            .with_fallback_home(self.gate.fallback_home.clone())
            .with_matching(self.gate.path_matching)
            .with_verification(self.token_verification()))
    }

    pub fn trigger_surface(&self, policy: &GatePolicy) -> TriggerSurface {
        if self.gate.trigger_patterns.is_empty() {
            policy.default_trigger_surface()
        } else {
            TriggerSurface::parse(self.gate.trigger_patterns.iter().map(String::as_str))
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn base_gate() -> GateConfig {
        GateConfig {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            fallback_home: DEFAULT_FALLBACK_HOME.to_string(),
            cookie_name: "token".to_string(),
            path_matching: PathMatching::Prefix,
            verify_signature: false,
            routes_file: None,
            trigger_patterns: Vec::new(),
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { host: "127.0.0.1".to_string(), port: 3000 },
            gate: Self::base_gate(),
            api: ApiConfig { enable_request_logging: true, static_dir: None },
            security: SecurityConfig {
                token_secret: "crm-system".to_string(),
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
                token_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 3000 },
            gate: Self::base_gate(),
            api: ApiConfig { enable_request_logging: true, static_dir: None },
            security: SecurityConfig {
                token_secret: String::new(),
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                token_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 3000 },
            gate: Self::base_gate(),
            api: ApiConfig { enable_request_logging: false, static_dir: None },
            security: SecurityConfig {
                token_secret: String::new(),
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                token_expiry_hours: 4,
            },
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.gate.login_path, "/signin");
        assert_eq!(config.gate.cookie_name, "token");
        assert!(!config.gate.verify_signature);
        assert_eq!(config.security.token_secret, "crm-system");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.token_secret.is_empty());
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.token_verification(), TokenVerification::Unverified);
    }

    #[test]
    fn overrides_apply() {
        let config = AppConfig::development()
            .with_overrides(overrides(&[
                ("CRM_GATE_PORT", "8081"),
                ("GATE_PATH_MATCHING", "segment"),
                ("GATE_TRIGGER_PATTERNS", "/agent/:path*, /signin"),
                ("GATE_VERIFY_SIGNATURE", "true"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.gate.path_matching, PathMatching::Segment);
        assert_eq!(config.gate.trigger_patterns, vec!["/agent/:path*", "/signin"]);
        assert!(config.token_verification().is_verified());
    }

    #[test]
    fn port_falls_back_to_generic_port_var() {
        let config = AppConfig::development().with_overrides(overrides(&[("PORT", "9000")])).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn verification_without_secret_is_rejected() {
        let err = AppConfig::production()
            .with_overrides(overrides(&[("GATE_VERIFY_SIGNATURE", "true")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret));
    }

    #[test]
    fn unknown_matching_mode_is_rejected() {
        let err = AppConfig::development()
            .with_overrides(overrides(&[("GATE_PATH_MATCHING", "fuzzy")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GATE_PATH_MATCHING", .. }));
    }

    #[test]
    fn relative_login_path_is_rejected() {
        let err = AppConfig::development()
            .with_overrides(overrides(&[("GATE_LOGIN_PATH", "signin")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { key: "GATE_LOGIN_PATH", .. }));
    }

    #[test]
    fn gate_policy_uses_builtin_table_by_default() {
        let config = AppConfig::development();
        let policy = config.gate_policy().unwrap();
        assert_eq!(policy.table, RouteTable::builtin());
        assert!(config.trigger_surface(&policy).covers("/dashboard/stats"));
    }

    #[test]
    fn explicit_trigger_patterns_replace_default_surface() {
        let config = AppConfig::development()
            .with_overrides(overrides(&[("GATE_TRIGGER_PATTERNS", "/agent/:path*")]))
            .unwrap();
        let policy = config.gate_policy().unwrap();
        let surface = config.trigger_surface(&policy);
        assert!(surface.covers("/agent/1"));
        assert!(!surface.covers("/dashboard"));
    }
}
