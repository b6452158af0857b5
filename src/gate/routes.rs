use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("failed to read route table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid route table: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("role '{0}' has no allowed paths")]
    EmptyRole(String),
    #[error("role '{role}' has prefix '{prefix}' which does not start with '/'")]
    InvalidPrefix { role: String, prefix: String },
}

/// Static mapping from role name to its ordered list of allowed path prefixes.
///
/// The first prefix of each role is that role's home path. Roles missing from
/// the table have no allowed paths at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    roles: BTreeMap<String, Vec<String>>,
}

impl RouteTable {
    /// The dashboard layout shipped with the CRM front end.
    pub fn builtin() -> Self {
        Self::from_entries([
            ("admin", &["/dashboard", "/accessmanagers", "/accessagent", "/query", "/manager"][..]),
            ("manager", &["/managerdashboard", "/manageraccessagents", "/managerquery"][..]),
            ("agent", &["/agent"][..]),
        ])
    }

    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
    {
        let roles = entries
            .into_iter()
            .map(|(role, prefixes)| {
                (role.to_string(), prefixes.iter().map(|p| p.to_string()).collect())
            })
            .collect();
        Self { roles }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, RouteTableError> {
        let table: RouteTable = serde_yaml::from_str(yaml)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, RouteTableError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RouteTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    fn validate(&self) -> Result<(), RouteTableError> {
        for (role, prefixes) in &self.roles {
            if prefixes.is_empty() {
                return Err(RouteTableError::EmptyRole(role.clone()));
            }
            if let Some(bad) = prefixes.iter().find(|p| !p.starts_with('/')) {
                return Err(RouteTableError::InvalidPrefix {
                    role: role.clone(),
                    prefix: bad.clone(),
                });
            }
        }
        Ok(())
    }

    /// Allowed prefixes for `role`, empty when the role is unknown.
    pub fn allowed(&self, role: &str) -> &[String] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn home(&self, role: &str) -> Option<&str> {
        self.allowed(role).first().map(String::as_str)
    }

    pub fn roles(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.roles.iter().map(|(role, prefixes)| (role.as_str(), prefixes.as_slice()))
    }

    /// Every prefix of every role, deduplicated, in table order.
    pub fn all_prefixes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for (_, prefixes) in self.roles() {
            for prefix in prefixes {
                if !seen.contains(&prefix.as_str()) {
                    seen.push(prefix.as_str());
                }
            }
        }
        seen
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::builtin()
    }
}
