use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an allowed prefix is compared with a requested path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMatching {
    /// Plain case-sensitive `starts_with`. `/agent` also admits `/agentx`.
    #[default]
    Prefix,
    /// Prefix must end on a `/` boundary of the path.
    Segment,
}

impl PathMatching {
    pub fn matches(self, prefix: &str, path: &str) -> bool {
        match self {
            PathMatching::Prefix => path.starts_with(prefix),
            PathMatching::Segment => {
                let prefix = prefix.trim_end_matches('/');
                if prefix.is_empty() {
                    return path.starts_with('/');
                }
                match path.strip_prefix(prefix) {
                    Some(rest) => rest.is_empty() || rest.starts_with('/'),
                    None => false,
                }
            }
        }
    }
}

impl FromStr for PathMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(PathMatching::Prefix),
            "segment" => Ok(PathMatching::Segment),
            other => Err(format!("unknown path matching mode '{}'", other)),
        }
    }
}

impl fmt::Display for PathMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMatching::Prefix => write!(f, "prefix"),
            PathMatching::Segment => write!(f, "segment"),
        }
    }
}

const SUBTREE_SUFFIX: &str = "/:path*";

/// One entry of the trigger surface, written in matcher syntax:
/// `/signin` is exact, `/dashboard/:path*` covers `/dashboard` and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerPattern {
    Exact(String),
    Subtree(String),
}

impl TriggerPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix(SUBTREE_SUFFIX) {
            Some(base) => TriggerPattern::Subtree(base.to_string()),
            None => TriggerPattern::Exact(pattern.to_string()),
        }
    }

    pub fn subtree(base: &str) -> Self {
        TriggerPattern::Subtree(base.trim_end_matches('/').to_string())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            TriggerPattern::Exact(exact) => path == exact,
            TriggerPattern::Subtree(base) => match path.strip_prefix(base.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

impl fmt::Display for TriggerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPattern::Exact(exact) => write!(f, "{}", exact),
            TriggerPattern::Subtree(base) => write!(f, "{}{}", base, SUBTREE_SUFFIX),
        }
    }
}

/// The set of paths the gate runs for. Everything else bypasses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSurface {
    patterns: Vec<TriggerPattern>,
}

impl TriggerSurface {
    pub fn new(patterns: Vec<TriggerPattern>) -> Self {
        Self { patterns }
    }

    pub fn parse<'a, I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::new(
            patterns
                .into_iter()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(TriggerPattern::parse)
                .collect(),
        )
    }

    /// Every route table prefix as a subtree, plus the login path itself.
    pub fn covering(prefixes: &[&str], login_path: &str) -> Self {
        let mut patterns: Vec<TriggerPattern> =
            prefixes.iter().map(|prefix| TriggerPattern::subtree(prefix)).collect();
        patterns.push(TriggerPattern::Exact(login_path.to_string()));
        Self::new(patterns)
    }

    pub fn covers(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }

    pub fn patterns(&self) -> &[TriggerPattern] {
        &self.patterns
    }
}

/// The path a file server would resolve `raw` to: percent-decoded, with empty
/// and `.` segments dropped and `..` applied. A trailing slash is kept.
///
/// Returns `None` when the path is not absolute or does not decode to UTF-8.
pub fn canonical_path(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    if !decoded.starts_with('/') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut canonical = format!("/{}", segments.join("/"));
    let last = decoded.rsplit('/').next().unwrap_or_default();
    if matches!(last, "" | "." | "..") && canonical != "/" {
        canonical.push('/');
    }
    Some(canonical)
}
