use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let policy = config.gate_policy()?;
    let surface = config.trigger_surface(&policy);

    let roles: serde_json::Map<String, serde_json::Value> = policy
        .table
        .roles()
        .map(|(role, prefixes)| (role.to_string(), json!(prefixes)))
        .collect();
    let patterns: Vec<String> = surface.patterns().iter().map(ToString::to_string).collect();

    let data = json!({
        "login_path": policy.login_path,
        "fallback_home": policy.fallback_home,
        "matching": policy.matching.to_string(),
        "verified": policy.verification.is_verified(),
        "roles": roles,
        "trigger_patterns": patterns,
    });

    let mut text = format!(
        "login: {}  fallback home: {}  matching: {}  verified: {}\n",
        policy.login_path,
        policy.fallback_home,
        policy.matching,
        policy.verification.is_verified()
    );
    for (role, prefixes) in policy.table.roles() {
        let home = prefixes.first().map(String::as_str).unwrap_or("-");
        text.push_str(&format!("{:<10} home {:<20} allows {}\n", role, home, prefixes.join(", ")));
    }
    text.push_str(&format!("gate runs for: {}", patterns.join(", ")));

    utils::output(&output_format, &data, &text)
}
