use clap::Args;
use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;
use crate::gate::{canonical_path, evaluate_verbose, Decision};

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(help = "Requested path, e.g. /agent/7")]
    pub path: String,

    #[arg(long, help = "Value of the session cookie (omit for an anonymous request)")]
    pub token: Option<String>,
}

pub async fn handle(args: CheckArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let policy = config.gate_policy()?;
    let surface = config.trigger_surface(&policy);
    let path = canonical_path(&args.path)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not an absolute, UTF-8 decodable path", args.path))?;

    if !surface.covers(&path) {
        let data = json!({ "path": args.path, "gated": false, "decision": "proceed" });
        let text = format!("{} is outside the trigger surface: proceed (gate bypassed)", args.path);
        return utils::output(&output_format, &data, &text);
    }

    let token = args.token.as_deref().filter(|t| !t.is_empty());
    let verdict = evaluate_verbose(&path, token, &policy);
    let reason = verdict.denial.as_ref().map(ToString::to_string);

    let (decision, location) = match &verdict.decision {
        Decision::Proceed => ("proceed", None),
        Decision::RedirectTo(to) => ("redirect", Some(to.as_str())),
    };

    let data = json!({
        "path": path,
        "gated": true,
        "decision": decision,
        "location": location,
        "role": verdict.role,
        "reason": reason,
    });

    let mut text = match location {
        Some(to) => format!("{}: redirect to {}", args.path, to),
        None => format!("{}: proceed", args.path),
    };
    if let Some(reason) = reason {
        text.push_str(&format!(" ({})", reason));
    }

    utils::output(&output_format, &data, &text)
}
