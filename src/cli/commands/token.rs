use clap::Args;
use serde_json::json;

use crate::auth::{issue_token, Claims};
use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(help = "Role claim, e.g. admin, manager, agent")]
    pub role: String,

    #[arg(long, help = "Signing secret (defaults to GATE_TOKEN_SECRET)")]
    pub secret: Option<String>,

    #[arg(long, help = "Validity in hours (defaults to the configured expiry)")]
    pub hours: Option<u64>,

    #[arg(long, help = "Subject claim")]
    pub sub: Option<String>,
}

pub async fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let secret = args.secret.unwrap_or_else(|| config.security.token_secret.clone());
    let hours = args.hours.unwrap_or(config.security.token_expiry_hours);

    if config.gate_policy()?.table.home(&args.role).is_none() {
        tracing::warn!("role '{}' is not in the route table; the gate will treat it as unknown", args.role);
    }

    let mut claims = Claims::new(args.role, hours)?;
    if let Some(sub) = args.sub {
        claims = claims.with_subject(sub);
    }
    let token = issue_token(&claims, &secret)?;

    match output_format {
        OutputFormat::Json => utils::output_success(
            &output_format,
            "token issued",
            Some(json!({ "token": token, "claims": claims })),
        ),
        // Bare token so it can be piped into a cookie jar
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
