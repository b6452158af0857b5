pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "crmctl")]
#[command(about = "crmctl - inspect and exercise the CRM access gate")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Evaluate the gate decision for a path and optional token")]
    Check(commands::check::CheckArgs),

    #[command(about = "Show the effective route table and trigger surface")]
    Routes,

    #[command(about = "Mint a signed development token")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::AppConfig::from_env()?;

    match cli.command {
        Commands::Check(args) => commands::check::handle(args, &config, output_format).await,
        Commands::Routes => commands::routes::handle(&config, output_format).await,
        Commands::Token(args) => commands::token::handle(args, &config, output_format).await,
    }
}
