use anyhow::Context;
use crm_gate::config::{AppConfig, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up GATE_* settings
    let _ = dotenvy::dotenv();

    crm_gate::logging::init("crm_gate=info,tower_http=info");

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting CRM access gate in {:?} mode", config.environment);

    if !config.gate.verify_signature {
        tracing::warn!("session token signatures are NOT verified; role claims are trusted as sent");
        if config.environment == Environment::Production {
            tracing::warn!("running unverified in production; set GATE_VERIFY_SIGNATURE=true and GATE_TOKEN_SECRET");
        }
    }

    let app = crm_gate::app::app(&config).context("failed to build router")?;

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
