use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use gemini_relay::config::Config;
use gemini_relay::routes;
use gemini_relay::services::gemini::GeminiClient;
use gemini_relay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gemini_relay=debug,tower_http=info")),
        )
        .init();

    // Fail before binding anything if the credential is missing.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };

    let client = GeminiClient::from_config(&config).context("building Gemini HTTP client")?;
    tracing::info!(
        model = client.model(),
        history = config.history_enabled,
        static_dir = %config.static_dir,
        "upstream configured"
    );

    let state = Arc::new(
        AppState::new(Arc::new(client)).with_history(config.history_enabled),
    );

    let app = routes::create_router(&config.static_dir).with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("🚀 chat relay running at http://localhost:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
