//! BMO server binary - composition root.
//!
//! 1. Load configuration from TOML, then env vars, then CLI flags
//! 2. Build the OpenRouter chat client and the speech client
//! 3. Wire session store, model fallback, and orchestrator
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;

use bmo_api::routes;
use bmo_api::state::AppState;
use bmo_chat::{
    ConversationOrchestrator, EvictionPolicy, ModelCandidates, ModelFallback, OpenAiSpeechClient,
    OpenRouterClient, RetryPolicy, SessionStore,
};
use bmo_core::config::BmoConfig;
use bmo_core::error::BmoError;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = BmoConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    args.apply_to(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting BMO v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Upstream clients.
    let chat_client = OpenRouterClient::new(&config.openrouter, &config.general)
        .map_err(|e| BmoError::Config(format!("Failed to build OpenRouter client: {}", e)))?;
    let speech_client = OpenAiSpeechClient::new(&config.speech)
        .map_err(|e| BmoError::Config(format!("Failed to build speech client: {}", e)))?;

    // Conversation core.
    let candidates = ModelCandidates::from_config(&config.openrouter);
    tracing::info!(
        models = ?candidates.as_slice(),
        "Model fallback order"
    );
    let models = ModelFallback::new(
        Arc::new(chat_client),
        candidates,
        RetryPolicy::from_config(&config.openrouter),
    );
    let store = Arc::new(SessionStore::with_policy(EvictionPolicy::from_config(
        &config.sessions,
    )));
    let conversation = ConversationOrchestrator::new(
        store,
        models,
        Arc::new(speech_client),
        &config.conversation,
    );

    // === API server ===

    let state = AppState::new(config.clone(), conversation);
    if let Err(e) = routes::start_server(&config, state).await {
        tracing::error!(error = %e, "API server failed");
        return Err(e.into());
    }

    Ok(())
}
