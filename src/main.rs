use anyhow::Context;

use talentscout::config::ScreeningConfig;
use talentscout::llm::create_provider;
use talentscout::sentiment::SentimentClassifier;
use talentscout::server::{screening_routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Missing credentials are fatal at startup, never per-call.
    let config = ScreeningConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("🤖 TalentScout v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   API: http://0.0.0.0:{}/api/session", config.port);
    eprintln!("   Language: {}\n", config.default_language);

    let provider = create_provider(&config)?;
    let state = AppState::new(
        provider,
        SentimentClassifier::vader(),
        config.default_language.clone(),
    );
    let app = screening_routes(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Screening server started");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
