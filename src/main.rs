use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use mindful_core::config::EngineConfig;
use mindful_core::engine::SupportEngine;
use mindful_core::history::SessionStore;
use mindful_core::llm_client::OllamaClient;
use mindful_core::types::VoiceFeatures;

/// Interactive emotion-analysis loop: one user turn per stdin line,
/// one JSON analysis per stdout line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the engine config file (created with defaults if missing)
    #[arg(short, long, default_value = "mindful_config.json")]
    config: PathBuf,

    /// Probe the model server and exit
    #[arg(long)]
    check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// One stdin turn. Plain lines are treated as text-only; lines starting
/// with '{' may carry voice features alongside the text.
#[derive(Debug, Deserialize)]
struct TurnInput {
    text: String,
    #[serde(default)]
    voice_features: Option<VoiceFeatures>,
}

fn parse_turn(line: &str) -> TurnInput {
    if line.starts_with('{') {
        match serde_json::from_str(line) {
            Ok(input) => return input,
            Err(e) => {
                warn!("Malformed JSON turn, treating as plain text: {}", e);
            }
        }
    }
    TurnInput {
        text: line.to_string(),
        voice_features: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Invalid weights are fatal here, before any turn is accepted.
    let config = EngineConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let model = OllamaClient::new(&config.ollama).context("Failed to create model client")?;

    if args.check {
        let status = model.check_status().await;
        if status.connected {
            info!("Model server reachable; models: {:?}", status.available_models);
        } else {
            anyhow::bail!(
                "Model server unreachable: {}",
                status.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        return Ok(());
    }

    let engine = SupportEngine::new(config);
    let mut store = SessionStore::new(engine.history_window());
    let session_id = SessionStore::new_session_id();
    info!("Session {} started; reading turns from stdin", session_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let input = parse_turn(line);
        let history = store.recent(&session_id, engine.history_window());
        let analysis = engine
            .analyze_turn(&model, &input.text, input.voice_features.as_ref(), &history)
            .await;

        let response = analysis.to_response();
        println!("{}", serde_json::to_string(&response)?);

        store.record(
            &session_id,
            engine.to_turn(&input.text, input.voice_features.as_ref(), &analysis),
        );
    }

    info!("Session {} ended", session_id);
    Ok(())
}
