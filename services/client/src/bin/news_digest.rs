//! services/client/src/bin/news_digest.rs

use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use client_lib::{
    adapters::{FileSessionStore, HttpNewsApi, OpenAiSpeechAdapter},
    config::Config,
    error::ClientError,
    terminal::App,
};
use news_digest_core::SpeechSynthesizer;
use tokio::io::{stdin, stdout, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Backend at {}", config.api_base);

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder().build()?;
    let api = Arc::new(HttpNewsApi::new(http, config.api_base.clone()));
    let store = Arc::new(FileSessionStore::new(config.session_path.clone()));

    let speech: Option<Arc<dyn SpeechSynthesizer>> = match &config.openai_api_key {
        Some(key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            let adapter = OpenAiSpeechAdapter::new(
                openai_client,
                &config.tts_model,
                config.voices.clone(),
                config.audio_dir.clone(),
            )?;
            info!("Text-to-speech enabled; audio goes to {}", config.audio_dir.display());
            Some(Arc::new(adapter))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; read-aloud is unavailable.");
            None
        }
    };

    // --- 3. Run the Terminal Client ---
    let app = App::new(api, store, speech);
    app.run(BufReader::new(stdin()), stdout()).await
}
