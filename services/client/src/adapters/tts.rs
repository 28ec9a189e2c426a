//! services/client/src/adapters/tts.rs
//!
//! This module contains the adapter for OpenAI's Text-to-Speech (TTS) service.
//! It implements the `SpeechSynthesizer` port from the `core` crate.
//!
//! A terminal has no audio element, so each utterance is written to the audio
//! directory as an MP3 file and its path is logged.

use std::path::PathBuf;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{CreateSpeechRequest, SpeechModel, Voice as OpenAiVoice},
    Client,
};
use async_trait::async_trait;
use news_digest_core::{match_voice, PortError, PortResult, SpeechSynthesizer, Voice};
use tracing::info;
use uuid::Uuid;

use crate::error::ClientError;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SpeechSynthesizer` port using the OpenAI TTS API.
#[derive(Clone)]
pub struct OpenAiSpeechAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voices: Vec<Voice>,
    output_dir: PathBuf,
}

impl OpenAiSpeechAdapter {
    /// Creates a new `OpenAiSpeechAdapter`. Every catalog entry must name an OpenAI voice.
    pub fn new(
        client: Client<OpenAIConfig>,
        model: &str,
        voices: Vec<Voice>,
        output_dir: PathBuf,
    ) -> Result<Self, ClientError> {
        for voice in &voices {
            openai_voice(&voice.name).ok_or_else(|| {
                ClientError::Internal(format!(
                    "Invalid TTS voice specified in config: '{}'",
                    voice.name
                ))
            })?;
        }

        let model = match model {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };

        Ok(Self {
            client,
            model,
            voices,
            output_dir,
        })
    }
}

fn openai_voice(name: &str) -> Option<OpenAiVoice> {
    match name.to_lowercase().as_str() {
        "alloy" => Some(OpenAiVoice::Alloy),
        "echo" => Some(OpenAiVoice::Echo),
        "fable" => Some(OpenAiVoice::Fable),
        "onyx" => Some(OpenAiVoice::Onyx),
        "nova" => Some(OpenAiVoice::Nova),
        "shimmer" => Some(OpenAiVoice::Shimmer),
        _ => None,
    }
}

//=========================================================================================
// `SpeechSynthesizer` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechAdapter {
    fn resolve_voice(&self, lang: &str) -> Option<Voice> {
        match_voice(&self.voices, lang).cloned()
    }

    async fn speak(&self, text: &str, voice: &Voice) -> PortResult<()> {
        let openai_voice = openai_voice(&voice.name)
            .ok_or_else(|| PortError::Unexpected(format!("Unknown voice '{}'", voice.name)))?;

        let request = CreateSpeechRequest {
            model: self.model.clone(),
            input: text.to_string(),
            voice: openai_voice,
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .audio()
            .speech()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;
        let path = self
            .output_dir
            .join(format!("{}-{}.mp3", voice.lang, Uuid::new_v4()));
        tokio::fs::write(&path, &response.bytes)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;

        info!("Summary audio ({}, {}) written to {}", voice.name, voice.lang, path.display());
        Ok(())
    }
}
