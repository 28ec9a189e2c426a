//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;

use news_digest_core::Voice;
use tracing::Level;

const DEFAULT_VOICES: &str = "en-US=alloy,es-ES=nova,fr-FR=shimmer,de-DE=onyx";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub session_path: PathBuf,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub tts_model: String,
    pub voices: Vec<Voice>,
    pub audio_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Backend and Storage ---
        let api_base = lookup("NEWS_API_BASE")
            .unwrap_or_else(|| "http://localhost:5000/api".to_string());
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "NEWS_API_BASE".to_string(),
                format!("'{}' is not an http(s) URL", api_base),
            ));
        }
        let api_base = api_base.trim_end_matches('/').to_string();

        let session_path = lookup("SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".news_digest_session.json"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Speech ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let tts_model = lookup("TTS_MODEL").unwrap_or_else(|| "tts-1".to_string());
        let voices = parse_voices(
            &lookup("SPEECH_VOICES").unwrap_or_else(|| DEFAULT_VOICES.to_string()),
        )?;
        let audio_dir = lookup("AUDIO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./audio"));

        Ok(Self {
            api_base,
            session_path,
            log_level,
            openai_api_key,
            tts_model,
            voices,
            audio_dir,
        })
    }
}

/// Parses `lang=voice` pairs separated by commas, e.g. `en-US=alloy,es-ES=nova`.
fn parse_voices(raw: &str) -> Result<Vec<Voice>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((lang, name)) if !lang.trim().is_empty() && !name.trim().is_empty() => {
                Ok(Voice::new(name.trim(), lang.trim()))
            }
            _ => Err(ConfigError::InvalidValue(
                "SPEECH_VOICES".to_string(),
                format!("'{}' is not a lang=voice pair", entry),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base, "http://localhost:5000/api");
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.voices.len(), 4);
        assert_eq!(config.voices[0], Voice::new("alloy", "en-US"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = load(&[("NEWS_API_BASE", "https://digest.test/api/")]).unwrap();
        assert_eq!(config.api_base, "https://digest.test/api");
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            load(&[("NEWS_API_BASE", "localhost:5000")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "NEWS_API_BASE"
        ));
        assert!(matches!(
            load(&[("RUST_LOG", "chatty")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "RUST_LOG"
        ));
        assert!(matches!(
            load(&[("SPEECH_VOICES", "en-US=alloy,nova")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "SPEECH_VOICES"
        ));
    }

    #[test]
    fn blank_api_key_disables_speech() {
        let config = load(&[("OPENAI_API_KEY", "  ")]).unwrap();
        assert!(config.openai_api_key.is_none());
    }
}
