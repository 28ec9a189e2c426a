//! crates/news_digest_core/src/preferences.rs
//!
//! The preference collector: topic multi-selection and language single-selection.

use std::collections::HashSet;

use crate::domain::{Preferences, DEFAULT_LANGUAGE, LANGUAGES, TOPICS};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Holds the reader's current selection. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct PreferenceCollector {
    selected: HashSet<&'static str>,
    language: &'static str,
}

impl Default for PreferenceCollector {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
            language: DEFAULT_LANGUAGE,
        }
    }
}

impl PreferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the topic if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle_topic(&mut self, topic: &str) -> Result<bool, PreferenceError> {
        let topic = TOPICS
            .iter()
            .copied()
            .find(|t| t.eq_ignore_ascii_case(topic))
            .ok_or_else(|| PreferenceError::UnknownTopic(topic.to_string()))?;

        if self.selected.remove(topic) {
            Ok(false)
        } else {
            self.selected.insert(topic);
            Ok(true)
        }
    }

    pub fn select_language(&mut self, code: &str) -> Result<(), PreferenceError> {
        self.language = LANGUAGES
            .iter()
            .map(|(c, _)| *c)
            .find(|c| c.eq_ignore_ascii_case(code))
            .ok_or_else(|| PreferenceError::UnsupportedLanguage(code.to_string()))?;
        Ok(())
    }

    pub fn is_selected(&self, topic: &str) -> bool {
        self.selected.contains(topic)
    }

    pub fn language(&self) -> &str {
        self.language
    }

    /// Selected topics in catalog order.
    pub fn topics(&self) -> Vec<&'static str> {
        TOPICS
            .iter()
            .copied()
            .filter(|t| self.selected.contains(t))
            .collect()
    }

    /// The submit control is enabled exactly when nothing is loading and a topic is chosen.
    pub fn can_submit(&self, loading: bool) -> bool {
        !(loading || self.selected.is_empty())
    }

    /// Packages the selection. The selection itself is left untouched.
    pub fn submit(&self, loading: bool) -> Option<Preferences> {
        if !self.can_submit(loading) {
            return None;
        }
        Some(Preferences {
            topics: self.topics().into_iter().map(str::to_string).collect(),
            language: self.language.to_string(),
        })
    }
}
