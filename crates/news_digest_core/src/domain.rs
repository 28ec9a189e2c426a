//! crates/news_digest_core/src/domain.rs
//!
//! Defines the pure, core data structures for the news digest client.
//! These structs are independent of any transport or serialization format.

use std::fmt;

/// The topics a reader can subscribe to, in the order they are presented.
pub const TOPICS: [&str; 8] = [
    "technology",
    "science",
    "business",
    "health",
    "sports",
    "entertainment",
    "politics",
    "world",
];

/// Language codes the digest can be requested in, paired with display names.
pub const LANGUAGES: [(&str, &str); 10] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("hi", "Hindi"),
    ("ja", "Japanese"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
];

pub const DEFAULT_LANGUAGE: &str = "en";

/// Opaque identifier the backend hands out on login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated identity, passed explicitly to every action that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: UserId,
}

/// Username/password pair sent to the register and login endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Parsed body of a register or login call.
///
/// The backend answers with either a success field (`message` or `user_id`)
/// or an `error` field, independent of the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthReply {
    pub user_id: Option<UserId>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// What the reader asked for: a non-empty topic set and one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub topics: Vec<String>,
    pub language: String,
}

/// A single summarized article as returned by the digest endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_date: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// The full digest response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Digest {
    pub articles: Vec<Article>,
    /// Generation time reported by the backend, if any.
    pub timestamp: Option<String>,
}

/// One interaction with an article, reported back to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    pub user_id: UserId,
    pub article_url: String,
    pub article_title: String,
    /// `Some(true)` for a like, `Some(false)` for a dislike, `None` when unrated.
    pub liked: Option<bool>,
    pub clicked_full_article: bool,
    /// Seconds between the digest being shown and the interaction.
    pub time_spent: f64,
}

/// A text-to-speech voice and the BCP-47 language tag it speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Returns true if `code` is one of the supported digest languages.
pub fn is_supported_language(code: &str) -> bool {
    LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Display name for a language code, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(code, |(_, name)| name)
}

/// Picks the voice for `lang`: an exact tag match wins, otherwise the first
/// voice sharing the primary subtag (`en` matches `en-US`, `en-GB` matches `en-US`).
pub fn match_voice<'a>(voices: &'a [Voice], lang: &str) -> Option<&'a Voice> {
    let exact = voices.iter().find(|v| v.lang.eq_ignore_ascii_case(lang));
    exact.or_else(|| {
        let primary = primary_subtag(lang);
        if primary.is_empty() {
            return None;
        }
        voices
            .iter()
            .find(|v| primary_subtag(&v.lang).eq_ignore_ascii_case(primary))
    })
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Voice> {
        vec![
            Voice::new("alloy", "en-US"),
            Voice::new("nova", "es-ES"),
            Voice::new("fable", "en-GB"),
        ]
    }

    #[test]
    fn exact_tag_beats_prefix() {
        let voices = catalog();
        assert_eq!(match_voice(&voices, "en-GB").map(|v| v.name.as_str()), Some("fable"));
        assert_eq!(match_voice(&voices, "EN-us").map(|v| v.name.as_str()), Some("alloy"));
    }

    #[test]
    fn bare_code_matches_by_prefix() {
        let voices = catalog();
        assert_eq!(match_voice(&voices, "es").map(|v| v.name.as_str()), Some("nova"));
        assert_eq!(match_voice(&voices, "en-AU").map(|v| v.name.as_str()), Some("alloy"));
    }

    #[test]
    fn unknown_language_has_no_voice() {
        assert!(match_voice(&catalog(), "ja").is_none());
        assert!(match_voice(&catalog(), "").is_none());
        assert!(match_voice(&[], "en").is_none());
    }

    #[test]
    fn language_catalog_lookups() {
        assert!(is_supported_language(DEFAULT_LANGUAGE));
        assert!(!is_supported_language("xx"));
        assert_eq!(language_name("fr"), "French");
        assert_eq!(language_name("xx"), "xx");
    }
}
