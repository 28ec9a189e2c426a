//! crates/news_digest_core/src/digest.rs
//!
//! The digest renderer's state: loading/empty/populated phases, fetch
//! sequencing, and the per-card actions that produce activity events and
//! utterances.

use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::{
    domain::{ActivityEvent, Article, Digest, Preferences, SessionContext, Voice},
    ports::{NewsApi, PortResult, SpeechSynthesizer},
};

/// The message shown for any digest failure, whatever its cause.
pub const FETCH_FAILED: &str = "Failed to fetch news";

#[derive(Debug, Clone, PartialEq)]
pub enum DigestPhase<'a> {
    Loading,
    Empty,
    Populated(&'a [Article]),
}

/// Identifies one digest request. Only the most recently issued ticket may apply its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed,
    /// A newer request was issued; this response was dropped.
    Stale,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CardError {
    #[error("There is no article #{0}")]
    NoSuchArticle(usize),
    #[error("Sign in to rate articles")]
    NotSignedIn,
    #[error("This article has no link")]
    NoLink,
    #[error("Text-to-speech is not supported")]
    SpeechUnsupported,
    #[error("No voice available for language '{0}'")]
    NoVoice(String),
}

/// What to say and with which voice. Produced by `read_aloud`; the caller speaks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub voice: Voice,
}

/// Result of following an article's link.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickThrough {
    pub url: String,
    /// Present only when someone is signed in.
    pub event: Option<ActivityEvent>,
}

#[derive(Debug)]
pub struct DigestView {
    articles: Vec<Article>,
    generated_at: Option<String>,
    loading: bool,
    error: Option<String>,
    latest_seq: u64,
    shown_at: Instant,
}

impl Default for DigestView {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            generated_at: None,
            loading: false,
            error: None,
            latest_seq: 0,
            shown_at: Instant::now(),
        }
    }
}

impl DigestView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DigestPhase<'_> {
        if self.loading {
            DigestPhase::Loading
        } else if self.articles.is_empty() {
            DigestPhase::Empty
        } else {
            DigestPhase::Populated(&self.articles)
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn generated_at(&self) -> Option<&str> {
        self.generated_at.as_deref()
    }

    /// Marks a new request as in flight and returns its ticket.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_seq += 1;
        self.loading = true;
        self.error = None;
        FetchTicket {
            seq: self.latest_seq,
        }
    }

    /// Applies a response unless a newer request has been issued since.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: PortResult<Digest>) -> FetchOutcome {
        if ticket.seq != self.latest_seq {
            debug!(seq = ticket.seq, latest = self.latest_seq, "Dropping stale digest response");
            return FetchOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(digest) => {
                debug!(count = digest.articles.len(), "Digest received");
                self.articles = digest.articles;
                self.generated_at = digest.timestamp;
                self.shown_at = Instant::now();
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!("Digest fetch failed: {}", e);
                self.error = Some(FETCH_FAILED.to_string());
                FetchOutcome::Failed
            }
        }
    }

    /// Issues a request and applies its response in one step.
    pub async fn fetch(&mut self, api: &dyn NewsApi, preferences: &Preferences) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let result = api.fetch_digest(preferences).await;
        self.complete_fetch(ticket, result)
    }

    fn article(&self, index: usize) -> Result<&Article, CardError> {
        self.articles
            .get(index)
            .ok_or(CardError::NoSuchArticle(index + 1))
    }

    fn event_for(&self, article: &Article, session: &SessionContext) -> ActivityEvent {
        ActivityEvent {
            user_id: session.user_id.clone(),
            article_url: article.url.clone().unwrap_or_default(),
            article_title: article.title.clone(),
            liked: None,
            clicked_full_article: false,
            time_spent: self.shown_at.elapsed().as_secs_f64(),
        }
    }

    /// Prepares the article summary for speech in the given language.
    pub fn read_aloud(
        &self,
        index: usize,
        language: &str,
        speech: Option<&dyn SpeechSynthesizer>,
    ) -> Result<Utterance, CardError> {
        let article = self.article(index)?;
        let speech = speech.ok_or(CardError::SpeechUnsupported)?;
        let voice = speech
            .resolve_voice(language)
            .ok_or_else(|| CardError::NoVoice(language.to_string()))?;
        Ok(Utterance {
            text: article.summary.clone(),
            voice,
        })
    }

    pub fn like(&self, index: usize, session: Option<&SessionContext>) -> Result<ActivityEvent, CardError> {
        self.rate(index, session, true)
    }

    pub fn dislike(&self, index: usize, session: Option<&SessionContext>) -> Result<ActivityEvent, CardError> {
        self.rate(index, session, false)
    }

    fn rate(
        &self,
        index: usize,
        session: Option<&SessionContext>,
        liked: bool,
    ) -> Result<ActivityEvent, CardError> {
        let article = self.article(index)?;
        let session = session.ok_or(CardError::NotSignedIn)?;
        Ok(ActivityEvent {
            liked: Some(liked),
            ..self.event_for(article, session)
        })
    }

    pub fn open_full_article(
        &self,
        index: usize,
        session: Option<&SessionContext>,
    ) -> Result<ClickThrough, CardError> {
        let article = self.article(index)?;
        let url = article.url.clone().ok_or(CardError::NoLink)?;
        let event = session.map(|session| ActivityEvent {
            clicked_full_article: true,
            ..self.event_for(article, session)
        });
        Ok(ClickThrough { url, event })
    }
}

/// Formats a published date as `YYYY-MM-DD` when it can be parsed, verbatim otherwise.
pub fn display_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.date_naive().to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.date().to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UserId,
        ports::PortError,
        testing::{MockNewsApi, MockSpeech},
    };

    fn article(title: &str, url: Option<&str>) -> Article {
        Article {
            title: title.to_string(),
            summary: format!("{title} in brief."),
            source: "wire".to_string(),
            published_date: "2024-05-01 09:30:00".to_string(),
            url: url.map(str::to_string),
            image_url: None,
        }
    }

    fn digest(titles: &[&str]) -> Digest {
        Digest {
            articles: titles
                .iter()
                .map(|t| article(t, Some(&format!("https://news.test/{t}"))))
                .collect(),
            timestamp: None,
        }
    }

    fn session() -> SessionContext {
        SessionContext {
            user_id: UserId::new("u1"),
        }
    }

    fn populated(titles: &[&str]) -> DigestView {
        let mut view = DigestView::new();
        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, Ok(digest(titles)));
        view
    }

    #[test]
    fn phases_follow_loading_and_contents() {
        let mut view = DigestView::new();
        assert_eq!(view.phase(), DigestPhase::Empty);

        let ticket = view.begin_fetch();
        assert_eq!(view.phase(), DigestPhase::Loading);

        view.complete_fetch(ticket, Ok(digest(&["b", "a"])));
        match view.phase() {
            DigestPhase::Populated(articles) => {
                let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
                assert_eq!(titles, vec!["b", "a"]);
            }
            other => panic!("expected populated, got {other:?}"),
        }
    }

    #[test]
    fn failure_keeps_articles_and_clears_loading() {
        let mut view = populated(&["kept"]);

        let ticket = view.begin_fetch();
        let outcome = view.complete_fetch(
            ticket,
            Err(PortError::Status {
                status: 404,
                body: "{\"error\":\"No articles found\"}".into(),
            }),
        );

        assert_eq!(outcome, FetchOutcome::Failed);
        assert!(!view.is_loading());
        assert_eq!(view.error(), Some(FETCH_FAILED));
        assert_eq!(view.articles()[0].title, "kept");
    }

    #[test]
    fn new_fetch_clears_previous_error() {
        let mut view = DigestView::new();
        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, Err(PortError::Transport("down".into())));
        assert!(view.error().is_some());

        view.begin_fetch();
        assert!(view.error().is_none());
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut view = DigestView::new();
        let first = view.begin_fetch();
        let second = view.begin_fetch();

        assert_eq!(view.complete_fetch(second, Ok(digest(&["fresh"]))), FetchOutcome::Applied);
        assert_eq!(view.complete_fetch(first, Ok(digest(&["old"]))), FetchOutcome::Stale);
        assert_eq!(view.articles()[0].title, "fresh");
        assert!(first.seq() < second.seq());
    }

    #[test]
    fn stale_response_does_not_end_loading() {
        let mut view = DigestView::new();
        let first = view.begin_fetch();
        let _second = view.begin_fetch();

        view.complete_fetch(first, Err(PortError::Transport("late".into())));
        assert!(view.is_loading());
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn fetch_sends_exactly_one_request() {
        let api = MockNewsApi::new();
        api.enqueue_digest(Ok(digest(&["one"])));
        let prefs = Preferences {
            topics: vec!["science".into(), "health".into()],
            language: "de".into(),
        };

        let mut view = DigestView::new();
        assert_eq!(view.fetch(&api, &prefs).await, FetchOutcome::Applied);
        assert_eq!(api.tracked_digests(), vec![prefs]);
    }

    #[test]
    fn like_and_dislike_need_a_session() {
        let view = populated(&["a"]);
        assert_eq!(view.like(0, None), Err(CardError::NotSignedIn));
        assert_eq!(view.dislike(0, None), Err(CardError::NotSignedIn));

        let liked = view.like(0, Some(&session())).unwrap();
        assert_eq!(liked.liked, Some(true));
        assert!(!liked.clicked_full_article);
        assert_eq!(liked.article_url, "https://news.test/a");
        assert_eq!(liked.user_id.as_str(), "u1");

        let disliked = view.dislike(0, Some(&session())).unwrap();
        assert_eq!(disliked.liked, Some(false));
        assert!(!disliked.clicked_full_article);
    }

    #[test]
    fn click_through_reports_unrated_click() {
        let view = populated(&["a"]);
        let click = view.open_full_article(0, Some(&session())).unwrap();
        assert_eq!(click.url, "https://news.test/a");
        let event = click.event.unwrap();
        assert!(event.clicked_full_article);
        assert_eq!(event.liked, None);

        let anonymous = view.open_full_article(0, None).unwrap();
        assert!(anonymous.event.is_none());
    }

    #[test]
    fn click_through_without_link_is_refused() {
        let mut view = DigestView::new();
        let ticket = view.begin_fetch();
        view.complete_fetch(
            ticket,
            Ok(Digest {
                articles: vec![article("linkless", None)],
                timestamp: None,
            }),
        );
        assert_eq!(view.open_full_article(0, Some(&session())), Err(CardError::NoLink));
    }

    #[test]
    fn card_index_out_of_range() {
        let view = populated(&["a"]);
        assert_eq!(view.like(3, Some(&session())), Err(CardError::NoSuchArticle(4)));
    }

    #[test]
    fn read_aloud_resolves_voice_or_warns() {
        let view = populated(&["a"]);
        let speech = MockSpeech::new(vec![Voice::new("alloy", "en-US")]);

        let utterance = view.read_aloud(0, "en", Some(&speech)).unwrap();
        assert_eq!(utterance.text, "a in brief.");
        assert_eq!(utterance.voice.name, "alloy");

        assert_eq!(
            view.read_aloud(0, "ja", Some(&speech)),
            Err(CardError::NoVoice("ja".into()))
        );
        assert_eq!(view.read_aloud(0, "en", None), Err(CardError::SpeechUnsupported));
        assert!(speech.spoken().is_empty());
    }

    #[test]
    fn dates_are_shortened_when_parseable() {
        assert_eq!(display_date("2024-05-01 09:30:00"), "2024-05-01");
        assert_eq!(display_date("2024-05-01T09:30:00Z"), "2024-05-01");
        assert_eq!(display_date("Wed, 01 May 2024 09:30:00 +0000"), "2024-05-01");
        assert_eq!(display_date("yesterday"), "yesterday");
        assert_eq!(display_date(""), "");
    }
}
