//! services/client/src/terminal/render.rs
//!
//! Turns the view-model state into text. Pure functions; nothing here does IO.

use std::fmt::Write;

use news_digest_core::{
    display_date, language_name, Article, AuthMode, DigestPhase, DigestView, Notice,
    PreferenceCollector, SessionController, LANGUAGES, TOPICS,
};

pub const TITLE: &str = "AI News Digest";

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(message) => format!("✓ {message}"),
        Notice::Error(message) => format!("! {message}"),
    }
}

pub fn render_auth(session: &SessionController) -> String {
    let mut out = String::new();
    let (heading, other) = match session.mode() {
        AuthMode::Login => ("Login", "register"),
        AuthMode::Register => ("Register", "login"),
    };
    let _ = writeln!(out, "== {heading} ==");
    let _ = writeln!(out, "  username: {}", session.username());
    let _ = writeln!(out, "  password: {}", "*".repeat(session.password().chars().count()));
    if session.is_pending() {
        let _ = writeln!(out, "  … waiting for the server");
    } else {
        let _ = writeln!(out, "  'submit' to {}, 'mode' to {other} instead", heading.to_lowercase());
    }
    if let Some(notice) = session.notice() {
        let _ = writeln!(out, "{}", render_notice(notice));
    }
    out
}

pub fn render_preferences(prefs: &PreferenceCollector, loading: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Select Your News Preferences ==");
    for topic in TOPICS {
        let mark = if prefs.is_selected(topic) { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {}", capitalize(topic));
    }

    let codes: Vec<&str> = LANGUAGES.iter().map(|(code, _)| *code).collect();
    let _ = writeln!(
        out,
        "  Language: {} ({})   available: {}",
        language_name(prefs.language()),
        prefs.language(),
        codes.join(" ")
    );

    let button = if loading {
        "[ Loading… ]"
    } else if prefs.can_submit(loading) {
        "[ Get News Digest ]  (type 'digest')"
    } else {
        "[ Get News Digest ]  (select at least one topic)"
    };
    let _ = writeln!(out, "  {button}");
    out
}

pub fn render_card(number: usize, article: &Article, signed_in: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{number}] {}", article.title);
    if !article.summary.is_empty() {
        let _ = writeln!(out, "    {}", article.summary);
    }
    let _ = writeln!(
        out,
        "    Source: {}   {}",
        article.source,
        display_date(&article.published_date)
    );
    if let Some(image) = &article.image_url {
        let _ = writeln!(out, "    Image: {image}");
    }

    let mut actions = vec![format!("read {number}")];
    if signed_in {
        actions.push(format!("like {number}"));
        actions.push(format!("dislike {number}"));
    }
    if article.url.is_some() {
        actions.push(format!("open {number} (Read full article)"));
    }
    let _ = writeln!(out, "    > {}", actions.join(" | "));
    out
}

pub fn render_digest(view: &DigestView, signed_in: bool) -> String {
    let mut out = String::new();
    if let Some(error) = view.error() {
        let _ = writeln!(out, "! {error}");
    }
    match view.phase() {
        DigestPhase::Loading => {
            let _ = writeln!(out, "… fetching your digest");
        }
        DigestPhase::Empty => {}
        DigestPhase::Populated(articles) => {
            let _ = writeln!(out, "== Your Personalized News Digest ==");
            if let Some(at) = view.generated_at() {
                let _ = writeln!(out, "  generated {at}");
            }
            for (i, article) in articles.iter().enumerate() {
                out.push_str(&render_card(i + 1, article, signed_in));
            }
        }
    }
    out
}

/// The whole screen, gated on the session: either the auth form or preferences plus digest.
pub fn render_screen(
    session: &SessionController,
    prefs: &PreferenceCollector,
    view: &DigestView,
) -> String {
    let mut out = format!("==== {TITLE} ====\n");
    match session.context() {
        None => out.push_str(&render_auth(session)),
        Some(ctx) => {
            let _ = writeln!(out, "Signed in as user {}  ('logout' to sign out)", ctx.user_id);
            out.push_str(&render_preferences(prefs, view.is_loading()));
            out.push_str(&render_digest(view, true));
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news_digest_core::{testing::MemorySessionStore, Digest, UserId};
    use std::sync::Arc;

    fn article(url: Option<&str>) -> Article {
        Article {
            title: "Rust 2.0 announced".into(),
            summary: "A new edition is coming.".into(),
            source: "lwn".into(),
            published_date: "2024-05-01 09:30:00".into(),
            url: url.map(str::to_string),
            image_url: None,
        }
    }

    #[test]
    fn card_shows_rating_only_when_signed_in() {
        let signed_in = render_card(1, &article(Some("https://lwn.test")), true);
        assert!(signed_in.contains("like 1 | dislike 1"));
        assert!(signed_in.contains("open 1"));
        assert!(signed_in.contains("2024-05-01"));
        assert!(!signed_in.contains("09:30"));

        let anonymous = render_card(1, &article(None), false);
        assert!(!anonymous.contains("like 1"));
        assert!(!anonymous.contains("open 1"));
        assert!(anonymous.contains("read 1"));
    }

    #[test]
    fn digest_phases_render_distinctly() {
        let mut view = DigestView::new();
        assert_eq!(render_digest(&view, true), "");

        let ticket = view.begin_fetch();
        assert!(render_digest(&view, true).contains("fetching"));
        assert!(!render_digest(&view, true).contains("[1]"));

        view.complete_fetch(
            ticket,
            Ok(Digest {
                articles: vec![article(None), article(None)],
                timestamp: Some("2024-05-01T10:00:00".into()),
            }),
        );
        let populated = render_digest(&view, true);
        assert!(populated.contains("[1] Rust 2.0 announced"));
        assert!(populated.contains("[2] Rust 2.0 announced"));
        assert!(populated.contains("generated 2024-05-01T10:00:00"));
    }

    #[test]
    fn submit_button_reflects_predicate() {
        let mut prefs = PreferenceCollector::new();
        assert!(render_preferences(&prefs, false).contains("select at least one topic"));
        prefs.toggle_topic("health").unwrap();
        assert!(render_preferences(&prefs, false).contains("[x] Health"));
        assert!(render_preferences(&prefs, false).contains("type 'digest'"));
        assert!(render_preferences(&prefs, true).contains("Loading"));
    }

    #[test]
    fn screen_is_gated_by_session() {
        let prefs = PreferenceCollector::new();
        let view = DigestView::new();

        let anonymous = SessionController::restore(Arc::new(MemorySessionStore::new()));
        let screen = render_screen(&anonymous, &prefs, &view);
        assert!(screen.contains("== Login =="));
        assert!(!screen.contains("Preferences"));

        let signed_in =
            SessionController::restore(Arc::new(MemorySessionStore::with_user(UserId::new("u1"))));
        let screen = render_screen(&signed_in, &prefs, &view);
        assert!(screen.contains("Signed in as user u1"));
        assert!(!screen.contains("== Login =="));
    }

    #[test]
    fn password_is_masked() {
        let mut session = SessionController::restore(Arc::new(MemorySessionStore::new()));
        session.set_username("ada");
        session.set_password("hunter2");
        let out = render_auth(&session);
        assert!(out.contains("username: ada"));
        assert!(out.contains("password: *******"));
        assert!(!out.contains("hunter2"));
    }
}
