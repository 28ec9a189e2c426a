//! crates/news_digest_core/src/activity.rs
//!
//! Best-effort, non-blocking delivery of activity events.
//!
//! Callers hand an event over and move on: delivery happens on a spawned task,
//! failures are logged, and nothing ever propagates back to the UI.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{domain::ActivityEvent, ports::NewsApi};

#[derive(Clone)]
pub struct ActivityRecorder {
    api: Arc<dyn NewsApi>,
}

impl ActivityRecorder {
    pub fn new(api: Arc<dyn NewsApi>) -> Self {
        Self { api }
    }

    /// Sends the event in the background. Must be called from within a tokio runtime.
    ///
    /// The returned handle resolves once delivery has been attempted; dropping it is fine.
    pub fn record(&self, event: ActivityEvent) -> JoinHandle<()> {
        let api = self.api.clone();
        tokio::spawn(async move {
            match api.record_activity(&event).await {
                Ok(()) => debug!(
                    title = %event.article_title,
                    liked = ?event.liked,
                    clicked = event.clicked_full_article,
                    "Activity recorded"
                ),
                Err(e) => warn!("Failed to record activity for '{}': {}", event.article_title, e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::UserId, testing::MockNewsApi};

    fn event(liked: Option<bool>) -> ActivityEvent {
        ActivityEvent {
            user_id: UserId::new("u1"),
            article_url: "https://news.test/a".into(),
            article_title: "A".into(),
            liked,
            clicked_full_article: liked.is_none(),
            time_spent: 1.5,
        }
    }

    #[tokio::test]
    async fn repeated_events_are_each_sent() {
        let api = Arc::new(MockNewsApi::new());
        let recorder = ActivityRecorder::new(api.clone());

        let first = recorder.record(event(Some(true)));
        let second = recorder.record(event(Some(true)));
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(api.tracked_activity().len(), 2);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let api = Arc::new(MockNewsApi::new());
        api.fail_activity();
        let recorder = ActivityRecorder::new(api.clone());

        let handle = recorder.record(event(None));
        assert!(handle.await.is_ok());
        assert_eq!(api.tracked_activity(), vec![event(None)]);
    }
}
