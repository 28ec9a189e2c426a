//! In-memory implementations of the ports, for tests and for running the
//! client without a backend.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use crate::{
    domain::{ActivityEvent, AuthReply, Credentials, Digest, Preferences, UserId, Voice},
    match_voice,
    ports::{NewsApi, PortError, PortResult, SessionStore, SpeechSynthesizer},
};

#[derive(Default)]
struct MockNewsApiState {
    register_results: VecDeque<PortResult<AuthReply>>,
    login_results: VecDeque<PortResult<AuthReply>>,
    digest_results: VecDeque<PortResult<Digest>>,
    fail_activity: bool,
    tracked_registers: Vec<Credentials>,
    tracked_logins: Vec<Credentials>,
    tracked_digests: Vec<Preferences>,
    tracked_activity: Vec<ActivityEvent>,
}

/// A mock backend that tracks requests and yields queued results.
///
/// A call with nothing queued fails with `PortError::Unexpected`.
#[derive(Default)]
pub struct MockNewsApi {
    state: Mutex<MockNewsApiState>,
}

impl MockNewsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_register(&self, result: PortResult<AuthReply>) {
        self.lock().register_results.push_back(result);
    }

    pub fn enqueue_login(&self, result: PortResult<AuthReply>) {
        self.lock().login_results.push_back(result);
    }

    pub fn enqueue_digest(&self, result: PortResult<Digest>) {
        self.lock().digest_results.push_back(result);
    }

    /// Makes every subsequent `record_activity` call fail after being tracked.
    pub fn fail_activity(&self) {
        self.lock().fail_activity = true;
    }

    pub fn tracked_registers(&self) -> Vec<Credentials> {
        self.lock().tracked_registers.clone()
    }

    pub fn tracked_logins(&self) -> Vec<Credentials> {
        self.lock().tracked_logins.clone()
    }

    pub fn tracked_digests(&self) -> Vec<Preferences> {
        self.lock().tracked_digests.clone()
    }

    pub fn tracked_activity(&self) -> Vec<ActivityEvent> {
        self.lock().tracked_activity.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockNewsApiState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn exhausted<T>(what: &str) -> PortResult<T> {
    Err(PortError::Unexpected(format!("no mocked {what} result")))
}

#[async_trait]
impl NewsApi for MockNewsApi {
    async fn register(&self, credentials: &Credentials) -> PortResult<AuthReply> {
        let mut state = self.lock();
        state.tracked_registers.push(credentials.clone());
        state
            .register_results
            .pop_front()
            .unwrap_or_else(|| exhausted("register"))
    }

    async fn login(&self, credentials: &Credentials) -> PortResult<AuthReply> {
        let mut state = self.lock();
        state.tracked_logins.push(credentials.clone());
        state
            .login_results
            .pop_front()
            .unwrap_or_else(|| exhausted("login"))
    }

    async fn record_activity(&self, event: &ActivityEvent) -> PortResult<()> {
        let mut state = self.lock();
        state.tracked_activity.push(event.clone());
        if state.fail_activity {
            return Err(PortError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    async fn fetch_digest(&self, preferences: &Preferences) -> PortResult<Digest> {
        let mut state = self.lock();
        state.tracked_digests.push(preferences.clone());
        state
            .digest_results
            .pop_front()
            .unwrap_or_else(|| exhausted("digest"))
    }
}

/// A session store that lives only as long as the process.
#[derive(Default)]
pub struct MemorySessionStore {
    value: Mutex<Option<UserId>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user_id: UserId) -> Self {
        Self {
            value: Mutex::new(Some(user_id)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> PortResult<Option<UserId>> {
        self.value
            .lock()
            .map(|v| v.clone())
            .map_err(|e| PortError::Storage(e.to_string()))
    }

    fn set(&self, user_id: &UserId) -> PortResult<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        *value = Some(user_id.clone());
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        *value = None;
        Ok(())
    }
}

/// A speech engine that records what it was asked to say.
#[derive(Default)]
pub struct MockSpeech {
    voices: Vec<Voice>,
    spoken: Mutex<Vec<(String, Voice)>>,
}

impl MockSpeech {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            spoken: Mutex::default(),
        }
    }

    pub fn spoken(&self) -> Vec<(String, Voice)> {
        self.spoken
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    fn resolve_voice(&self, lang: &str) -> Option<Voice> {
        match_voice(&self.voices, lang).cloned()
    }

    async fn speak(&self, text: &str, voice: &Voice) -> PortResult<()> {
        self.spoken
            .lock()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .push((text.to_string(), voice.clone()));
        Ok(())
    }
}
