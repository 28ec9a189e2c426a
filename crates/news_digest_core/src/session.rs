//! crates/news_digest_core/src/session.rs
//!
//! The session controller: login/registration forms, the anonymous ↔
//! authenticated state machine, and persistence of the user id.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    domain::{AuthReply, Credentials, SessionContext, UserId},
    ports::{NewsApi, PortResult, SessionStore},
};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(UserId),
}

/// Which auth form is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Which of the two top-level views is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Digest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// A submission captured from the form, waiting for the backend's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub mode: AuthMode,
    pub credentials: Credentials,
}

pub struct SessionController {
    state: SessionState,
    mode: AuthMode,
    username: String,
    password: String,
    notice: Option<Notice>,
    pending: bool,
    store: Arc<dyn SessionStore>,
}

impl SessionController {
    /// Starts authenticated if the store remembers a user, anonymous otherwise.
    pub fn restore(store: Arc<dyn SessionStore>) -> Self {
        let state = match store.get() {
            Ok(Some(user_id)) => {
                info!("Restored session for user {}", user_id);
                SessionState::Authenticated(user_id)
            }
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                warn!("Could not read stored session: {}", e);
                SessionState::Anonymous
            }
        };

        Self {
            state,
            mode: AuthMode::Login,
            username: String::new(),
            password: String::new(),
            notice: None,
            pending: false,
            store,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn screen(&self) -> Screen {
        match self.state {
            SessionState::Anonymous => Screen::Auth,
            SessionState::Authenticated(_) => Screen::Digest,
        }
    }

    pub fn context(&self) -> Option<SessionContext> {
        match &self.state {
            SessionState::Anonymous => None,
            SessionState::Authenticated(user_id) => Some(SessionContext {
                user_id: user_id.clone(),
            }),
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.notice = None;
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    /// Captures the form for sending. Fails with a notice when the form is
    /// incomplete, already submitted, or the user is already signed in.
    pub fn begin_submit(&mut self) -> Result<AuthRequest, Notice> {
        let refusal = if self.pending {
            Some("A request is already in progress")
        } else if matches!(self.state, SessionState::Authenticated(_)) {
            Some("Already logged in")
        } else if self.username.trim().is_empty() || self.password.is_empty() {
            Some("Username and password are required")
        } else {
            None
        };
        if let Some(message) = refusal {
            let notice = Notice::Error(message.to_string());
            self.notice = Some(notice.clone());
            return Err(notice);
        }

        self.pending = true;
        self.notice = None;
        Ok(AuthRequest {
            mode: self.mode,
            credentials: Credentials {
                username: self.username.trim().to_string(),
                password: self.password.clone(),
            },
        })
    }

    /// Applies the backend's answer to a submission.
    pub fn finish_submit(&mut self, request: &AuthRequest, result: PortResult<AuthReply>) {
        self.pending = false;
        let fallback = match request.mode {
            AuthMode::Login => LOGIN_FAILED,
            AuthMode::Register => REGISTRATION_FAILED,
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{} for '{}': {}", fallback, request.credentials.username, e);
                self.notice = Some(Notice::Error(fallback.to_string()));
                return;
            }
        };

        if let Some(error) = reply.error {
            self.notice = Some(Notice::Error(error));
            return;
        }

        match request.mode {
            AuthMode::Login => match reply.user_id {
                Some(user_id) => self.sign_in(user_id),
                None => self.notice = Some(Notice::Error(fallback.to_string())),
            },
            AuthMode::Register => match reply.message {
                Some(message) => {
                    info!("Registered '{}'", request.credentials.username);
                    self.mode = AuthMode::Login;
                    self.notice = Some(Notice::Success(message));
                }
                None => self.notice = Some(Notice::Error(fallback.to_string())),
            },
        }
    }

    /// Sends the form and applies the answer in one step.
    pub async fn submit(&mut self, api: &dyn NewsApi) -> Result<(), Notice> {
        let request = self.begin_submit()?;
        let result = match request.mode {
            AuthMode::Login => api.login(&request.credentials).await,
            AuthMode::Register => api.register(&request.credentials).await,
        };
        self.finish_submit(&request, result);
        match &self.notice {
            Some(Notice::Error(message)) => Err(Notice::Error(message.clone())),
            _ => Ok(()),
        }
    }

    fn sign_in(&mut self, user_id: UserId) {
        info!("Logged in as user {}", user_id);
        if let Err(e) = self.store.set(&user_id) {
            warn!("Could not persist session: {}", e);
        }
        self.state = SessionState::Authenticated(user_id);
        self.notice = None;
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated(user_id) = &self.state {
            info!("Logging out user {}", user_id);
        }
        if let Err(e) = self.store.clear() {
            warn!("Could not clear stored session: {}", e);
        }
        self.state = SessionState::Anonymous;
        self.username.clear();
        self.password.clear();
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ports::PortError,
        testing::{MemorySessionStore, MockNewsApi},
    };

    fn controller() -> (SessionController, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (SessionController::restore(store.clone()), store)
    }

    fn fill(ctl: &mut SessionController) {
        ctl.set_username("ada");
        ctl.set_password("hunter2");
    }

    #[tokio::test]
    async fn login_success_authenticates_and_persists() {
        let (mut ctl, store) = controller();
        let api = MockNewsApi::new();
        api.enqueue_login(Ok(AuthReply {
            user_id: Some(UserId::new("u1")),
            ..Default::default()
        }));

        fill(&mut ctl);
        assert_eq!(ctl.screen(), Screen::Auth);
        ctl.submit(&api).await.unwrap();

        assert_eq!(ctl.state(), &SessionState::Authenticated(UserId::new("u1")));
        assert_eq!(ctl.screen(), Screen::Digest);
        assert_eq!(store.get().unwrap(), Some(UserId::new("u1")));
        assert_eq!(
            api.tracked_logins(),
            vec![Credentials {
                username: "ada".into(),
                password: "hunter2".into()
            }]
        );
    }

    #[tokio::test]
    async fn logout_clears_state_store_and_fields() {
        let (mut ctl, store) = controller();
        let api = MockNewsApi::new();
        api.enqueue_login(Ok(AuthReply {
            user_id: Some(UserId::new("u1")),
            ..Default::default()
        }));
        fill(&mut ctl);
        ctl.submit(&api).await.unwrap();

        ctl.logout();

        assert_eq!(ctl.state(), &SessionState::Anonymous);
        assert!(ctl.context().is_none());
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(ctl.username(), "");
        assert_eq!(ctl.password(), "");
    }

    #[tokio::test]
    async fn registration_switches_to_login_with_success_notice() {
        let (mut ctl, _store) = controller();
        let api = MockNewsApi::new();
        api.enqueue_register(Ok(AuthReply {
            message: Some("User created".into()),
            ..Default::default()
        }));

        ctl.toggle_mode();
        assert_eq!(ctl.mode(), AuthMode::Register);
        fill(&mut ctl);
        ctl.submit(&api).await.unwrap();

        assert_eq!(ctl.state(), &SessionState::Anonymous);
        assert_eq!(ctl.mode(), AuthMode::Login);
        assert_eq!(ctl.notice(), Some(&Notice::Success("User created".into())));
    }

    #[tokio::test]
    async fn registration_without_message_is_a_failure() {
        let (mut ctl, _store) = controller();
        let api = MockNewsApi::new();
        api.enqueue_register(Ok(AuthReply::default()));

        ctl.toggle_mode();
        fill(&mut ctl);
        let err = ctl.submit(&api).await.unwrap_err();

        assert_eq!(err, Notice::Error(REGISTRATION_FAILED.into()));
        assert_eq!(ctl.mode(), AuthMode::Register);
        assert_eq!(ctl.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn server_error_text_is_surfaced() {
        let (mut ctl, store) = controller();
        let api = MockNewsApi::new();
        api.enqueue_login(Ok(AuthReply {
            error: Some("Invalid credentials".into()),
            ..Default::default()
        }));

        fill(&mut ctl);
        let err = ctl.submit(&api).await.unwrap_err();

        assert_eq!(err, Notice::Error("Invalid credentials".into()));
        assert_eq!(ctl.state(), &SessionState::Anonymous);
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn transport_failure_uses_fallback() {
        let (mut ctl, _store) = controller();
        let api = MockNewsApi::new();
        api.enqueue_register(Err(PortError::Transport("refused".into())));

        ctl.toggle_mode();
        fill(&mut ctl);
        let err = ctl.submit(&api).await.unwrap_err();

        assert_eq!(err, Notice::Error(REGISTRATION_FAILED.into()));
        assert_eq!(ctl.mode(), AuthMode::Register);
        assert!(!ctl.is_pending());
    }

    #[tokio::test]
    async fn login_reply_without_user_id_is_a_failure() {
        let (mut ctl, _store) = controller();
        let api = MockNewsApi::new();
        api.enqueue_login(Ok(AuthReply::default()));

        fill(&mut ctl);
        assert_eq!(ctl.submit(&api).await, Err(Notice::Error(LOGIN_FAILED.into())));
    }

    #[test]
    fn empty_form_is_not_sent() {
        let (mut ctl, _store) = controller();
        ctl.set_username("  ");
        assert!(ctl.begin_submit().is_err());
        assert!(!ctl.is_pending());
    }

    #[test]
    fn second_submit_while_pending_is_refused() {
        let (mut ctl, _store) = controller();
        fill(&mut ctl);
        let request = ctl.begin_submit().unwrap();
        assert!(ctl.begin_submit().is_err());

        ctl.finish_submit(&request, Ok(AuthReply {
            user_id: Some(UserId::new("7")),
            ..Default::default()
        }));
        assert_eq!(ctl.screen(), Screen::Digest);
    }

    #[test]
    fn restore_reads_the_store() {
        let store = Arc::new(MemorySessionStore::with_user(UserId::new("u9")));
        let ctl = SessionController::restore(store);
        assert_eq!(ctl.screen(), Screen::Digest);
        assert_eq!(ctl.context().unwrap().user_id.as_str(), "u9");
    }

    #[test]
    fn toggling_mode_clears_notice() {
        let (mut ctl, _store) = controller();
        let _ = ctl.begin_submit();
        assert!(ctl.notice().is_some());
        ctl.toggle_mode();
        assert!(ctl.notice().is_none());
    }
}
