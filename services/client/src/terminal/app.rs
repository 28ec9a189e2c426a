//! services/client/src/terminal/app.rs
//!
//! This is the main control loop of the terminal client. It owns the three
//! view-models, turns commands into state changes, and runs every network call
//! as a spawned task whose result comes back over a channel, so input keeps
//! flowing while a request is in flight.

use std::sync::Arc;

use news_digest_core::{
    ActivityEvent, ActivityRecorder, AuthMode, AuthReply, AuthRequest, CardError, Digest, DigestView,
    FetchOutcome, FetchTicket, NewsApi, PortResult, PreferenceCollector, Screen, SessionController,
    SessionStore, SpeechSynthesizer, Utterance,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    terminal::{
        command::{card, Command, HELP},
        render::{render_digest, render_notice, render_screen},
    },
};

/// Completions delivered back to the loop by spawned tasks.
#[derive(Debug)]
pub enum AppEvent {
    Auth {
        request: AuthRequest,
        result: PortResult<AuthReply>,
    },
    Digest {
        ticket: FetchTicket,
        result: PortResult<Digest>,
    },
    SpeechFinished {
        title: String,
        result: PortResult<()>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Input {
    Line(Option<String>),
    Event(AppEvent),
}

pub struct App {
    api: Arc<dyn NewsApi>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    recorder: ActivityRecorder,
    deliveries: Vec<JoinHandle<()>>,
    session: SessionController,
    prefs: PreferenceCollector,
    digest: DigestView,
    speaking: usize,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(
        api: Arc<dyn NewsApi>,
        store: Arc<dyn SessionStore>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            recorder: ActivityRecorder::new(api.clone()),
            deliveries: Vec::new(),
            api,
            speech,
            session: SessionController::restore(store),
            prefs: PreferenceCollector::new(),
            digest: DigestView::new(),
            speaking: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn preferences(&self) -> &PreferenceCollector {
        &self.prefs
    }

    pub fn digest(&self) -> &DigestView {
        &self.digest
    }

    pub fn screen(&self) -> String {
        render_screen(&self.session, &self.prefs, &self.digest)
    }

    /// True while any request or utterance started by this app is unfinished.
    pub fn has_pending_work(&self) -> bool {
        self.session.is_pending() || self.digest.is_loading() || self.speaking > 0
    }

    /// Reads commands until `quit` or end of input, writing each resulting view to `output`.
    ///
    /// After input ends, outstanding requests are still awaited so piped scripts see their results.
    pub async fn run<R, W>(mut self, input: R, mut output: W) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut input_open = true;
        write_out(&mut output, &self.screen()).await?;

        loop {
            if !input_open && !self.has_pending_work() {
                break;
            }

            let next = tokio::select! {
                line = lines.next_line(), if input_open => Input::Line(line?),
                Some(event) = self.events_rx.recv() => Input::Event(event),
                else => break,
            };

            let mut out = String::new();
            match next {
                Input::Line(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if self.handle_command(command, &mut out) == Flow::Quit {
                            write_out(&mut output, &out).await?;
                            break;
                        }
                    }
                    Err(e) => {
                        out.push_str(&e.to_string());
                        out.push('\n');
                    }
                },
                Input::Line(None) => {
                    debug!("Input closed");
                    input_open = false;
                }
                Input::Event(event) => self.apply_event(event, &mut out),
            }
            write_out(&mut output, &out).await?;
        }

        self.flush_activity().await;
        info!("Terminal client finished.");
        Ok(())
    }

    /// Waits for every activity delivery started so far.
    pub async fn flush_activity(&mut self) {
        let pending = std::mem::take(&mut self.deliveries);
        if !pending.is_empty() {
            debug!("Waiting for {} activity deliveries", pending.len());
        }
        for handle in pending {
            if let Err(e) = handle.await {
                warn!("Activity delivery task failed: {}", e);
            }
        }
    }

    fn record(&mut self, event: ActivityEvent) {
        self.deliveries.retain(|handle| !handle.is_finished());
        self.deliveries.push(self.recorder.record(event));
    }

    /// Waits for the next completion from a spawned task.
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    /// Applies one command. Must be called from within a tokio runtime.
    pub fn handle_command(&mut self, command: Command, out: &mut String) -> Flow {
        match command {
            Command::Help => line(out, HELP),
            Command::Show => out.push_str(&self.screen()),
            Command::Quit => {
                line(out, "Goodbye!");
                return Flow::Quit;
            }
            Command::Logout => {
                if self.session.screen() == Screen::Digest {
                    self.session.logout();
                    out.push_str(&self.screen());
                } else {
                    line(out, "You are not logged in.");
                }
            }

            Command::Mode
            | Command::Username(_)
            | Command::Password(_)
            | Command::Submit
            | Command::Login { .. }
            | Command::Register { .. } => {
                if self.session.screen() != Screen::Auth {
                    line(out, "Already logged in. Type 'logout' first.");
                } else {
                    self.handle_auth(command, out);
                }
            }

            Command::Topic(_)
            | Command::Language(_)
            | Command::Digest
            | Command::Read(_)
            | Command::Like(_)
            | Command::Dislike(_)
            | Command::Open(_) => {
                if self.session.screen() != Screen::Digest {
                    line(out, "Please log in first.");
                } else {
                    self.handle_digest(command, out);
                }
            }
        }
        Flow::Continue
    }

    fn handle_auth(&mut self, command: Command, out: &mut String) {
        match command {
            Command::Mode => {
                self.session.toggle_mode();
                out.push_str(&self.screen());
            }
            Command::Username(name) => self.session.set_username(name),
            Command::Password(password) => self.session.set_password(password),
            Command::Submit => self.submit_auth(out),
            Command::Login { username, password } => {
                self.fill_form(AuthMode::Login, username, password);
                self.submit_auth(out);
            }
            Command::Register { username, password } => {
                self.fill_form(AuthMode::Register, username, password);
                self.submit_auth(out);
            }
            _ => {}
        }
    }

    fn fill_form(&mut self, mode: AuthMode, username: String, password: String) {
        if self.session.mode() != mode {
            self.session.toggle_mode();
        }
        self.session.set_username(username);
        self.session.set_password(password);
    }

    fn submit_auth(&mut self, out: &mut String) {
        let request = match self.session.begin_submit() {
            Ok(request) => request,
            Err(notice) => return line(out, &render_notice(&notice)),
        };

        line(
            out,
            match request.mode {
                AuthMode::Login => "Logging in…",
                AuthMode::Register => "Registering…",
            },
        );

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match request.mode {
                AuthMode::Login => api.login(&request.credentials).await,
                AuthMode::Register => api.register(&request.credentials).await,
            };
            let _ = tx.send(AppEvent::Auth { request, result });
        });
    }

    fn handle_digest(&mut self, command: Command, out: &mut String) {
        let loading = self.digest.is_loading();
        match command {
            Command::Topic(topic) => {
                if loading {
                    return line(out, "Preferences are locked while the digest loads.");
                }
                match self.prefs.toggle_topic(&topic) {
                    Ok(selected) => line(
                        out,
                        &format!("{} {}", if selected { "Selected" } else { "Removed" }, topic),
                    ),
                    Err(e) => line(out, &format!("! {e}")),
                }
            }
            Command::Language(code) => {
                if loading {
                    return line(out, "Preferences are locked while the digest loads.");
                }
                match self.prefs.select_language(&code) {
                    Ok(()) => line(out, &format!("Language set to {}", self.prefs.language())),
                    Err(e) => line(out, &format!("! {e}")),
                }
            }
            Command::Digest => self.request_digest(out),
            Command::Read(n) => self.read_aloud(n, out),
            Command::Like(n) => self.rate(n, true, out),
            Command::Dislike(n) => self.rate(n, false, out),
            Command::Open(n) => {
                let context = self.session.context();
                match self.digest.open_full_article(card(n), context.as_ref()) {
                    Ok(click) => {
                        if let Some(event) = click.event {
                            self.record(event);
                        }
                        line(out, &format!("Open in your browser: {}", click.url));
                    }
                    Err(e) => line(out, &format!("! {e}")),
                }
            }
            _ => {}
        }
    }

    fn request_digest(&mut self, out: &mut String) {
        let Some(preferences) = self.prefs.submit(self.digest.is_loading()) else {
            let reason = if self.digest.is_loading() {
                "A digest is already on its way."
            } else {
                "Select at least one topic first."
            };
            return line(out, reason);
        };

        info!(
            topics = ?preferences.topics,
            language = %preferences.language,
            "Requesting digest"
        );
        let ticket = self.digest.begin_fetch();
        out.push_str(&render_digest(&self.digest, self.session.context().is_some()));

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_digest(&preferences).await;
            let _ = tx.send(AppEvent::Digest { ticket, result });
        });
    }

    fn rate(&mut self, n: usize, liked: bool, out: &mut String) {
        let context = self.session.context();
        let rated = if liked {
            self.digest.like(card(n), context.as_ref())
        } else {
            self.digest.dislike(card(n), context.as_ref())
        };
        match rated {
            Ok(event) => {
                let verb = if liked { "Liked" } else { "Disliked" };
                line(out, &format!("{verb} '{}'", event.article_title));
                self.record(event);
            }
            Err(e) => line(out, &format!("! {e}")),
        }
    }

    fn read_aloud(&mut self, n: usize, out: &mut String) {
        let utterance =
            self.digest
                .read_aloud(card(n), self.prefs.language(), self.speech.as_deref());
        let Utterance { text, voice } = match utterance {
            Ok(utterance) => utterance,
            Err(e @ (CardError::NoVoice(_) | CardError::SpeechUnsupported)) => {
                return line(out, &format!("⚠ {e}"));
            }
            Err(e) => return line(out, &format!("! {e}")),
        };
        // An utterance is only produced when a synthesizer is configured.
        let Some(speech) = self.speech.clone() else {
            return;
        };

        let title = self.digest.articles()[card(n)].title.clone();
        line(out, &format!("Reading '{}' aloud ({})", title, voice.name));
        self.speaking += 1;

        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = speech.speak(&text, &voice).await;
            let _ = tx.send(AppEvent::SpeechFinished { title, result });
        });
    }

    /// Applies a completion from a spawned task.
    pub fn apply_event(&mut self, event: AppEvent, out: &mut String) {
        match event {
            AppEvent::Auth { request, result } => {
                self.session.finish_submit(&request, result);
                out.push_str(&self.screen());
            }
            AppEvent::Digest { ticket, result } => {
                let outcome = self.digest.complete_fetch(ticket, result);
                // A digest landing after logout stays hidden behind the auth screen.
                if outcome != FetchOutcome::Stale && self.session.screen() == Screen::Digest {
                    out.push_str(&render_digest(&self.digest, self.session.context().is_some()));
                }
            }
            AppEvent::SpeechFinished { title, result } => {
                self.speaking = self.speaking.saturating_sub(1);
                if let Err(e) = result {
                    warn!("Speech failed for '{}': {}", title, e);
                    line(out, &format!("! Could not read '{title}' aloud"));
                }
            }
        }
    }
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

async fn write_out<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), ClientError> {
    if text.is_empty() {
        return Ok(());
    }
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
