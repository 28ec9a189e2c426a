pub mod activity;
pub mod digest;
pub mod domain;
pub mod ports;
pub mod preferences;
pub mod session;
pub mod testing;

pub use activity::ActivityRecorder;
pub use digest::{
    display_date, CardError, ClickThrough, DigestPhase, DigestView, FetchOutcome, FetchTicket,
    Utterance, FETCH_FAILED,
};
pub use domain::{
    is_supported_language, language_name, match_voice, ActivityEvent, Article, AuthReply,
    Credentials, Digest, Preferences, SessionContext, UserId, Voice, DEFAULT_LANGUAGE, LANGUAGES,
    TOPICS,
};
pub use ports::{NewsApi, PortError, PortResult, SessionStore, SpeechSynthesizer};
pub use preferences::{PreferenceCollector, PreferenceError};
pub use session::{AuthMode, AuthRequest, Notice, Screen, SessionController, SessionState};
