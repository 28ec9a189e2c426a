pub mod http_api;
pub mod session_file;
pub mod tts;

pub use http_api::HttpNewsApi;
pub use session_file::FileSessionStore;
pub use tts::OpenAiSpeechAdapter;
