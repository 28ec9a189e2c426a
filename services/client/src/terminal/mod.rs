pub mod app;
pub mod command;
pub mod render;

// Re-export the main loop so the binary can build and run it directly.
pub use app::{App, AppEvent, Flow};
pub use command::Command;
