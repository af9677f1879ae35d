//! Command-line front end of the live table detectors: config loading,
//! frame sources and periodic detection sessions.

pub mod commands;
pub mod config;
pub mod session;
pub mod source;

pub use config::Config;
pub use session::{CancelHandle, SessionSummary, StreamSession};
pub use source::{DirectorySource, FrameSource};
