//! Streamed transcript renderer for the Black Stories game server.
//!
//! A submission posts the game form, reads the newline-delimited response
//! as it arrives, classifies every line and renders it into an
//! [`OutputSink`]. The `save_conversation` sentinel becomes a one-shot
//! [`SaveControl`] instead of a rendered line.

pub mod classify;
pub mod cli;
pub mod config;
pub mod control;
pub mod decoder;
pub mod endpoint;
pub mod error;
pub mod form;
pub mod lines;
pub mod render;
pub mod session;

pub use classify::{Category, Classified, Policy, PolicyKind, PrefixRules, RenderedMessage, SAVE_SENTINEL};
pub use control::{SaveControl, SubmitControl};
pub use endpoint::{ChunkStream, GameEndpoint, HttpEndpoint};
pub use error::{RecordError, StreamError};
pub use form::FormSubmission;
pub use lines::{LineBuffer, LineReader};
pub use render::{JsonOutput, OutputFormat, OutputSink, TerminalOutput};
pub use session::{StreamRenderer, SubmissionReport};
