//! Shared utility functions.
//!
//! - `binary`: locating external tools on PATH
//! - `sanitize`: bounding and scrubbing messages that leave the pipeline

mod binary;
mod sanitize;

pub use binary::check_binary;
pub use sanitize::{sanitize_file_name, sanitize_message, MAX_MESSAGE_CHARS};
