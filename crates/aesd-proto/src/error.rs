//! Error types for message framing.

use thiserror::Error;

/// Errors surfaced while assembling a newline-terminated message.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying socket read/write failed.
    #[error("socket error while framing a message: {0}")]
    Io(#[from] std::io::Error),
}
