//! Common error types for tunepress

use thiserror::Error;

/// Common result type for tunepress operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while rendering a tunebook
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tune carries no `X:` index line; the output filename cannot be formed
    #[error("tune has no X: index line")]
    MissingIndex,

    /// The `X:` line's value is not an integer
    #[error("tune index is not a number: {0:?}")]
    InvalidIndex(String),

    /// abc2midi diagnostics, fatal only under the strict policy
    #[error("abc2midi reported: {0}")]
    Notation(String),

    /// fluidsynth exited non-zero
    #[error("fluidsynth failed ({status}): {stderr}")]
    Synthesis { status: String, stderr: String },

    /// WAV read error (wraps hound::Error)
    #[error("WAV read error: {0}")]
    Wav(#[from] hound::Error),

    /// LAME rejected the stream or the encode call failed
    #[error("MP3 encode error: {0}")]
    Encode(String),

    /// Internal error (task join failures and the like)
    #[error("Internal error: {0}")]
    Internal(String),
}
