//! Face API error types

use super::codec::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceApiError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    /// Failure reported by the engine itself. The engine's text is kept
    /// verbatim because callers see it in the error envelope.
    #[error("{0}")]
    Engine(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Image codec error: {0}")]
    Codec(#[from] CodecError),
}
