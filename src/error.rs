//! Error types for the session player.

use thiserror::Error;

/// Errors surfaced while building or driving a playback session.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A media source string that cannot be used as a URI.
    #[error("invalid media source: {0:?}")]
    InvalidSource(String),

    /// The engine could not open a source.
    #[error("cannot open {uri}: {reason}")]
    SourceUnresolvable { uri: String, reason: String },

    /// No audio output device could be opened.
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),

    /// Track description failed validation.
    #[error("invalid track: {0}")]
    InvalidTrack(String),

    /// Track descriptor is not valid TOML for the expected schema.
    #[error("track descriptor: {0}")]
    Descriptor(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    pub(crate) fn unresolvable(uri: impl ToString, reason: impl ToString) -> Self {
        Self::SourceUnresolvable {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
