use thiserror::Error;

/// Outcome taxonomy of a stream resolution.
///
/// Cloneable so that one resolution result can be handed unchanged to every
/// caller waiting on the same content ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Malformed content identifier, rejected before reaching the cache.
    #[error("invalid content id: {0}")]
    InvalidId(String),

    /// The resolver answered, but no rendition carries audio.
    #[error("no audio format found")]
    NoAudioFormat,

    /// The resolver call failed, timed out or returned nothing usable.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

impl ResolveError {
    /// Stable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "VALIDATION_ERROR",
            Self::NoAudioFormat => "NO_AUDIO_FORMAT",
            Self::ExtractionFailed(_) => "STREAM_FAILED",
        }
    }
}
