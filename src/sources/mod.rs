//! # Sources Module
//!
//! Upstream media resolution for the stream endpoint.
//!
//! A source takes a content ID and answers with every rendition the upstream
//! offers for it (codec flags, container, bitrate, direct URL). It performs a
//! single blocking, network-bound call and never retries on its own; retries and
//! timeouts are the caller's business.
//!
//! ## Components
//!
//! - [`Extractor`]: the contract every resolver backend implements
//! - [`ytdlp::YtDlpExtractor`]: backend driving the `yt-dlp` executable
//! - [`format_selector::FormatSelector`]: picks the best audio rendition from
//!   an extractor answer
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use yt_music_api::sources::{Extractor, FormatSelector, YtDlpExtractor};
//!
//! let extractor = YtDlpExtractor::new(config.ytdlp_path.clone(), config.extraction_timeout);
//! let renditions = extractor.extract(&content_id).await?;
//! let best = FormatSelector::default().select_best_audio(&renditions)?;
//! ```

pub mod format_selector;
pub mod ytdlp;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ResolveError;
use crate::models::{ContentId, Rendition};

pub use format_selector::FormatSelector;
pub use ytdlp::YtDlpExtractor;

/// Errors raised by a resolver backend.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("resolver timed out after {0}s")]
    Timeout(u64),

    #[error("resolver exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("unreadable resolver output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("resolver returned no formats")]
    Empty,

    #[error("invalid resolver url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<ExtractionError> for ResolveError {
    fn from(err: ExtractionError) -> Self {
        ResolveError::ExtractionFailed(err.to_string())
    }
}

/// Contract of a resolver backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Backend name, for logging
    fn name(&self) -> &'static str;

    /// List every rendition available for `content_id`.
    async fn extract(&self, content_id: &ContentId) -> Result<Vec<Rendition>, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_maps_to_extraction_failed() {
        let err: ResolveError = ExtractionError::Timeout(30).into();
        assert_eq!(
            err,
            ResolveError::ExtractionFailed("resolver timed out after 30s".to_string())
        );

        let err: ResolveError = ExtractionError::ToolFailed {
            status: "exit status: 1".to_string(),
            stderr: "ERROR: Video unavailable".to_string(),
        }
        .into();
        assert_eq!(err.code(), "STREAM_FAILED");
    }
}
