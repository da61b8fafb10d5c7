use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use crate::error::ResolveError;

/// Length of a YouTube Music content identifier.
pub const CONTENT_ID_LEN: usize = 11;

/// Container used when the resolver does not report one.
pub const DEFAULT_CONTAINER: &str = "m4a";

fn content_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid content id regex"))
}

/// Opaque 11-character identifier of a playable item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Boundary-level shape check. The core assumes every ID it receives went through here.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        if raw.chars().count() != CONTENT_ID_LEN {
            return Err(ResolveError::InvalidId(format!(
                "expected {} characters, got {}",
                CONTENT_ID_LEN,
                raw.chars().count()
            )));
        }

        if !content_id_regex().is_match(raw) {
            return Err(ResolveError::InvalidId(format!(
                "unexpected characters in '{}'",
                raw
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One encoding of a media item as reported by the resolver.
///
/// Transient: owned by a single resolution call, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition {
    pub has_audio: bool,
    pub has_video: bool,
    /// Container extension (m4a, webm, mp4...)
    pub ext: Option<String>,
    /// Audio bitrate in kbps, when known
    pub abr: Option<f64>,
    pub url: String,
}

impl Rendition {
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// Bitrate used for ranking; unknown counts as zero.
    pub fn bitrate(&self) -> f64 {
        self.abr.filter(|abr| abr.is_finite()).unwrap_or(0.0)
    }
}

/// Rendition picked by the format selector, reduced to what callers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFormat {
    pub url: String,
    pub container_format: String,
    pub audio_quality: Option<String>,
}

/// A resolved, directly fetchable audio stream.
///
/// Never mutated once built; the cache hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    pub content_id: String,
    pub url: String,
    pub container_format: String,
    pub audio_quality: Option<String>,
    /// Validity advertised to the caller, mirrors the upstream expiry policy.
    pub ttl_seconds: u64,
}

impl StreamDescriptor {
    pub fn new(content_id: &ContentId, format: SelectedFormat, ttl_seconds: u64) -> Self {
        Self {
            content_id: content_id.to_string(),
            url: format.url,
            container_format: format.container_format,
            audio_quality: format.audio_quality,
            ttl_seconds,
        }
    }
}
