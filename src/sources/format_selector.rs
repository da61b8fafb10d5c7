// FormatSelector - picks the best audio rendition out of a resolver answer
//
// Search order:
// 1. audio-only renditions
// 2. any rendition with audio, if there is no audio-only one
// Within that working set the preferred container wins outright, then bitrate.

use crate::error::ResolveError;
use crate::models::{Rendition, SelectedFormat, DEFAULT_CONTAINER};

#[derive(Debug, Clone)]
pub struct FormatSelector {
    preferred_container: String,
}

impl FormatSelector {
    pub fn new(preferred_container: impl Into<String>) -> Self {
        Self {
            preferred_container: preferred_container.into(),
        }
    }

    /// Select the best audio rendition.
    ///
    /// Fails with [`ResolveError::NoAudioFormat`] when nothing carries audio.
    pub fn select_best_audio(&self, renditions: &[Rendition]) -> Result<SelectedFormat, ResolveError> {
        let usable: Vec<&Rendition> = renditions.iter().filter(|r| !r.url.is_empty()).collect();

        let mut working: Vec<&Rendition> = usable
            .iter()
            .copied()
            .filter(|r| r.is_audio_only())
            .collect();

        if working.is_empty() {
            working = usable.iter().copied().filter(|r| r.has_audio).collect();
        }

        let preferred: Vec<&Rendition> = working
            .iter()
            .copied()
            .filter(|r| r.ext.as_deref() == Some(self.preferred_container.as_str()))
            .collect();

        let best = Self::highest_bitrate(&preferred)
            .or_else(|| Self::highest_bitrate(&working))
            .ok_or(ResolveError::NoAudioFormat)?;

        Ok(SelectedFormat {
            url: best.url.clone(),
            container_format: best
                .ext
                .clone()
                .filter(|ext| !ext.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
            audio_quality: Self::quality_label(best.abr),
        })
    }

    /// First rendition with the maximum bitrate, in iteration order.
    fn highest_bitrate<'a>(candidates: &[&'a Rendition]) -> Option<&'a Rendition> {
        let mut best: Option<&'a Rendition> = None;
        for candidate in candidates {
            match best {
                Some(current) if candidate.bitrate() <= current.bitrate() => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    /// "<kbps>kbps" for a known, non-zero bitrate
    fn quality_label(abr: Option<f64>) -> Option<String> {
        abr.filter(|abr| abr.is_finite() && *abr > 0.0)
            .map(|abr| format!("{}kbps", abr.trunc() as u64))
    }
}

impl Default for FormatSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER)
    }
}
