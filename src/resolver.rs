use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::cache::StreamCache;
use crate::error::ResolveError;
use crate::models::{ContentId, StreamDescriptor};
use crate::sources::{ExtractionError, Extractor, FormatSelector};

/// Entry point for stream lookups.
///
/// Cache hit → cached descriptor. Miss → one extractor call per content ID
/// (single-flight through [`StreamCache`]), best audio rendition, cached result.
///
/// Cheap to clone; the extraction runs on a clone detached from the caller.
#[derive(Clone)]
pub struct ResolutionService {
    cache: StreamCache,
    extractor: Arc<dyn Extractor>,
    selector: FormatSelector,
    extraction_timeout: Duration,
    stream_ttl: Duration,
}

impl ResolutionService {
    pub fn new(
        cache: StreamCache,
        extractor: Arc<dyn Extractor>,
        selector: FormatSelector,
        extraction_timeout: Duration,
        stream_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            extractor,
            selector,
            extraction_timeout,
            stream_ttl,
        }
    }

    pub fn cache(&self) -> &StreamCache {
        &self.cache
    }

    /// Resolve `content_id` into a directly playable audio stream.
    ///
    /// The ID must already have passed [`ContentId::parse`].
    pub async fn resolve_stream(&self, content_id: &ContentId) -> Result<StreamDescriptor, ResolveError> {
        let worker = self.clone();
        self.cache
            .get_or_resolve(content_id, move |id| async move {
                worker.resolve_uncached(id).await
            })
            .await
    }

    async fn resolve_uncached(&self, content_id: ContentId) -> Result<StreamDescriptor, ResolveError> {
        info!("🎵 Resolviendo stream con {} para: {}", self.extractor.name(), content_id);
        let started = Instant::now();

        let renditions =
            match tokio::time::timeout(self.extraction_timeout, self.extractor.extract(&content_id)).await {
                Ok(Ok(renditions)) => renditions,
                Ok(Err(e)) => {
                    warn!("❌ Extracción falló para {}: {}", content_id, e);
                    return Err(e.into());
                }
                Err(_) => {
                    warn!(
                        "⏰ Timeout de extracción para {} tras {}",
                        content_id,
                        humantime::format_duration(self.extraction_timeout)
                    );
                    return Err(ExtractionError::Timeout(self.extraction_timeout.as_secs()).into());
                }
            };

        if renditions.is_empty() {
            return Err(ExtractionError::Empty.into());
        }

        let format = self.selector.select_best_audio(&renditions)?;

        info!(
            "✅ Stream resuelto para {} ({}, {}) en {:?}",
            content_id,
            format.container_format,
            format.audio_quality.as_deref().unwrap_or("bitrate desconocido"),
            started.elapsed()
        );

        Ok(StreamDescriptor::new(&content_id, format, self.stream_ttl.as_secs()))
    }
}
