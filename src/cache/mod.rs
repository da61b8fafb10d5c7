//! # Cache Module
//!
//! In-process cache of resolved audio streams.
//!
//! Resolving a stream means running the upstream resolver, which takes seconds
//! and is rate-limit sensitive. This module keeps each resolved
//! [`StreamDescriptor`](crate::models::StreamDescriptor) for a retention window
//! and collapses concurrent resolutions of the same content ID into one call.
//!
//! ## Features
//!
//! - **Freshness**: an entry is served only while its age is strictly below the
//!   retention window. Expired and absent entries are the same miss.
//! - **Single-flight**: at most one resolution per content ID is in flight; callers
//!   arriving meanwhile wait for it and receive the identical outcome. The
//!   resolution runs on its own task, so a caller that goes away does not
//!   cancel it for the others.
//! - **Bounded growth**: every insertion that pushes the entry count over the
//!   configured ceiling sweeps expired entries. Fresh entries are never evicted,
//!   so the count may stay above the ceiling until they age out.
//! - **Failures are never cached**: a failed resolution leaves the cache untouched
//!   and the next caller triggers a new one.
//!
//! ## Configuration
//!
//! ```env
//! STREAM_CACHE_RETENTION_SECS=18000   # 5 hours, below the 6h upstream URL expiry
//! STREAM_CACHE_MAX_ENTRIES=100        # sweep threshold
//! ```
//!
//! ## Sweep policy
//!
//! There is no background cleanup task. The sweep runs inline on the insertion
//! that crosses the ceiling; reads of expired entries also drop them. This keeps
//! the cache free of timers at the cost of expired entries lingering while the
//! cache is below its ceiling.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use yt_music_api::cache::{StreamCache, StreamCacheConfig};
//!
//! let cache = StreamCache::new(StreamCacheConfig::default());
//!
//! let descriptor = cache
//!     .get_or_resolve(&content_id, |id| async move { resolve(id).await })
//!     .await?;
//! ```

mod in_flight;
mod stream_cache;

pub use stream_cache::{CacheStats, StreamCache, StreamCacheConfig};
