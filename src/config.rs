use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::StreamCacheConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Servidor
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub worker_threads: usize,

    // Caché de streams
    pub stream_cache_retention_secs: u64, // Debe quedar por debajo del TTL upstream
    pub stream_cache_max_entries: usize,
    pub stream_ttl_secs: u64,             // Vida útil anunciada de la URL

    // Extracción
    pub extraction_timeout_secs: u64,
    pub preferred_container: String,
    pub ytdlp_path: String,
    pub ytdlp_cookies: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset.
    fn from_source<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            // Servidor
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            cors_origins: match get("CORS_ORIGINS") {
                Some(raw) => raw
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
                None => defaults.cors_origins,
            },
            worker_threads: parse_or(&get, "WORKER_THREADS", defaults.worker_threads)?,

            // Caché
            stream_cache_retention_secs: parse_or(
                &get,
                "STREAM_CACHE_RETENTION_SECS",
                defaults.stream_cache_retention_secs,
            )?,
            stream_cache_max_entries: parse_or(
                &get,
                "STREAM_CACHE_MAX_ENTRIES",
                defaults.stream_cache_max_entries,
            )?,
            stream_ttl_secs: parse_or(&get, "STREAM_TTL_SECS", defaults.stream_ttl_secs)?,

            // Extracción
            extraction_timeout_secs: parse_or(
                &get,
                "EXTRACTION_TIMEOUT_SECS",
                defaults.extraction_timeout_secs,
            )?,
            preferred_container: get("PREFERRED_CONTAINER")
                .map(|value| value.trim().to_lowercase())
                .unwrap_or(defaults.preferred_container),
            ytdlp_path: get("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),
            ytdlp_cookies: get("YTDLP_COOKIES").map(PathBuf::from),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Cache retention must be > 0 and strictly below the stream TTL, so a
    ///   cached URL is never served after the upstream expired it
    /// - Cache ceiling, extraction timeout and worker threads must be > 0
    /// - Preferred container must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.stream_cache_retention_secs == 0 {
            anyhow::bail!("Stream cache retention must be greater than 0");
        }

        if self.stream_cache_retention_secs >= self.stream_ttl_secs {
            anyhow::bail!(
                "Stream cache retention ({}s) must be lower than the stream TTL ({}s)",
                self.stream_cache_retention_secs,
                self.stream_ttl_secs
            );
        }

        if self.stream_cache_max_entries == 0 {
            anyhow::bail!("Stream cache max entries must be greater than 0");
        }

        if self.extraction_timeout_secs == 0 {
            anyhow::bail!("Extraction timeout must be greater than 0");
        }

        if self.preferred_container.trim().is_empty() {
            anyhow::bail!("Preferred container cannot be empty");
        }

        if self.worker_threads == 0 {
            anyhow::bail!("Worker threads must be greater than 0");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_config(&self) -> StreamCacheConfig {
        StreamCacheConfig {
            retention: Duration::from_secs(self.stream_cache_retention_secs),
            max_entries: self.stream_cache_max_entries,
        }
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn stream_ttl(&self) -> Duration {
        Duration::from_secs(self.stream_ttl_secs)
    }

    /// Returns a summary of the current configuration for logging.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Server: {} ({} workers), CORS: {}\n  \
            Cache: retention {}, {} entries ceiling\n  \
            Streams: TTL {}, preferred {}\n  \
            Extraction: {} (timeout {}, cookies: {})",
            self.bind_address(),
            self.worker_threads,
            self.cors_origins.join(","),
            humantime::format_duration(Duration::from_secs(self.stream_cache_retention_secs)),
            self.stream_cache_max_entries,
            humantime::format_duration(self.stream_ttl()),
            self.preferred_container,
            self.ytdlp_path,
            humantime::format_duration(self.extraction_timeout()),
            self.ytdlp_cookies
                .as_ref()
                .map_or("none".to_string(), |path| path.display().to_string()),
        )
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            worker_threads: num_cpus::get(),

            stream_cache_retention_secs: 5 * 60 * 60, // 5 horas
            stream_cache_max_entries: 100,
            stream_ttl_secs: 6 * 60 * 60, // 6 horas

            extraction_timeout_secs: 30,
            preferred_container: "m4a".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            ytdlp_cookies: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load_from(&[]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.cache_config().retention, Duration::from_secs(18000));
        assert_eq!(config.cache_config().max_entries, 100);
        assert_eq!(config.stream_ttl_secs, 21600);
        assert_eq!(config.extraction_timeout(), Duration::from_secs(30));
        assert_eq!(config.preferred_container, "m4a");
        assert_eq!(config.ytdlp_cookies, None);
    }

    #[test]
    fn test_overrides() {
        let config = load_from(&[
            ("PORT", "9000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("STREAM_CACHE_MAX_ENTRIES", "5"),
            ("PREFERRED_CONTAINER", " WEBM "),
            ("YTDLP_COOKIES", "/secrets/cookies.txt"),
            ("WORKER_THREADS", ""),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.stream_cache_max_entries, 5);
        assert_eq!(config.preferred_container, "webm");
        assert_eq!(config.ytdlp_cookies, Some(PathBuf::from("/secrets/cookies.txt")));
        assert_eq!(config.worker_threads, num_cpus::get());
    }

    #[test]
    fn test_unparsable_value_names_variable() {
        let err = load_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_retention_must_stay_below_ttl() {
        let err = load_from(&[
            ("STREAM_CACHE_RETENTION_SECS", "21600"),
            ("STREAM_TTL_SECS", "21600"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("lower than the stream TTL"));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.stream_cache_max_entries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stream_cache_retention_secs = 0;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_summary_mentions_key_settings() {
        let summary = Config::default().summary();
        assert!(summary.contains("0.0.0.0:8000"));
        assert!(summary.contains("5h"));
        assert!(summary.contains("yt-dlp"));
    }
}
