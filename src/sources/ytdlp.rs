use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{ExtractionError, Extractor};
use crate::models::{ContentId, Rendition};

const WATCH_URL: &str = "https://music.youtube.com/watch";

/// Resolver backend driving the `yt-dlp` executable.
///
/// One process per call, killed if the caller stops waiting for it.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    ytdlp_path: String,
    socket_timeout: Duration,
    cookies_path: Option<PathBuf>,
}

/// Información extraída de yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    formats: Option<Vec<YtDlpFormat>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    url: Option<String>,
    ext: Option<String>,
    acodec: Option<String>,
    vcodec: Option<String>,
    abr: Option<f64>,
}

impl YtDlpFormat {
    // A missing acodec still counts as audio; only an explicit "none" rules it out.
    fn into_rendition(self) -> Option<Rendition> {
        let url = self.url.filter(|u| !u.is_empty())?;

        Some(Rendition {
            has_audio: self.acodec.as_deref() != Some("none"),
            has_video: self.vcodec.as_deref().map_or(false, |v| v != "none"),
            ext: self.ext,
            abr: self.abr,
            url,
        })
    }
}

impl YtDlpExtractor {
    pub fn new(ytdlp_path: impl Into<String>, socket_timeout: Duration) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            socket_timeout,
            cookies_path: None,
        }
    }

    pub fn with_cookies(mut self, cookies_path: Option<PathBuf>) -> Self {
        self.cookies_path = cookies_path;
        self
    }

    /// Verifica que yt-dlp esté disponible y devuelve su versión
    pub async fn verify_dependencies(&self) -> Result<String> {
        let output = async_process::Command::new(&self.ytdlp_path)
            .arg("--version")
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                info!("✅ yt-dlp versión: {}", version);
                Ok(version)
            }
            _ => {
                error!("❌ yt-dlp no encontrado en '{}'", self.ytdlp_path);
                anyhow::bail!("yt-dlp no disponible")
            }
        }
    }

    fn watch_url(content_id: &ContentId) -> Result<Url, ExtractionError> {
        Ok(Url::parse_with_params(WATCH_URL, &[("v", content_id.as_str())])?)
    }

    fn build_args(&self, url: &Url) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-check-certificate".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout.as_secs().max(1).to_string(),
            "-f".to_string(),
            "m4a/bestaudio/best".to_string(),
        ];

        if let Some(cookies) = &self.cookies_path {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }

        args.push(url.to_string());
        args
    }

    fn parse_output(stdout: &[u8]) -> Result<Vec<Rendition>, ExtractionError> {
        let info: YtDlpInfo = serde_json::from_slice(stdout)?;

        let renditions: Vec<Rendition> = info
            .formats
            .unwrap_or_default()
            .into_iter()
            .filter_map(YtDlpFormat::into_rendition)
            .collect();

        if renditions.is_empty() {
            return Err(ExtractionError::Empty);
        }

        Ok(renditions)
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract(&self, content_id: &ContentId) -> Result<Vec<Rendition>, ExtractionError> {
        let url = Self::watch_url(content_id)?;
        let args = self.build_args(&url);
        debug!("🔧 {} {}", self.ytdlp_path, args.join(" "));

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractionError::Spawn {
                tool: self.ytdlp_path.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("yt-dlp falló para {}: {}", content_id, stderr);
            return Err(ExtractionError::ToolFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let renditions = Self::parse_output(&output.stdout)?;
        debug!("📋 {} formatos para {}", renditions.len(), content_id);
        Ok(renditions)
    }
}
