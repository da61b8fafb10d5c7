use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

mod api;
mod cache;
mod config;
mod error;
mod models;
mod resolver;
mod sources;

use crate::api::AppState;
use crate::cache::StreamCache;
use crate::config::Config;
use crate::resolver::ResolutionService;
use crate::sources::{FormatSelector, YtDlpExtractor};

fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("yt_music_api=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    // Cargar configuración
    let config = Config::load()?;

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    let extractor = YtDlpExtractor::new(config.ytdlp_path.clone(), config.extraction_timeout())
        .with_cookies(config.ytdlp_cookies.clone());

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&extractor).await;
    }

    info!("🎵 Iniciando YT Music API v{}", env!("CARGO_PKG_VERSION"));
    info!("🔧 {}", config.summary());

    if let Err(e) = extractor.verify_dependencies().await {
        warn!("⚠️ Las resoluciones fallarán hasta que yt-dlp esté disponible: {}", e);
    }

    let cache = StreamCache::new(config.cache_config());
    let resolver = ResolutionService::new(
        cache,
        Arc::new(extractor),
        FormatSelector::new(config.preferred_container.clone()),
        config.extraction_timeout(),
        config.stream_ttl(),
    );

    let app = api::router(
        AppState::new(Arc::new(resolver)),
        api::cors_layer(&config.cors_origins),
    );

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("🚀 Servidor escuchando en http://{}", listener.local_addr()?);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error en el servidor: {:?}", e);
        return Err(e.into());
    }

    info!("👋 Servidor detenido");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("⚠️ Señal de shutdown recibida, cerrando..."),
        Err(e) => {
            error!("❌ Error al registrar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn health_check(extractor: &YtDlpExtractor) -> Result<()> {
    // Verificar dependencias críticas
    extractor.verify_dependencies().await?;
    println!("OK");
    Ok(())
}
