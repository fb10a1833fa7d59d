use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mediashelf::{cli::Cli, config, logging, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Exits with usage (status 2) when -d is missing
    let cli = Cli::parse_env();

    // Load configuration (embedded defaults -> mediashelf.toml -> env/.env -> flags)
    let (mut app_cfg, mut warnings) = config::load(cli.config.as_deref())?;
    cli.apply(&mut app_cfg);
    config::validate(&app_cfg)?;

    let _log_guards = logging::init(cli.log_filter(), app_cfg.logging.file_dir.as_deref())?;
    warnings.extend(config::warnings(&app_cfg));
    for w in &warnings {
        warn!("{}", w);
    }

    let root = cli.served_root()?;
    let cancel = CancellationToken::new();
    let state = AppState::new(root.clone(), app_cfg.clone(), cancel.clone());
    if state.aggregator.is_some() {
        info!("audio aggregation enabled (ffmpeg: {})", app_cfg.aggregator.ffmpeg_path);
    }
    let app = routes::router(state);

    let host = app_cfg.server.host.as_str();
    let port = app_cfg.server.port;
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("cannot listen on {}:{}", host, port))?;

    info!(
        "Serving {} at http://{} (media page: {})",
        root.display(),
        listener.local_addr()?,
        app_cfg.server.media_route
    );
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(cancel)).await?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
    // Running ffmpeg jobs are killed and their partial output removed
    cancel.cancel();
}
