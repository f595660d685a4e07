//! metrix API server.
//!
//! - REST surface: /api/metrics (GET open, POST/PUT/DELETE bearer-gated)
//! - Ops: /healthz, /readyz, /metrics
//! - Config: METRIX_CONFIG yaml + PORT / STORE_URL / AUTH_TOKEN overrides
//! - Graceful shutdown on Ctrl-C / SIGTERM

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrix_api::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load().inspect_err(|e| tracing::error!(error = %e, "config load failed"))?;
    let listen = cfg.listen_addr()?;

    let state = AppState::from_config(cfg).await?;
    let app = router::build_router(state);

    tracing::info!(%listen, "metrix-api starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
