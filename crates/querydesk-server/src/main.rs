mod config;

use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing::info;

use querydesk_api::auth::{self, AppStateInner, AuthSettings};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "querydesk=debug,querydesk_api=debug,querydesk_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Migrations run inside open()
    let db = querydesk_db::Database::open(&config.db_path)?;
    auth::seed_default_admin(&db, &config.admin_password)?;

    let state = AppStateInner::new(
        db,
        AuthSettings {
            session_secret: config.session_secret,
            session_ttl: chrono::Duration::hours(config.session_ttl_hours),
            student_id: config.student_id,
            student_password: config.student_password,
        },
    )?;

    let app = querydesk_api::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("QueryDesk listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
