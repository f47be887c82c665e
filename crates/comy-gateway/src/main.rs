//! Comy server binary.
//!
//! - Config path: first CLI argument, or `comy.yaml`
//! - WebSocket endpoint: /v1/ws
//! - Liveness: /healthz

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use comy_core::error::{ComyError, Result};
use comy_gateway::{app_state, commands, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "comy server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "comy.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| ComyError::BadRequest(format!("server.listen must be a valid SocketAddr: {e}")))?;

    let state = app_state::AppState::new(cfg, commands::builtin()?)?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "comy server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ComyError::Internal(format!("failed to bind: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ComyError::Internal(format!("server failed: {e}")))
}
