//! ModLRN · Engineering Assessment Backend
//!
//! - Axum HTTP + WebSocket API for timed multiple-choice assessment runs
//! - Optional OpenAI-compatible question generation, explanations and tutor chat
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3001)
//!   OPENAI_API_KEY      : enables OpenAI integration if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL   : default "gpt-4o-mini"
//!   OPENAI_STRONG_MODEL : default "gpt-4o"
//!   APP_CONFIG_PATH     : path to TOML config (prompts, timing, limits, question bank)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod assessment;
mod catalog;
mod config;
mod domain;
mod error;
mod logic;
mod openai;
mod protocol;
mod results;
mod routes;
mod seeds;
mod state;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

const DEFAULT_PORT: u16 = 3001;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (run registry, question bank, OpenAI client, prompts).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3001.
  let port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(DEFAULT_PORT);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "modlrn_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(state))
    .await?;
  info!(target: "modlrn_backend", "Server stopped");
  Ok(())
}

/// Resolves on Ctrl-C after tearing down every live run.
async fn shutdown_signal(state: Arc<AppState>) {
  wait_for_signal(tokio::signal::ctrl_c()).await;
  info!(target: "modlrn_backend", "Shutdown requested");
  state.close_all().await;
}

/// A handler that failed to register never fires, so keep serving.
async fn wait_for_signal(signal: impl std::future::Future<Output = std::io::Result<()>>) {
  if let Err(e) = signal.await {
    error!(target: "modlrn_backend", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test(start_paused = true)]
  async fn failed_signal_registration_does_not_shut_down() {
    let failed = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal driver")) };
    let waited = tokio::time::timeout(Duration::from_secs(3600), wait_for_signal(failed)).await;
    assert!(waited.is_err());
  }

  #[tokio::test]
  async fn delivered_signal_resolves() {
    wait_for_signal(async { Ok(()) }).await;
  }
}
