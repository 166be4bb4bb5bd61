//! rosterline — roster intelligence for nightly staffing.
//!
//! Sits between a sheet-backed remote store and the browser UI: loads the
//! personnel directory, today's shift set, and the interview log,
//! reconciles them by display name, classifies and alerts, and serves the
//! merged view models over HTTP. The browser renders; this crate decides
//! what it renders.

pub mod alerts;
pub mod classify;
pub mod config;
pub mod error;
pub mod ingest;
pub mod interviews;
pub mod poller;
pub mod roster;
pub mod server;
pub mod shift_time;
pub mod state;
pub mod store;
pub mod types;
pub mod util;

use std::sync::Arc;
use std::time::Duration;

use poller::Poller;
use server::AppContext;
use state::AppState;

/// Boot the application: config, shared state, initial load, background
/// poller, then the HTTP surface (which runs until the process exits).
pub async fn run() -> Result<(), String> {
    let config = config::load_config()?;
    let listen_port = config.listen_port;
    let poll_interval = Duration::from_secs(config.poll_interval_minutes.max(1) * 60);
    let poll_on_start = config.poll_on_start;

    let state = Arc::new(AppState::new(config).map_err(|e| e.to_string())?);

    log::info!("Initial load from the remote store");
    state.load_all().await;

    let poller = Arc::new(Poller::new());
    if poll_on_start {
        poller.start(state.clone(), poll_interval);
    }

    server::serve(AppContext { state, poller }, listen_port).await
}
