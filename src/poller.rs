//! Background refresh poller.
//!
//! One recurring task reloads every cache on a fixed interval. The stop
//! signal is consulted while sleeping and between refreshes, never during
//! one — stopping suppresses future ticks but an in-flight reload always
//! runs to completion. In-flight requests are not cancelled.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::state::AppState;

#[derive(Default)]
pub struct Poller {
    stop: Mutex<Option<watch::Sender<bool>>>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.stop
            .lock()
            .map(|g| g.as_ref().map(|tx| !tx.is_closed()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Start the recurring refresh. Returns false if already running.
    pub fn start(&self, state: Arc<AppState>, interval: Duration) -> bool {
        let Ok(mut guard) = self.stop.lock() else {
            return false;
        };
        if guard.as_ref().map(|tx| !tx.is_closed()).unwrap_or(false) {
            return false;
        }

        let (tx, mut rx) = watch::channel(false);
        *guard = Some(tx);

        tokio::spawn(async move {
            log::info!("Refresh poller started ({}s interval)", interval.as_secs());
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = rx.changed() => {}
                }
                if *rx.borrow() {
                    break;
                }
                state.load_all().await;
                if *rx.borrow() {
                    break;
                }
            }
            log::info!("Refresh poller stopped");
        });
        true
    }

    /// Suppress future ticks. Returns false if nothing was running.
    pub fn stop(&self) -> bool {
        let Ok(guard) = self.stop.lock() else {
            return false;
        };
        match guard.as_ref() {
            Some(tx) if !tx.is_closed() => {
                let _ = tx.send(true);
                true
            }
            _ => false,
        }
    }
}
