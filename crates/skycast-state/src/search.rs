//! Debounced search input.
//!
//! Keystrokes go in on a channel; a term is dispatched to the store only once
//! the input has been quiet for the debounce period and the term differs from
//! the last one dispatched. Dispatched searches run as independent tasks and
//! are not cancelled by newer ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::store::WeatherStore;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Spawn the driver. It exits when every sender of `input` is dropped,
/// dispatching any term still waiting out its debounce first.
pub fn spawn_search_driver(
    store: Arc<WeatherStore>,
    mut input: mpsc::Receiver<String>,
    debounce: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_dispatched: Option<String> = None;
        let mut pending: Option<String> = None;

        loop {
            let received = if pending.is_some() {
                tokio::time::timeout(debounce, input.recv()).await
            } else {
                Ok(input.recv().await)
            };

            match received {
                Ok(Some(term)) => pending = Some(term),
                Ok(None) => {
                    if let Some(term) = pending.take() {
                        dispatch(&store, &mut last_dispatched, term);
                    }
                    break;
                }
                // Quiet period elapsed
                Err(_) => {
                    if let Some(term) = pending.take() {
                        dispatch(&store, &mut last_dispatched, term);
                    }
                }
            }
        }

        tracing::debug!("Search driver stopped");
    })
}

fn dispatch(store: &Arc<WeatherStore>, last_dispatched: &mut Option<String>, term: String) {
    if last_dispatched.as_deref() == Some(term.as_str()) {
        tracing::debug!("Skipping repeated search '{}'", term);
        return;
    }
    *last_dispatched = Some(term.clone());

    let store = store.clone();
    tokio::spawn(async move {
        store.search_cities(&term).await;
    });
}
