//! Timestamp producer (C5): every ten seconds, writes a
//! `timestamp:<RFC 2822>\n` entry through the shared backing store, exactly
//! as an ordinary client command would. Only runs against the local-file
//! store; the character device has no equivalent in the original driver and
//! the expanded spec keeps it that way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;

use crate::backing_store::BackingStore;

const INTERVAL: Duration = Duration::from_secs(10);

/// Runs until `shutdown` is notified or `should_close` is observed set at a
/// tick boundary.
pub async fn run(store: Arc<Mutex<BackingStore>>, should_close: Arc<AtomicBool>, shutdown: Arc<Notify>) {
    let mut interval = tokio::time::interval(INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if should_close.load(Ordering::Acquire) {
                    break;
                }
                let line = format!("timestamp:{}\n", chrono::Local::now().to_rfc2822());
                let mut guard = store.lock().await;
                let result = async {
                    guard.open_append_read().await?;
                    guard.append(line.as_bytes()).await
                }.await;
                if let Err(err) = result {
                    log::warn!("timestamp write failed: {err}");
                }
            }
            _ = shutdown.notified() => break,
        }
    }
}
