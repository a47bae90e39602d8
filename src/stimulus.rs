//! # Stimulus Handling
//! The engine is driven by three external stimuli: a debounced scroll/wheel
//! signal, a feed-mutation signal with a longer settle delay, and a periodic
//! fallback poll. Scroll deltas and item registrations are applied
//! immediately (they must never be lost); what the coalescers gate is the
//! follow-up threshold evaluation, so a burst of events costs one scan
//! instead of dozens.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::engine::EngineHandle;

/// Quiet period after the last wheel event before re-evaluating.
pub const SCROLL_QUIET: Duration = Duration::from_millis(250);
/// Settle delay after the last feed mutation before re-evaluating.
pub const MUTATION_SETTLE: Duration = Duration::from_secs(1);
/// Fallback poll, catching anything the event paths missed.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Trailing-edge coalescer: fires once after `quiet` has elapsed with no
/// further signals. Signals arriving mid-wait restart the wait.
#[derive(Clone)]
pub struct Coalescer {
    tx: mpsc::Sender<()>,
}

impl Coalescer {
    pub fn spawn(quiet: Duration, handle: EngineHandle) -> Self {
        let (tx, mut rx) = mpsc::channel::<()>(16);
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                loop {
                    match timeout(quiet, rx.recv()).await {
                        Ok(Some(())) => continue, // burst continues, wait again
                        Ok(None) => return,       // all senders dropped
                        Err(_) => break,          // quiet period elapsed
                    }
                }
                handle.check_reminder();
            }
        });
        Self { tx }
    }

    /// Non-blocking; a full buffer just means a fire is already due.
    pub fn signal(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Periodic re-evaluation independent of event traffic.
pub fn spawn_poll(handle: EngineHandle, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            handle.check_reminder();
        }
    })
}
