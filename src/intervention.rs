//! # Intervention Controller
//! Drives the pause/resume/terminate workflow once the evaluator trips:
//! assembles the session summary for the dialog, runs the cancelable pause
//! countdown, and signals the leave path. The countdown is the only
//! cancelable operation in the engine, and only via natural expiry or the
//! leave path aborting it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::engine::Engine;
use crate::session::SessionSnapshot;

/// The two choices offered by the pause dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionChoice {
    Pause,
    Leave,
}

/// Presentation data for the dialog, derived from session aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionSummary {
    pub posts: usize,
    pub stories: usize,
    pub reels: usize,
    pub elapsed_minutes: u64,
    pub negative_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_category: Option<CategoryLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryLabel {
    pub name: &'static str,
    pub emoji: &'static str,
}

/// Build the summary shown in the dialog. Category and score details only
/// appear when weighted analysis is enabled; the simple mode dialog sticks
/// to counts and time.
pub fn build_summary(snapshot: &SessionSnapshot, weighted_enabled: bool) -> InterventionSummary {
    InterventionSummary {
        posts: snapshot.posts,
        stories: snapshot.stories,
        reels: snapshot.reels,
        elapsed_minutes: snapshot.elapsed_secs / 60,
        negative_items: snapshot.negative_items,
        dominant_category: if weighted_enabled {
            snapshot.dominant_category.map(|id| CategoryLabel {
                name: id.name(),
                emoji: id.emoji(),
            })
        } else {
            None
        },
        weighted_score: weighted_enabled.then_some(snapshot.weighted_score),
    }
}

/// Pause countdown shape. Production is 30 ticks of one second; tests
/// shrink the tick.
#[derive(Debug, Clone, Copy)]
pub struct CountdownConfig {
    pub ticks: u32,
    pub tick: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            ticks: 30,
            tick: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default)]
pub struct InterventionController {
    config: CountdownConfig,
    active: Option<JoinHandle<()>>,
}

impl InterventionController {
    pub fn new(config: CountdownConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Start the pause countdown. Natural expiry requests a full session
    /// reset, guarded by the generation captured here so a reset that
    /// happened in the meantime is not clobbered.
    pub fn start_countdown(&mut self, engine: Arc<Mutex<Engine>>, generation: u64) {
        self.cancel();
        let CountdownConfig { ticks, tick } = self.config;
        self.active = Some(tokio::spawn(async move {
            for _ in 0..ticks {
                tokio::time::sleep(tick).await;
            }
            let mut guard = engine.lock().expect("engine mutex poisoned");
            guard.complete_pause(generation);
        }));
    }

    /// Abort the active countdown, if any (leave path, or session teardown).
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
        }
    }

    pub fn countdown_active(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    #[test]
    fn summary_hides_weighted_details_in_simple_mode() {
        let snap = Session::new().snapshot();
        let simple = build_summary(&snap, false);
        assert!(simple.dominant_category.is_none());
        assert!(simple.weighted_score.is_none());

        let weighted = build_summary(&snap, true);
        assert!(weighted.weighted_score.is_some());
    }

    #[test]
    fn elapsed_is_reported_in_minutes() {
        let mut snap = Session::new().snapshot();
        snap.elapsed_secs = 125;
        assert_eq!(build_summary(&snap, false).elapsed_minutes, 2);
    }
}
