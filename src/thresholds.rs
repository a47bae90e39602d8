//! # Threshold Evaluator
//! State machine deciding when accumulated consumption warrants an
//! intervention. The decision rule itself is a pure function over a session
//! snapshot and the settings, kept free of I/O so it can be tested the same
//! way it runs.
//!
//! The weighted-scoring flag selects exactly one rule: simple per-count
//! thresholds OR the weighted-score threshold. It is an exclusive choice,
//! never an additional OR clause — with weighted scoring on, a crossed post
//! count alone must not trigger.

use serde::Serialize;

use crate::session::SessionSnapshot;
use crate::settings::Settings;

/// Lifecycle of the evaluator across one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorState {
    /// Session just reset; nothing observed yet.
    Idle,
    /// Actively accumulating consumption.
    Monitoring,
    /// Threshold crossed; intervention requested.
    Triggered,
    /// User acted on the intervention; waiting for session reset.
    Resolved,
}

/// Which rule fired, for logging and the intervention summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    PostsViewed,
    StoriesViewed,
    ReelsViewed,
    TimeSpent,
    ScrollDepth,
    WeightedScore,
}

/// Pure transition rule for `Monitoring → Triggered`.
pub fn should_trigger(snapshot: &SessionSnapshot, settings: &Settings) -> Option<TriggerReason> {
    let t = &settings.content_thresholds;
    if settings.advanced_features.weighted_scoring {
        if snapshot.weighted_score >= settings.advanced_features.weighted_threshold {
            return Some(TriggerReason::WeightedScore);
        }
        return None;
    }

    if snapshot.posts >= t.posts_viewed {
        Some(TriggerReason::PostsViewed)
    } else if snapshot.stories >= t.stories_viewed {
        Some(TriggerReason::StoriesViewed)
    } else if snapshot.reels >= t.reels_viewed {
        Some(TriggerReason::ReelsViewed)
    } else if snapshot.elapsed_secs >= t.time_spent {
        Some(TriggerReason::TimeSpent)
    } else if snapshot.scroll_depth >= t.scroll_depth {
        Some(TriggerReason::ScrollDepth)
    } else {
        None
    }
}

#[derive(Debug)]
pub struct ThresholdEvaluator {
    state: EvaluatorState,
}

impl ThresholdEvaluator {
    pub fn new() -> Self {
        Self {
            state: EvaluatorState::Idle,
        }
    }

    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    /// First observed activity moves an idle evaluator into `Monitoring`.
    pub fn notice_activity(&mut self) {
        if self.state == EvaluatorState::Idle {
            self.state = EvaluatorState::Monitoring;
        }
    }

    /// Run the transition rule. Returns the reason on the one evaluation
    /// that crosses the threshold; repeated evaluations while `Triggered`
    /// or `Resolved` are no-ops.
    pub fn evaluate(
        &mut self,
        snapshot: &SessionSnapshot,
        settings: &Settings,
    ) -> Option<TriggerReason> {
        if self.state != EvaluatorState::Monitoring {
            return None;
        }
        let reason = should_trigger(snapshot, settings)?;
        self.state = EvaluatorState::Triggered;
        Some(reason)
    }

    /// `Triggered → Resolved`, driven by the intervention outcome.
    pub fn resolve(&mut self) {
        if self.state == EvaluatorState::Triggered {
            self.state = EvaluatorState::Resolved;
        }
    }

    /// Back to `Idle` with the session reset.
    pub fn reset(&mut self) {
        self.state = EvaluatorState::Idle;
    }
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
