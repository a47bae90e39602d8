//! # Classifier Chain
//!
//! Layered classification of a content item's extracted signal: bounded
//! cache, then the rate-limited two-stage AI path, then the deterministic
//! keyword fallback. The chain never fails its caller; the worst case is the
//! catch-all category.
//!
//! The cache lookup happens synchronously at registration time (a hit skips
//! the queue entirely); everything slower runs on the single-slot worker in
//! `queue` and resolves back into the engine asynchronously.

pub mod ai_adapter;
pub mod cache;
pub mod keywords;
pub mod queue;

use serde::Serialize;

/// Which layer of the chain produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierPath {
    Cache,
    Remote,
    Keywords,
}

pub use ai_adapter::{
    AiClassification, DisabledProvider, HostedInferenceProvider, InferenceProvider, MockProvider,
    ZeroShotResult, CONFIDENCE_THRESHOLD,
};
pub use cache::{CachedClassification, ClassificationCache};
pub use queue::{ClassifyJob, ClassifyOutcome, ClassifyQueue};

use std::sync::Arc;

use crate::settings::Settings;

/// Factory mirroring the settings contract: a usable token plus the
/// text-analysis flag selects the hosted provider, `MINDSCROLL_AI_MODE=mock`
/// forces the deterministic mock, anything else is disabled.
pub fn build_provider(settings: &Settings) -> Arc<dyn InferenceProvider> {
    if std::env::var("MINDSCROLL_AI_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockProvider::default());
    }

    match settings.api_token.as_deref() {
        Some(token) if settings.ai_enabled() => {
            Arc::new(HostedInferenceProvider::new(token.to_string()))
        }
        _ => Arc::new(DisabledProvider),
    }
}
