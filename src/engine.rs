//! # Engine
//! Orchestrator for the whole pipeline: visibility events → registry →
//! classifier chain → scoring → threshold evaluation → intervention. All
//! session mutation happens behind one mutex with no awaits inside, so a
//! scan is atomic relative to every other stimulus; the classifier worker
//! and the pause countdown run outside and resolve back in through
//! generation-checked entry points.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::category::{self, CategoryId};
use crate::classify::{
    self, CachedClassification, ClassificationCache, ClassifyJob, ClassifyOutcome, ClassifyQueue,
    InferenceProvider,
};
use crate::classify::{cache::DEFAULT_CAPACITY, keywords};
use crate::content::{ContentItem, RawItem};
use crate::intervention::{
    build_summary, InterventionChoice, InterventionController, InterventionSummary,
};
use crate::registry::{ContentRegistry, Registration};
use crate::scoring;
use crate::sentiment::SentimentAnalyzer;
use crate::session::{Session, SessionSnapshot};
use crate::settings::Settings;
use crate::thresholds::{EvaluatorState, ThresholdEvaluator};

/// Action-tagged messages pushed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EngineMessage {
    UpdateCounts { categories: Vec<CategoryCount> },
    ShowIntervention { summary: InterventionSummary },
    CloseTab,
}

/// One row of the category/count snapshot shown by the floating counter.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub name: &'static str,
    pub emoji: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Domain this engine instance is attached to, checked against the
    /// per-site rules before surfacing an intervention.
    pub domain: String,
    pub countdown: crate::intervention::CountdownConfig,
    /// Mandatory gap between consecutive AI-path completions.
    pub classify_delay: Duration,
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain: "instagram.com".to_string(),
            countdown: Default::default(),
            classify_delay: Duration::from_secs(1),
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

pub struct Engine {
    settings: Settings,
    domain: String,
    registry: ContentRegistry,
    session: Session,
    cache: ClassificationCache,
    evaluator: ThresholdEvaluator,
    controller: InterventionController,
    analyzer: SentimentAnalyzer,
    messages: broadcast::Sender<EngineMessage>,
    queue: Option<ClassifyQueue>,
}

impl Engine {
    fn new(
        settings: Settings,
        config: &EngineConfig,
        messages: broadcast::Sender<EngineMessage>,
    ) -> Self {
        Self {
            settings,
            domain: config.domain.clone(),
            registry: ContentRegistry::new(),
            session: Session::new(),
            cache: ClassificationCache::new(config.cache_capacity),
            evaluator: ThresholdEvaluator::new(),
            controller: InterventionController::new(config.countdown),
            analyzer: SentimentAnalyzer::new(),
            messages,
            queue: None,
        }
    }

    fn attach_queue(&mut self, queue: ClassifyQueue) {
        self.queue = Some(queue);
    }

    /// One visibility scan over a batch of raw items. Returns how many were
    /// new. Registration, cache fast path and queue submission all happen
    /// under the caller's lock; nothing here awaits.
    pub fn observe_batch(&mut self, items: &[RawItem]) -> usize {
        let mut fresh = 0;
        for raw in items {
            let reg = self.observe_one(raw);
            if reg.is_new {
                fresh += 1;
            }
        }
        if fresh > 0 {
            self.emit_counts();
        }
        self.evaluate_and_maybe_intervene();
        fresh
    }

    fn observe_one(&mut self, raw: &RawItem) -> Registration {
        let reg = self.registry.register_if_new(&mut self.session, raw);
        self.evaluator.notice_activity();
        if !reg.is_new {
            return reg;
        }

        self.session.track_item(ContentItem::new(
            reg.content_id.clone(),
            reg.content_type,
            raw,
        ));

        if let Some(hit) = self.cache.get(&reg.content_id) {
            counter!("classify_cache_hits_total").increment(1);
            let sentiment = self.analyzer.tag(raw.text.as_deref());
            self.record_classification(&reg.content_id, hit.category, sentiment);
            return reg;
        }

        let job = ClassifyJob {
            content_id: reg.content_id.clone(),
            generation: self.session.generation(),
            text: raw.text.clone(),
            image_ref: raw.media_ref.clone(),
            ai_allowed: self.settings.ai_enabled(),
        };
        let submitted = self.queue.as_ref().is_some_and(|q| q.try_submit(job));
        if !submitted {
            // Queue saturated (or not wired): degrade to the inline keyword
            // path so the item is never left unclassified.
            let category = keywords::classify_text(raw.text.as_deref());
            let sentiment = self.analyzer.tag(raw.text.as_deref());
            let confidence = if category == CategoryId::Other { 0.0 } else { 1.0 };
            self.cache
                .insert(&reg.content_id, CachedClassification { category, confidence });
            self.record_classification(&reg.content_id, category, sentiment);
        }
        reg
    }

    /// Downward scroll delta from the debounced wheel signal.
    pub fn record_scroll(&mut self, delta: f64) -> f64 {
        self.evaluator.notice_activity();
        self.session.add_scroll(delta);
        self.session.scroll_depth()
    }

    /// Classification resolved on the worker. The cache learns the result
    /// unconditionally (content identity outlives sessions); the session is
    /// only touched when the generation still matches.
    pub fn apply_outcome(&mut self, outcome: ClassifyOutcome) {
        self.cache.insert(
            &outcome.content_id,
            CachedClassification {
                category: outcome.category,
                confidence: outcome.confidence,
            },
        );

        if outcome.generation != self.session.generation() {
            tracing::debug!(id = %outcome.content_id, "stale classification discarded");
            return;
        }

        self.record_classification(&outcome.content_id, outcome.category, outcome.sentiment);
        self.emit_counts();
        self.evaluate_and_maybe_intervene();
    }

    fn record_classification(
        &mut self,
        content_id: &str,
        category: CategoryId,
        sentiment: crate::sentiment::Sentiment,
    ) {
        let Some(item) = self.session.item(content_id) else {
            return;
        };
        let score = scoring::score_item(item.content_type, category, sentiment);
        if self
            .session
            .apply_classification(content_id, category, score, sentiment)
        {
            self.session.add_score(score);
        }
    }

    /// Run the threshold rule; surface the intervention once per session,
    /// and only on an enabled domain. Evaluation itself always runs.
    pub fn evaluate_and_maybe_intervene(&mut self) -> EvaluatorState {
        let snapshot = self.session.snapshot();
        if let Some(reason) = self.evaluator.evaluate(&snapshot, &self.settings) {
            tracing::info!(?reason, score = snapshot.weighted_score, "threshold crossed");
            if self.settings.site_enabled(&self.domain) && !self.session.reminder_triggered() {
                self.session.mark_reminder_triggered();
                counter!("interventions_total").increment(1);
                let summary =
                    build_summary(&snapshot, self.settings.advanced_features.weighted_scoring);
                self.emit(EngineMessage::ShowIntervention { summary });
            } else {
                tracing::debug!(domain = %self.domain, "trigger suppressed for disabled domain");
            }
        }
        self.evaluator.state()
    }

    /// Pause countdown expired with the session generation unchanged:
    /// everything returns to its initial state.
    pub fn complete_pause(&mut self, generation: u64) {
        if generation != self.session.generation() {
            tracing::debug!("countdown outlived its session; ignoring");
            return;
        }
        self.full_reset();
    }

    fn full_reset(&mut self) {
        self.session.reset();
        self.evaluator.reset();
        self.controller.cancel();
        self.emit_counts();
        tracing::info!("session reset");
    }

    fn begin_pause(&mut self, me: Arc<Mutex<Engine>>) {
        if self.evaluator.state() != EvaluatorState::Triggered {
            tracing::debug!("pause chosen outside an active intervention; ignoring");
            return;
        }
        self.evaluator.resolve();
        let generation = self.session.generation();
        self.controller.start_countdown(me, generation);
    }

    fn begin_leave(&mut self) {
        if self.evaluator.state() != EvaluatorState::Triggered {
            tracing::debug!("leave chosen outside an active intervention; ignoring");
            return;
        }
        self.evaluator.resolve();
        self.controller.cancel();
        // No reset: the page is expected to be abandoned.
        self.emit(EngineMessage::CloseTab);
    }

    pub fn counts(&self) -> Vec<CategoryCount> {
        let counts = self.session.category_counts();
        category::all()
            .iter()
            .map(|spec| CategoryCount {
                name: spec.name,
                emoji: spec.emoji,
                count: counts.get(&spec.id).copied().unwrap_or(0),
            })
            .collect()
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn state(&self) -> EvaluatorState {
        self.evaluator.state()
    }

    pub fn countdown_active(&self) -> bool {
        self.controller.countdown_active()
    }

    /// Swap in freshly loaded settings (external change notification).
    /// Thresholds, flags and site rules apply immediately; the inference
    /// provider is fixed at startup, so a token change needs a restart.
    pub fn replace_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    fn emit_counts(&self) {
        self.emit(EngineMessage::UpdateCounts {
            categories: self.counts(),
        });
    }

    fn emit(&self, message: EngineMessage) {
        // No subscribers is fine; the engine keeps running headless.
        let _ = self.messages.send(message);
    }
}

/// Cloneable handle wiring the engine to its background tasks: the
/// classification worker and the outcome applier.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<Engine>>,
    messages: broadcast::Sender<EngineMessage>,
}

impl EngineHandle {
    /// Build with the provider selected from settings.
    pub fn new(settings: Settings, config: EngineConfig) -> Self {
        let provider = classify::build_provider(&settings);
        Self::with_provider(settings, config, provider)
    }

    /// Build with an explicit provider (tests inject mocks here).
    pub fn with_provider(
        settings: Settings,
        config: EngineConfig,
        provider: Arc<dyn InferenceProvider>,
    ) -> Self {
        let (msg_tx, _) = broadcast::channel(64);
        let engine = Engine::new(settings, &config, msg_tx.clone());
        let inner = Arc::new(Mutex::new(engine));

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClassifyOutcome>();
        let queue = ClassifyQueue::spawn(provider, config.classify_delay, out_tx);
        inner
            .lock()
            .expect("engine mutex poisoned")
            .attach_queue(queue);

        // Applier: funnels worker outcomes back under the engine lock. Holds
        // only a weak ref so dropping the last handle tears everything down.
        let weak = Arc::downgrade(&inner);
        tokio::spawn(async move {
            while let Some(outcome) = out_rx.recv().await {
                let Some(engine) = weak.upgrade() else { break };
                engine
                    .lock()
                    .expect("engine mutex poisoned")
                    .apply_outcome(outcome);
            }
        });

        Self {
            inner,
            messages: msg_tx,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Engine> {
        self.inner.lock().expect("engine mutex poisoned")
    }

    /// One visibility scan; returns the number of newly registered items.
    pub fn observe(&self, items: &[RawItem]) -> usize {
        self.lock().observe_batch(items)
    }

    /// Accumulate a scroll delta; returns the current depth.
    pub fn scroll(&self, delta: f64) -> f64 {
        self.lock().record_scroll(delta)
    }

    /// External request to re-evaluate immediately (`checkReminder`).
    pub fn check_reminder(&self) -> EvaluatorState {
        self.lock().evaluate_and_maybe_intervene()
    }

    pub fn counts(&self) -> Vec<CategoryCount> {
        self.lock().counts()
    }

    pub fn session_metrics(&self) -> SessionSnapshot {
        self.lock().session_snapshot()
    }

    pub fn state(&self) -> EvaluatorState {
        self.lock().state()
    }

    pub fn countdown_active(&self) -> bool {
        self.lock().countdown_active()
    }

    pub fn choose(&self, choice: InterventionChoice) {
        match choice {
            InterventionChoice::Pause => {
                let arc = Arc::clone(&self.inner);
                self.lock().begin_pause(arc);
            }
            InterventionChoice::Leave => self.lock().begin_leave(),
        }
    }

    pub fn reload_settings(&self, settings: Settings) {
        self.lock().replace_settings(settings);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineMessage> {
        self.messages.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifierPath;
    use crate::sentiment::Sentiment;

    fn bare_engine() -> (Engine, mpsc::UnboundedReceiver<ClassifyOutcome>) {
        let (msg_tx, _) = broadcast::channel(16);
        let mut engine = Engine::new(Settings::default(), &EngineConfig::default(), msg_tx);
        // Real worker, but we hold the outcome channel so nothing is applied
        // until the test decides to.
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let queue = ClassifyQueue::spawn(
            std::sync::Arc::new(crate::classify::DisabledProvider),
            Duration::ZERO,
            out_tx,
        );
        engine.attach_queue(queue);
        (engine, out_rx)
    }

    fn raw(link: &str, text: &str) -> RawItem {
        RawItem {
            link_token: Some(link.to_string()),
            text: Some(text.to_string()),
            ..RawItem::default()
        }
    }

    fn outcome(id: &str, generation: u64) -> ClassifyOutcome {
        ClassifyOutcome {
            content_id: id.to_string(),
            generation,
            category: CategoryId::Fashion,
            confidence: 1.0,
            sentiment: Sentiment::Neutral,
            path: ClassifierPath::Keywords,
        }
    }

    #[tokio::test]
    async fn stale_outcome_is_discarded_but_still_cached() {
        let (mut engine, _out_rx) = bare_engine();
        engine.observe_batch(&[raw("p1", "outfit")]);

        // Session resets before the in-flight classification lands.
        engine.full_reset();
        engine.apply_outcome(outcome("link:p1", 0));

        assert_eq!(engine.session_snapshot().weighted_score, 0.0);
        // The memo survives: re-observing the same item in the new session
        // classifies from cache without another job.
        engine.observe_batch(&[raw("p1", "outfit")]);
        let counts = engine.counts();
        let fashion = counts.iter().find(|c| c.name == "fashion").unwrap();
        assert_eq!(fashion.count, 1);
    }

    #[tokio::test]
    async fn current_generation_outcome_scores_the_session() {
        let (mut engine, _out_rx) = bare_engine();
        engine.observe_batch(&[raw("p1", "outfit")]);
        engine.apply_outcome(outcome("link:p1", 0));

        // post base 1.0 x fashion risk 1.5, neutral sentiment.
        let snap = engine.session_snapshot();
        assert!((snap.weighted_score - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn duplicate_outcome_does_not_double_count() {
        let (mut engine, _out_rx) = bare_engine();
        engine.observe_batch(&[raw("p1", "outfit")]);
        engine.apply_outcome(outcome("link:p1", 0));
        engine.apply_outcome(outcome("link:p1", 0));

        let snap = engine.session_snapshot();
        assert!((snap.weighted_score - 1.5).abs() < 1e-9);
        let counts = engine.counts();
        let fashion = counts.iter().find(|c| c.name == "fashion").unwrap();
        assert_eq!(fashion.count, 1);
    }

    #[tokio::test]
    async fn unwired_queue_degrades_to_inline_keywords() {
        let (msg_tx, _) = broadcast::channel(16);
        let mut engine = Engine::new(Settings::default(), &EngineConfig::default(), msg_tx);
        engine.observe_batch(&[raw("p1", "perfect outfit today, love this dress")]);

        let counts = engine.counts();
        let fashion = counts.iter().find(|c| c.name == "fashion").unwrap();
        assert_eq!(fashion.count, 1);
        // Positive sentiment on a non-comparison category: no multiplier.
        assert!((engine.session_snapshot().weighted_score - 1.5).abs() < 1e-9);
    }
}
