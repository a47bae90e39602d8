//! Single-slot classification worker. Jobs are processed strictly in
//! submission order, one at a time, with a mandatory delay after each
//! completion that touched the external service. Pending ids are
//! deduplicated per session generation, so overlapping scans cannot queue
//! the same item twice and a job enqueued before a reset cannot shadow the
//! re-observed item afterwards.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;

use crate::category::CategoryId;
use crate::classify::ai_adapter::{classify_remote, InferenceProvider};
use crate::classify::{keywords, ClassifierPath};
use crate::sentiment::{Sentiment, SentimentAnalyzer};

/// Buffered jobs beyond the one in flight. When the channel is full the
/// engine classifies inline via keywords instead of blocking a scan.
const QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct ClassifyJob {
    pub content_id: String,
    /// Session generation at submission time; stale outcomes are discarded.
    pub generation: u64,
    pub text: Option<String>,
    pub image_ref: Option<String>,
    /// Snapshot of `settings.ai_enabled()` at submission.
    pub ai_allowed: bool,
}

#[derive(Debug, Clone)]
pub struct ClassifyOutcome {
    pub content_id: String,
    pub generation: u64,
    pub category: CategoryId,
    pub confidence: f32,
    pub sentiment: Sentiment,
    pub path: ClassifierPath,
}

#[derive(Clone)]
pub struct ClassifyQueue {
    tx: mpsc::Sender<ClassifyJob>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl ClassifyQueue {
    /// Spawn the worker. Outcomes are pushed to `outcomes`; the receiving
    /// side owns applying them against the live session.
    pub fn spawn(
        provider: Arc<dyn InferenceProvider>,
        inter_request_delay: Duration,
        outcomes: mpsc::UnboundedSender<ClassifyOutcome>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<ClassifyJob>(QUEUE_DEPTH);
        let pending: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

        let worker_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            let analyzer = SentimentAnalyzer::new();
            while let Some(job) = rx.recv().await {
                let outcome = run_chain(provider.as_ref(), &analyzer, &job).await;
                let throttled = outcome.path == ClassifierPath::Remote || job.ai_allowed;

                worker_pending
                    .lock()
                    .expect("pending set mutex poisoned")
                    .remove(&pending_key(&job));

                if outcomes.send(outcome).is_err() {
                    break; // engine gone, stop the worker
                }

                // Keep a fixed gap between consecutive completions that hit
                // (or could have hit) the external service.
                if throttled {
                    tokio::time::sleep(inter_request_delay).await;
                }
            }
        });

        Self { tx, pending }
    }

    /// Enqueue unless the same (generation, id) is already pending or the
    /// queue is saturated. Returns false when the caller should fall back to
    /// inline keyword classification.
    pub fn try_submit(&self, job: ClassifyJob) -> bool {
        let key = pending_key(&job);
        {
            let mut guard = self.pending.lock().expect("pending set mutex poisoned");
            if !guard.insert(key.clone()) {
                return true; // already queued; nothing more to do
            }
        }
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                self.pending
                    .lock()
                    .expect("pending set mutex poisoned")
                    .remove(&key);
                tracing::warn!(error = %e, "classification queue saturated");
                false
            }
        }
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("pending set mutex poisoned").len()
    }
}

fn pending_key(job: &ClassifyJob) -> String {
    format!("{}:{}", job.generation, job.content_id)
}

/// AI path when allowed, keyword floor otherwise. Never fails.
async fn run_chain(
    provider: &dyn InferenceProvider,
    analyzer: &SentimentAnalyzer,
    job: &ClassifyJob,
) -> ClassifyOutcome {
    let sentiment = analyzer.tag(job.text.as_deref());

    if job.ai_allowed {
        if let Some(ai) =
            classify_remote(provider, job.text.as_deref(), job.image_ref.as_deref()).await
        {
            counter!("classify_remote_total").increment(1);
            return ClassifyOutcome {
                content_id: job.content_id.clone(),
                generation: job.generation,
                category: ai.category,
                confidence: ai.confidence,
                sentiment,
                path: ClassifierPath::Remote,
            };
        }
    }

    let category = keywords::classify_text(job.text.as_deref());
    counter!("classify_keyword_total").increment(1);
    ClassifyOutcome {
        content_id: job.content_id.clone(),
        generation: job.generation,
        category,
        confidence: keyword_confidence(category),
        sentiment,
        path: ClassifierPath::Keywords,
    }
}

/// The keyword path is deterministic, so a real match gets full confidence
/// and the catch-all gets none.
fn keyword_confidence(category: CategoryId) -> f32 {
    if category == CategoryId::Other {
        0.0
    } else {
        1.0
    }
}
