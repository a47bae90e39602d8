//! AI adapter: provider abstraction over the two-stage external path
//! (image → caption, then zero-shot topic classification). Every failure
//! mode — missing token, timeout, non-2xx, parse error, sub-threshold
//! confidence — collapses to `None` ("no AI result") and the chain falls
//! through to the keyword classifier.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::category::{self, CategoryId};

/// Minimum confidence at which the top zero-shot label is accepted.
pub const CONFIDENCE_THRESHOLD: f32 = 0.3;

const CAPTION_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/Salesforce/blip-image-captioning-base";
const ZERO_SHOT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli";

/// Accepted remote classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiClassification {
    pub category: CategoryId,
    pub confidence: f32,
}

/// Raw zero-shot response: labels and scores ordered by descending
/// confidence.
#[derive(Debug, Clone, Deserialize)]
pub struct ZeroShotResult {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

/// Low-level provider doing the actual remote calls. Separated from the
/// chain so tests can swap in deterministic variants.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Descriptive caption for an image reference, or `None`.
    async fn caption(&self, image_ref: &str) -> Option<String>;
    /// Zero-shot classification of `text` against `labels`, or `None`.
    async fn zero_shot(&self, text: &str, labels: &[&'static str]) -> Option<ZeroShotResult>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Hosted-inference provider. Requires a bearer token; both calls ask the
/// server to block until the backing model is warm.
pub struct HostedInferenceProvider {
    http: reqwest::Client,
    token: String,
}

impl HostedInferenceProvider {
    pub fn new(token: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("mindscroll/0.1 (+github.com/mindscroll/mindscroll)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");
        Self { http, token }
    }
}

#[async_trait]
impl InferenceProvider for HostedInferenceProvider {
    async fn caption(&self, image_ref: &str) -> Option<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
        }
        #[derive(Deserialize)]
        struct Generated {
            generated_text: String,
        }

        let resp = self
            .http
            .post(CAPTION_ENDPOINT)
            .bearer_auth(&self.token)
            .header("x-wait-for-model", "true")
            .json(&Req { inputs: image_ref })
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "caption request rejected");
            return None;
        }
        let body: Vec<Generated> = resp.json().await.ok()?;
        let text = body.into_iter().next()?.generated_text;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    async fn zero_shot(&self, text: &str, labels: &[&'static str]) -> Option<ZeroShotResult> {
        #[derive(Serialize)]
        struct Params<'a> {
            candidate_labels: &'a [&'static str],
            multi_label: bool,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
            parameters: Params<'a>,
        }

        let resp = self
            .http
            .post(ZERO_SHOT_ENDPOINT)
            .bearer_auth(&self.token)
            .header("x-wait-for-model", "true")
            .json(&Req {
                inputs: text,
                parameters: Params {
                    candidate_labels: labels,
                    multi_label: false,
                },
            })
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "zero-shot request rejected");
            return None;
        }
        resp.json::<ZeroShotResult>().await.ok()
    }

    fn name(&self) -> &'static str {
        "hosted-inference"
    }
}

/// Returns `None` always; used when the AI path is disabled.
pub struct DisabledProvider;

#[async_trait]
impl InferenceProvider for DisabledProvider {
    async fn caption(&self, _image_ref: &str) -> Option<String> {
        None
    }
    async fn zero_shot(&self, _text: &str, _labels: &[&'static str]) -> Option<ZeroShotResult> {
        None
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests and local runs.
#[derive(Clone, Default)]
pub struct MockProvider {
    pub caption: Option<String>,
    pub result: Option<ZeroShotResult>,
}

#[async_trait]
impl InferenceProvider for MockProvider {
    async fn caption(&self, _image_ref: &str) -> Option<String> {
        self.caption.clone()
    }
    async fn zero_shot(&self, _text: &str, _labels: &[&'static str]) -> Option<ZeroShotResult> {
        self.result.clone()
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Run the two-stage AI path over the item's signal. `None` means "no AI
/// result" and is never an error for the caller.
pub async fn classify_remote(
    provider: &dyn InferenceProvider,
    text: Option<&str>,
    image_ref: Option<&str>,
) -> Option<AiClassification> {
    let caption = match image_ref {
        Some(image) => provider.caption(image).await,
        None => None,
    };

    let combined = match (&caption, text) {
        (Some(c), Some(t)) => format!("{c}. {t}"),
        (Some(c), None) => c.clone(),
        (None, Some(t)) => t.to_string(),
        (None, None) => return None,
    };

    let labels = category::candidate_labels();
    let result = provider.zero_shot(&combined, &labels).await?;

    let (label, score) = result
        .labels
        .first()
        .zip(result.scores.first())
        .map(|(l, s)| (l.as_str(), *s))?;
    if score <= CONFIDENCE_THRESHOLD {
        tracing::debug!(label, score, "zero-shot confidence below threshold");
        return None;
    }

    Some(AiClassification {
        category: category::from_label(label),
        confidence: score,
    })
}
