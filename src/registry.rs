//! # Content Registry
//!
//! Deduplicates feed items by a stable id and records them in the session's
//! per-type visit sets. Id derivation degrades gracefully: canonical link
//! token → media-reference fingerprint → text-snippet hash → generated
//! fallback. Registration never fails; a degraded extractor only costs id
//! quality, not forward progress.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::content::{ContentType, RawItem};
use crate::session::Session;

/// Longest text prefix that participates in the snippet hash. Captions are
/// frequently re-truncated by the host page, so hashing more than this makes
/// ids unstable.
const TEXT_SNIPPET_LEN: usize = 64;

/// Result of a registration attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub is_new: bool,
    pub content_id: String,
    pub content_type: ContentType,
}

#[derive(Debug, Default)]
pub struct ContentRegistry {
    /// Monotonic tail for generated fallback ids.
    fallback_seq: AtomicU64,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw item against the session. Inserts the id into the
    /// session's per-type set when it has not been seen before.
    pub fn register_if_new(&self, session: &mut Session, raw: &RawItem) -> Registration {
        let content_type = classify_type(raw);
        let content_id = self.stable_id(raw);
        let is_new = session.record_view(&content_id, content_type);
        Registration {
            is_new,
            content_id,
            content_type,
        }
    }

    /// Stable id in priority order; the last resort is a generated id so a
    /// fully degraded item still counts once.
    pub fn stable_id(&self, raw: &RawItem) -> String {
        if let Some(token) = raw.link_token.as_deref().filter(|t| !t.trim().is_empty()) {
            return format!("link:{}", token.trim());
        }
        if let Some(media) = raw.media_ref.as_deref().filter(|m| !m.trim().is_empty()) {
            return format!("media:{}", fingerprint(media.trim()));
        }
        if let Some(text) = raw.text.as_deref().filter(|t| !t.trim().is_empty()) {
            let snippet: String = text.trim().chars().take(TEXT_SNIPPET_LEN).collect();
            return format!("text:{}", fingerprint(&snippet));
        }
        let seq = self.fallback_seq.fetch_add(1, Ordering::Relaxed);
        format!("anon:{}-{}", now_millis(), seq)
    }
}

/// Structural-hint type classification; story markers win over reel markers,
/// anything unmarked is a post.
pub fn classify_type(raw: &RawItem) -> ContentType {
    if raw.is_story {
        ContentType::Story
    } else if raw.is_reel {
        ContentType::Reel
    } else {
        ContentType::Post
    }
}

/// Truncated sha256 hex; 16 bytes is plenty for within-session uniqueness.
fn fingerprint(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
