//! # Session
//! The bounded window of content consumption tracked between resets. Owns the
//! per-type visit sets, the scroll accumulator and the weighted score, plus a
//! generation counter used to discard async results that outlive a reset.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::category::{self, CategoryId};
use crate::content::{ContentItem, ContentType};
use crate::sentiment::Sentiment;

/// Aggregates derived from session state; this is presentation data handed
/// to counters, metrics queries and the intervention summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub started_at: DateTime<Utc>,
    pub posts: usize,
    pub stories: usize,
    pub reels: usize,
    pub elapsed_secs: u64,
    pub scroll_depth: f64,
    pub weighted_score: f64,
    pub reminder_triggered: bool,
    pub negative_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_category: Option<CategoryId>,
}

#[derive(Debug)]
pub struct Session {
    started_at: DateTime<Utc>,
    started_mono: Instant,
    generation: u64,
    viewed: HashMap<ContentType, HashSet<String>>,
    items: HashMap<String, ContentItem>,
    category_counts: HashMap<CategoryId, usize>,
    scroll_depth: f64,
    weighted_score: f64,
    negative_items: usize,
    reminder_triggered: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started_mono: Instant::now(),
            generation: 0,
            viewed: HashMap::new(),
            items: HashMap::new(),
            category_counts: HashMap::new(),
            scroll_depth: 0.0,
            weighted_score: 0.0,
            negative_items: 0,
            reminder_triggered: false,
        }
    }

    /// Token checked before applying results that crossed an async boundary.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Insert the id into the per-type set. Returns true when it was new.
    pub fn record_view(&mut self, content_id: &str, content_type: ContentType) -> bool {
        self.viewed
            .entry(content_type)
            .or_default()
            .insert(content_id.to_string())
    }

    pub fn track_item(&mut self, item: ContentItem) {
        self.items.entry(item.id.clone()).or_insert(item);
    }

    pub fn item(&self, content_id: &str) -> Option<&ContentItem> {
        self.items.get(content_id)
    }

    pub fn count(&self, content_type: ContentType) -> usize {
        self.viewed.get(&content_type).map_or(0, HashSet::len)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.started_mono.elapsed().as_secs()
    }

    /// Monotone accumulator; upward (negative) deltas are ignored.
    pub fn add_scroll(&mut self, delta: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.scroll_depth += delta;
        }
    }

    pub fn scroll_depth(&self) -> f64 {
        self.scroll_depth
    }

    pub fn weighted_score(&self) -> f64 {
        self.weighted_score
    }

    /// Add one item's contribution and return the new total. Contributions
    /// are non-negative by construction, so the total never decreases.
    pub fn add_score(&mut self, contribution: f64) -> f64 {
        if contribution.is_finite() && contribution > 0.0 {
            self.weighted_score += contribution;
        }
        self.weighted_score
    }

    /// Record the classifier's verdict on an already-tracked item. A second
    /// classification of the same id is a no-op (the id was served from cache
    /// or raced a duplicate job).
    pub fn apply_classification(
        &mut self,
        content_id: &str,
        category: CategoryId,
        score: f64,
        sentiment: Sentiment,
    ) -> bool {
        let Some(item) = self.items.get_mut(content_id) else {
            return false;
        };
        if item.is_classified() {
            return false;
        }
        item.category = Some(category);
        item.classification_score = score;
        item.sentiment = sentiment;
        *self.category_counts.entry(category).or_insert(0) += 1;
        if sentiment == Sentiment::Negative {
            self.negative_items += 1;
        }
        true
    }

    pub fn category_counts(&self) -> &HashMap<CategoryId, usize> {
        &self.category_counts
    }

    /// Most-seen classified category, ties broken by declared order. A tied
    /// later category must not displace the current winner, so this keeps the
    /// first maximum rather than using `max_by_key` (which keeps the last).
    pub fn dominant_category(&self) -> Option<CategoryId> {
        let mut best: Option<(CategoryId, usize)> = None;
        for id in category::DECLARED_ORDER {
            if let Some(&n) = self.category_counts.get(&id) {
                if best.map_or(true, |(_, m)| n > m) {
                    best = Some((id, n));
                }
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn reminder_triggered(&self) -> bool {
        self.reminder_triggered
    }

    /// Latch; only `reset` clears it.
    pub fn mark_reminder_triggered(&mut self) {
        self.reminder_triggered = true;
    }

    /// Fresh identity: cleared sets, zeroed accumulators, bumped generation.
    /// Anything still in flight for the old generation must be discarded by
    /// the caller when it resolves.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.started_at = Utc::now();
        self.started_mono = Instant::now();
        self.viewed.clear();
        self.items.clear();
        self.category_counts.clear();
        self.scroll_depth = 0.0;
        self.weighted_score = 0.0;
        self.negative_items = 0;
        self.reminder_triggered = false;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            started_at: self.started_at,
            posts: self.count(ContentType::Post),
            stories: self.count(ContentType::Story),
            reels: self.count(ContentType::Reel),
            elapsed_secs: self.elapsed_secs(),
            scroll_depth: self.scroll_depth,
            weighted_score: self.weighted_score,
            reminder_triggered: self.reminder_triggered,
            negative_items: self.negative_items,
            dominant_category: self.dominant_category(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
