//! Core content types shared across the engine: the raw signal handed over
//! by the host-page extractor and the tracked item it becomes.

use serde::{Deserialize, Serialize};

use crate::category::CategoryId;
use crate::sentiment::Sentiment;

/// Kind of feed item, classified from structural hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Story,
    Reel,
}

impl ContentType {
    /// Relative engagement risk of the format (reel > post > story).
    pub fn base_weight(self) -> f64 {
        match self {
            ContentType::Reel => 1.5,
            ContentType::Post => 1.0,
            ContentType::Story => 0.8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Story => "story",
            ContentType::Reel => "reel",
        }
    }
}

/// What the extractor could pull out of the host-page markup for one item.
/// Every field is optional; extraction degradation is normal operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    /// Canonical link token (e.g. the permalink shortcode), when present.
    #[serde(default)]
    pub link_token: Option<String>,
    /// Reference to the item's media (URL or data ref).
    #[serde(default)]
    pub media_ref: Option<String>,
    /// Visible text: caption, alt text, overlay.
    #[serde(default)]
    pub text: Option<String>,
    /// Structural hint: ephemeral-story markers present.
    #[serde(default)]
    pub is_story: bool,
    /// Structural hint: reel-specific markers present.
    #[serde(default)]
    pub is_reel: bool,
}

/// A tracked content item. Identity is immutable; the classifier writes
/// `category`, `classification_score` and `sentiment` exactly once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    pub classification_score: f64,
    pub sentiment: Sentiment,
}

impl ContentItem {
    pub fn new(id: String, content_type: ContentType, raw: &RawItem) -> Self {
        Self {
            id,
            content_type,
            text: raw.text.clone(),
            image_ref: raw.media_ref.clone(),
            category: None,
            classification_score: 0.0,
            sentiment: Sentiment::Neutral,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}
