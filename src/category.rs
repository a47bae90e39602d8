//! # Category Table
//!
//! Static mapping from topical categories to keyword triggers, risk weights
//! and display emoji. Categories are fixed at compile time; the declared
//! order below is also the first-match order of the keyword fallback, so
//! reordering entries changes classifier behavior.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Topical category of a feed item. `Other` is the catch-all and carries no
/// keyword triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    Fashion,
    Fitness,
    Beauty,
    Travel,
    Food,
    Luxury,
    Comparison,
    Entertainment,
    Other,
}

/// Declared evaluation order for the keyword fallback (catch-all last).
pub const DECLARED_ORDER: [CategoryId; 9] = [
    CategoryId::Fashion,
    CategoryId::Fitness,
    CategoryId::Beauty,
    CategoryId::Travel,
    CategoryId::Food,
    CategoryId::Luxury,
    CategoryId::Comparison,
    CategoryId::Entertainment,
    CategoryId::Other,
];

/// One configured category: display name, emoji label, risk multiplier and
/// the lowercase keyword triggers tested as substrings.
#[derive(Debug, Clone)]
pub struct CategorySpec {
    pub id: CategoryId,
    pub name: &'static str,
    pub emoji: &'static str,
    pub risk_weight: f64,
    pub keywords: &'static [&'static str],
}

static TABLE: Lazy<Vec<CategorySpec>> = Lazy::new(|| {
    vec![
        CategorySpec {
            id: CategoryId::Fashion,
            name: "fashion",
            emoji: "👗",
            risk_weight: 1.5,
            keywords: &[
                "outfit", "dress", "style", "fashion", "ootd", "wardrobe", "clothes",
                "clothing", "heels", "streetwear",
            ],
        },
        CategorySpec {
            id: CategoryId::Fitness,
            name: "fitness",
            emoji: "💪",
            risk_weight: 1.3,
            keywords: &[
                "gym", "workout", "fitness", "muscle", "abs", "training", "cardio",
                "yoga", "protein", "gains",
            ],
        },
        CategorySpec {
            id: CategoryId::Beauty,
            name: "beauty",
            emoji: "💄",
            risk_weight: 1.5,
            keywords: &[
                "makeup", "skincare", "beauty", "glow", "lipstick", "contour",
                "skin routine", "lashes",
            ],
        },
        CategorySpec {
            id: CategoryId::Travel,
            name: "travel",
            emoji: "✈️",
            risk_weight: 1.2,
            keywords: &[
                "travel", "vacation", "beach", "wanderlust", "passport", "hotel",
                "island", "itinerary", "getaway",
            ],
        },
        CategorySpec {
            id: CategoryId::Food,
            name: "food",
            emoji: "🍜",
            risk_weight: 1.0,
            keywords: &[
                "food", "recipe", "brunch", "dessert", "foodie", "restaurant",
                "delicious", "baking", "tasty",
            ],
        },
        CategorySpec {
            id: CategoryId::Luxury,
            name: "luxury",
            emoji: "💎",
            risk_weight: 1.8,
            keywords: &[
                "luxury", "designer", "mansion", "yacht", "rolex", "supercar",
                "penthouse", "first class", "champagne",
            ],
        },
        CategorySpec {
            id: CategoryId::Comparison,
            name: "comparison",
            emoji: "🪞",
            risk_weight: 2.0,
            keywords: &[
                "goals", "blessed", "flawless", "dream life", "perfect life",
                "body goals", "couple goals", "living my best",
            ],
        },
        CategorySpec {
            id: CategoryId::Entertainment,
            name: "entertainment",
            emoji: "🎬",
            risk_weight: 0.8,
            keywords: &[
                "funny", "meme", "lol", "prank", "celebrity", "movie", "trailer",
                "music video", "standup",
            ],
        },
        CategorySpec {
            id: CategoryId::Other,
            name: "other",
            emoji: "📌",
            risk_weight: 1.0,
            keywords: &[],
        },
    ]
});

/// Full category table in declared order.
pub fn all() -> &'static [CategorySpec] {
    &TABLE
}

/// Lookup a spec by id. The table always contains every variant.
pub fn spec(id: CategoryId) -> &'static CategorySpec {
    TABLE
        .iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| &TABLE[TABLE.len() - 1])
}

/// Candidate labels handed to the zero-shot classifier (catch-all excluded;
/// a sub-threshold result falls through to the keyword path instead).
pub fn candidate_labels() -> Vec<&'static str> {
    TABLE
        .iter()
        .filter(|c| c.id != CategoryId::Other)
        .map(|c| c.name)
        .collect()
}

/// Map a zero-shot label back to a category id; unknown labels land in the
/// catch-all.
pub fn from_label(label: &str) -> CategoryId {
    let l = label.trim().to_ascii_lowercase();
    TABLE
        .iter()
        .find(|c| c.name == l)
        .map(|c| c.id)
        .unwrap_or(CategoryId::Other)
}

impl CategoryId {
    pub fn name(self) -> &'static str {
        spec(self).name
    }

    pub fn emoji(self) -> &'static str {
        spec(self).emoji
    }

    pub fn risk_weight(self) -> f64 {
        spec(self).risk_weight
    }
}
