//! Deterministic keyword fallback: lower-cased substring membership against
//! the category table, first match in declared order wins, catch-all when
//! nothing matches. This is the floor the classifier chain can always reach,
//! whatever the network does.

use crate::category::{self, CategoryId};

/// Classify the available text signal. Missing text lands in the catch-all.
pub fn classify_text(text: Option<&str>) -> CategoryId {
    let Some(text) = text else {
        return CategoryId::Other;
    };
    let lowered = text.to_lowercase();
    for spec in category::all() {
        if spec.id == CategoryId::Other {
            continue;
        }
        if spec.keywords.iter().any(|kw| lowered.contains(kw)) {
            return spec.id;
        }
    }
    CategoryId::Other
}
