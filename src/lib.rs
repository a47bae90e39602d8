// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod category;
pub mod classify;
pub mod content;
pub mod engine;
pub mod intervention;
pub mod metrics;
pub mod registry;
pub mod scoring;
pub mod sentiment;
pub mod session;
pub mod settings;
pub mod stimulus;
pub mod thresholds;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::content::{ContentType, RawItem};
pub use crate::engine::{EngineConfig, EngineHandle, EngineMessage};
pub use crate::intervention::InterventionChoice;
pub use crate::settings::Settings;
pub use crate::thresholds::EvaluatorState;
