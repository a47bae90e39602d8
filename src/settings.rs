//! # Settings
//!
//! Engine configuration, owned by the settings collaborator and persisted as
//! JSON (key names match the wire protocol, camelCase). Loaded once at
//! startup, re-read on the reload endpoint; any read or parse failure falls
//! back to the built-in defaults and is logged, never retried synchronously.

use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const ENV_SETTINGS_PATH: &str = "MINDSCROLL_SETTINGS_PATH";
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Env vars consulted when the configured token is the literal `"ENV"`.
const ENV_TOKEN_VARS: [&str; 2] = ["MINDSCROLL_API_TOKEN", "HF_API_TOKEN"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentThresholds {
    pub posts_viewed: usize,
    pub stories_viewed: usize,
    pub reels_viewed: usize,
    /// Seconds of session time.
    pub time_spent: u64,
    /// Accumulated downward scroll, pixels.
    pub scroll_depth: f64,
}

impl Default for ContentThresholds {
    fn default() -> Self {
        Self {
            posts_viewed: 20,
            stories_viewed: 30,
            reels_viewed: 15,
            time_spent: 1800,
            scroll_depth: 12_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedFeatures {
    /// Gate for the AI classification path.
    pub text_analysis: bool,
    /// Selects the weighted-score evaluation rule instead of simple counts.
    pub weighted_scoring: bool,
    pub weighted_threshold: f64,
}

impl Default for AdvancedFeatures {
    fn default() -> Self {
        Self {
            text_analysis: true,
            weighted_scoring: false,
            weighted_threshold: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteRule {
    pub domain: String,
    pub enabled: bool,
}

impl Default for SiteRule {
    fn default() -> Self {
        Self {
            domain: String::new(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub content_thresholds: ContentThresholds,
    pub advanced_features: AdvancedFeatures,
    /// Opaque credential for the external classification API. The literal
    /// value `"ENV"` resolves from the environment; absence disables the AI
    /// path entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub sites: Vec<SiteRule>,
}

impl Settings {
    /// Load from a JSON file, falling back to defaults on any failure.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let mut settings = match fs::read_to_string(path) {
            Ok(s) => match serde_json::from_str::<Settings>(&s) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "settings parse failed, using defaults");
                    Settings::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings read failed, using defaults");
                Settings::default()
            }
        };
        settings.resolve_token();
        settings.sanitize();
        settings
    }

    /// Load from `MINDSCROLL_SETTINGS_PATH`, defaulting to `settings.json`.
    pub fn load() -> Self {
        let path = env::var(ENV_SETTINGS_PATH).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.into());
        Self::load_from_file(path)
    }

    /// `"ENV"` placeholder → first non-empty env var; an unresolvable
    /// placeholder degrades to no token (keyword-only mode) rather than
    /// erroring.
    fn resolve_token(&mut self) {
        if let Some(tok) = &self.api_token {
            if tok.trim().eq_ignore_ascii_case("env") {
                self.api_token = ENV_TOKEN_VARS
                    .iter()
                    .filter_map(|v| env::var(v).ok())
                    .find(|v| !v.trim().is_empty());
                if self.api_token.is_none() {
                    tracing::warn!("api token set to ENV but no token env var present; AI path disabled");
                }
            } else if tok.trim().is_empty() {
                self.api_token = None;
            }
        }
    }

    fn sanitize(&mut self) {
        if !self.advanced_features.weighted_threshold.is_finite()
            || self.advanced_features.weighted_threshold <= 0.0
        {
            self.advanced_features.weighted_threshold =
                AdvancedFeatures::default().weighted_threshold;
        }
        if !self.content_thresholds.scroll_depth.is_finite()
            || self.content_thresholds.scroll_depth <= 0.0
        {
            self.content_thresholds.scroll_depth = ContentThresholds::default().scroll_depth;
        }
    }

    /// True when the AI classification path may be used at all.
    pub fn ai_enabled(&self) -> bool {
        self.advanced_features.text_analysis
            && self.api_token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Per-domain gate for surfacing interventions. Listed domains follow
    /// their flag; unlisted domains are treated as enabled (opt-out model).
    pub fn site_enabled(&self, domain: &str) -> bool {
        let d = domain.trim().to_ascii_lowercase();
        self.sites
            .iter()
            .find(|s| s.domain.eq_ignore_ascii_case(&d))
            .map_or(true, |s| s.enabled)
    }
}
