use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_f64(profile: &str, key: &str, default: f64) -> f64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(default)
}

// ── Engine config ─────────────────────────────────────────────

/// Tuning knobs for the resolution engine.
///
/// Only the cost estimator reads these. Costs order evaluation, they never
/// decide results, so every value here is safe to change at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    #[serde(skip)]
    pub profile: String,
    /// Depth past which aggregates stop being walked and cost `node_cost`.
    pub max_cost_depth: usize,
    /// Maximum number of children of one aggregate included in its cost.
    pub max_cost_breadth: usize,
    /// Cost of a thunk that carries no cost marker.
    pub function_cost: f64,
    /// Cost of a directive whose handler declares no cost function.
    pub handler_cost: f64,
    /// Flat per-aggregate overhead.
    pub node_cost: f64,
    /// Cost of a node that is already resolving or resolved.
    pub memoized_cost: f64,
    /// Extra cost operators add when they must look up their comparison target.
    pub unknown_cost: f64,
}

pub const DEFAULT_MAX_COST_DEPTH: usize = 4;
pub const DEFAULT_MAX_COST_BREADTH: usize = 25;
pub const DEFAULT_FUNCTION_COST: f64 = 10.0;
pub const DEFAULT_HANDLER_COST: f64 = 10.0;
pub const DEFAULT_NODE_COST: f64 = 1.0;
pub const DEFAULT_MEMOIZED_COST: f64 = 1.0;
pub const DEFAULT_UNKNOWN_COST: f64 = 10.0;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            max_cost_depth: DEFAULT_MAX_COST_DEPTH,
            max_cost_breadth: DEFAULT_MAX_COST_BREADTH,
            function_cost: DEFAULT_FUNCTION_COST,
            handler_cost: DEFAULT_HANDLER_COST,
            node_cost: DEFAULT_NODE_COST,
            memoized_cost: DEFAULT_MEMOIZED_COST,
            unknown_cost: DEFAULT_UNKNOWN_COST,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RULIFY_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RULIFY_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            max_cost_depth: profiled_env_usize(p, "RULIFY_COST_MAX_DEPTH", DEFAULT_MAX_COST_DEPTH),
            max_cost_breadth: profiled_env_usize(
                p,
                "RULIFY_COST_MAX_BREADTH",
                DEFAULT_MAX_COST_BREADTH,
            ),
            function_cost: profiled_env_f64(p, "RULIFY_COST_FUNCTION", DEFAULT_FUNCTION_COST),
            handler_cost: profiled_env_f64(p, "RULIFY_COST_HANDLER", DEFAULT_HANDLER_COST),
            node_cost: profiled_env_f64(p, "RULIFY_COST_NODE", DEFAULT_NODE_COST),
            memoized_cost: profiled_env_f64(p, "RULIFY_COST_MEMOIZED", DEFAULT_MEMOIZED_COST),
            unknown_cost: profiled_env_f64(p, "RULIFY_COST_UNKNOWN", DEFAULT_UNKNOWN_COST),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }
}
