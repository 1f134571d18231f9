//! Accepted-answer feature configuration.

use super::defaults::default_min_post_number;
use serde::Deserialize;

/// Accepted-answer feature switches.
#[derive(Debug, Clone, Deserialize)]
pub struct SolvedConfig {
    /// Allow accepted answers in every category, ignoring per-category flags
    /// (default: false).
    #[serde(default)]
    pub allow_solved_on_all_topics: bool,
    /// Lowest post number that may be accepted (default: 2).
    #[serde(default = "default_min_post_number")]
    pub min_post_number: i64,
}

impl Default for SolvedConfig {
    fn default() -> Self {
        Self {
            allow_solved_on_all_topics: false,
            min_post_number: default_min_post_number(),
        }
    }
}
