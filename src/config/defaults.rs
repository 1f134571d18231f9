//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_listen_address() -> std::net::SocketAddr {
    std::net::SocketAddr::from(([127, 0, 0, 1], 4300))
}

pub fn default_database_path() -> String {
    "solved.db".to_string()
}

// =============================================================================
// Solved Defaults
// =============================================================================

/// The topic's opening post is post number 1 and is never its own answer.
pub fn default_min_post_number() -> i64 {
    2
}
