//! Service configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | EVENT_CHANNEL_CAPACITY | 1024 | Per-room broadcast channel capacity |
//! | MAX_MUTATION_RETRIES | 3 | Version-conflict retries before surfacing busy |

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of each room's broadcast channel; slow subscribers that
    /// lag past this simply miss events and must resync via snapshot
    pub event_channel_capacity: usize,
    /// How many times a version-conflicted commit is retried internally
    /// before the operation fails with ResourceBusy
    pub max_mutation_retries: u32,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        Self {
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            max_mutation_retries: std::env::var("MAX_MUTATION_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1024,
            max_mutation_retries: 3,
        }
    }
}
