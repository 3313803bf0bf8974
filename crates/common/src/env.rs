//! Environment variable names recognized by the bubble client.
//!
//! These constants are the single source of truth for configuration read from
//! the process environment.

use once_cell::sync::Lazy;

/// Environment variable bounding how many blocks a single chunked
/// `bub_getLogs` request may cover.
///
/// The local filter emulator splits large block ranges into windows of at
/// most this many blocks per underlying request. When not set or not a valid
/// integer, [`DEFAULT_MAX_BLOCK_REQUEST`] applies.
pub const BUB_MAX_BLOCK_REQUEST: &str = "BUB_MAX_BLOCK_REQUEST";

/// Default chunk width for windowed log and block-hash fetches.
pub const DEFAULT_MAX_BLOCK_REQUEST: u64 = 50;

static MAX_BLOCK_REQUEST: Lazy<u64> = Lazy::new(|| {
    std::env::var(BUB_MAX_BLOCK_REQUEST)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_BLOCK_REQUEST)
});

/// The chunk width in effect for this process.
///
/// Resolved once from [`BUB_MAX_BLOCK_REQUEST`] on first use.
pub fn max_block_request() -> u64 {
    *MAX_BLOCK_REQUEST
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_applies_without_env() {
        // The variable is not set in the test environment.
        assert_eq!(max_block_request(), DEFAULT_MAX_BLOCK_REQUEST);
    }
}
