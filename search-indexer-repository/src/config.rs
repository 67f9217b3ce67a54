//! Configuration types for the BatchIndexingClient.

use std::time::Duration;

/// Default maximum number of attempts for one logical submission.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff time unit. The wait before attempt `k + 1` is `2^k` units.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_millis(1);

/// Configuration for the BatchIndexingClient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchIndexingConfig {
    /// Maximum number of attempts, including the first one.
    /// Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Time unit the exponential backoff is measured in.
    pub backoff_unit: Duration,
    /// Maximum number of operations allowed in a single submission.
    /// `None` (the default) accepts submissions of any size.
    pub max_batch_size: Option<usize>,
}

impl Default for BatchIndexingConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            max_batch_size: None,
        }
    }
}

impl BatchIndexingConfig {

    /// Set the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff time unit.
    pub fn with_backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    /// Reject submissions larger than `max_batch_size` with `BatchSizeExceeded`.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    /// The attempt cap actually applied by the client.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
