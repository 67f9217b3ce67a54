//! Retry policy for partially failed batches.
//!
//! Per-document status codes are split into a fixed transient set, which is
//! retried, and everything else, which aborts the submission.

use std::time::Duration;

/// Status codes the index service uses for failures that resolve on retry:
/// multi-status (207), unprocessable entity (422) and service unavailable (503).
pub const TRANSIENT_STATUS_CODES: [u16; 3] = [207, 422, 503];

/// Whether a failed document with this status code may be retried.
pub fn is_transient_status(status_code: u16) -> bool {
    TRANSIENT_STATUS_CODES.contains(&status_code)
}

/// Wait before the attempt following `attempt`: `2^attempt` backoff units.
///
/// No jitter and no cap; saturates instead of overflowing.
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    unit.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient_status(207));
        assert!(is_transient_status(422));
        assert!(is_transient_status(503));

        assert!(!is_transient_status(200));
        assert!(!is_transient_status(400));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(429));
        assert!(!is_transient_status(500));
    }

    #[test]
    fn test_backoff_growth() {
        let unit = Duration::from_millis(1);
        assert_eq!(backoff_delay(1, unit), Duration::from_millis(2));
        assert_eq!(backoff_delay(2, unit), Duration::from_millis(4));
        assert_eq!(backoff_delay(3, unit), Duration::from_millis(8));
        assert_eq!(backoff_delay(4, unit), Duration::from_millis(16));
    }

    #[test]
    fn test_backoff_scales_with_unit() {
        assert_eq!(
            backoff_delay(3, Duration::from_millis(100)),
            Duration::from_millis(800)
        );
    }

    #[test]
    fn test_backoff_saturates() {
        let delay = backoff_delay(40, Duration::from_secs(1));
        assert_eq!(delay, Duration::from_secs(u32::MAX as u64));
    }
}
