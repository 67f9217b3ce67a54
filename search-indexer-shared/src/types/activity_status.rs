//! Indexing activity status.
//!
//! The activity queue tracks which indexing activities have completed. It reports this
//! as a completion marker of the form `<last>(<gap>,<gap>,...)`: the id of the last
//! completed activity followed by the ids below it that are still outstanding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Completion state of the indexing activity queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingActivityStatus {
    /// Id of the last completed activity.
    pub last_activity_id: i64,
    /// Ids lower than `last_activity_id` that have not completed yet, in ascending order.
    pub gaps: Vec<i64>,
}

/// Error returned when a completion marker cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid activity status '{marker}': {reason}")]
pub struct ParseActivityStatusError {
    pub marker: String,
    pub reason: String,
}

impl ParseActivityStatusError {
    fn new(marker: &str, reason: impl Into<String>) -> Self {
        Self {
            marker: marker.to_string(),
            reason: reason.into(),
        }
    }
}

impl IndexingActivityStatus {
    pub fn new(last_activity_id: i64, mut gaps: Vec<i64>) -> Self {
        gaps.sort_unstable();
        gaps.dedup();
        Self {
            last_activity_id,
            gaps,
        }
    }

    /// Whether every activity up to `last_activity_id` has completed.
    pub fn is_contiguous(&self) -> bool {
        self.gaps.is_empty()
    }
}

impl fmt::Display for IndexingActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gaps = self
            .gaps
            .iter()
            .map(|gap| gap.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}({})", self.last_activity_id, gaps)
    }
}

impl FromStr for IndexingActivityStatus {
    type Err = ParseActivityStatusError;

    fn from_str(marker: &str) -> Result<Self, Self::Err> {
        let trimmed = marker.trim();

        let (last, rest) = trimmed
            .split_once('(')
            .ok_or_else(|| ParseActivityStatusError::new(marker, "missing '('"))?;
        let gaps = rest
            .strip_suffix(')')
            .ok_or_else(|| ParseActivityStatusError::new(marker, "missing ')'"))?;

        let last_activity_id = last.trim().parse::<i64>().map_err(|e| {
            ParseActivityStatusError::new(marker, format!("invalid last activity id: {}", e))
        })?;

        let gaps = gaps
            .split(',')
            .map(str::trim)
            .filter(|gap| !gap.is_empty())
            .map(|gap| {
                gap.parse::<i64>().map_err(|e| {
                    ParseActivityStatusError::new(marker, format!("invalid gap '{}': {}", gap, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(gap) = gaps.iter().find(|gap| **gap >= last_activity_id) {
            return Err(ParseActivityStatusError::new(
                marker,
                format!("gap {} is not below last activity id", gap),
            ));
        }

        Ok(Self::new(last_activity_id, gaps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_gaps() {
        let status: IndexingActivityStatus = "42(40,37)".parse().unwrap();
        assert_eq!(status.last_activity_id, 42);
        assert_eq!(status.gaps, vec![37, 40]);
        assert!(!status.is_contiguous());
    }

    #[test]
    fn test_parse_without_gaps() {
        let status: IndexingActivityStatus = " 7( ) ".parse().unwrap();
        assert_eq!(status, IndexingActivityStatus::new(7, vec![]));
        assert!(status.is_contiguous());
    }

    #[test]
    fn test_display_matches_marker_format() {
        let status = IndexingActivityStatus::new(12, vec![9, 3]);
        assert_eq!(status.to_string(), "12(3,9)");
        assert_eq!(IndexingActivityStatus::default().to_string(), "0()");
    }

    #[test]
    fn test_parse_invalid_markers() {
        assert!("42".parse::<IndexingActivityStatus>().is_err());
        assert!("42(1,2".parse::<IndexingActivityStatus>().is_err());
        assert!("abc()".parse::<IndexingActivityStatus>().is_err());
        assert!("5(1,x)".parse::<IndexingActivityStatus>().is_err());
    }

    #[test]
    fn test_parse_rejects_gap_above_last() {
        let err = "5(2,6)".parse::<IndexingActivityStatus>().unwrap_err();
        assert!(err.reason.contains("gap 6"));
    }
}
