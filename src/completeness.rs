//! Day completeness evaluation
//!
//! Classifies every calendar day a subject's recording spans, from the first
//! to the last observed day inclusive. Days with no observations are
//! synthesized with a count of zero, so a recording gap always shows up as an
//! incomplete day instead of silently vanishing from the range.

use crate::error::ComputeError;
use crate::types::DayCompleteness;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A day is complete when its observation count reaches the threshold
pub fn is_day_complete(observation_count: i64, threshold: i64) -> bool {
    observation_count >= threshold
}

/// Completeness evaluator over a subject's full calendar range
pub struct CompletenessEvaluator;

impl CompletenessEvaluator {
    /// Classify each day from the first to the last key of `counts`.
    ///
    /// The returned sequence is sorted, gap-inclusive and has one entry per
    /// calendar day. An empty map yields an empty sequence.
    pub fn evaluate(
        counts: &BTreeMap<NaiveDate, i64>,
        threshold: i64,
    ) -> Result<Vec<DayCompleteness>, ComputeError> {
        if let Some((day, count)) = counts.iter().find(|(_, count)| **count < 0) {
            return Err(ComputeError::InvalidCount {
                day: *day,
                count: *count,
            });
        }

        let (first, last) = match (counts.keys().next(), counts.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Ok(Vec::new()),
        };

        let days = first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| {
                let observation_count = counts.get(&day).copied().unwrap_or(0);
                DayCompleteness {
                    day,
                    observation_count,
                    is_complete: is_day_complete(observation_count, threshold),
                }
            })
            .collect();

        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DAILY_COMPLETENESS_THRESHOLD;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!is_day_complete(1151, DAILY_COMPLETENESS_THRESHOLD));
        assert!(is_day_complete(1152, DAILY_COMPLETENESS_THRESHOLD));
        assert!(is_day_complete(1440, DAILY_COMPLETENESS_THRESHOLD));
        assert!(!is_day_complete(0, DAILY_COMPLETENESS_THRESHOLD));
    }

    #[test]
    fn test_monotonic_in_count() {
        let mut was_complete = false;
        for count in 0..=1440 {
            let now = is_day_complete(count, DAILY_COMPLETENESS_THRESHOLD);
            assert!(now || !was_complete, "flipped back at {count}");
            was_complete = now;
        }
    }

    #[test]
    fn test_gap_days_are_synthesized_incomplete() {
        let counts = BTreeMap::from([(d("2024-01-01"), 1440), (d("2024-01-04"), 1200)]);

        let days = CompletenessEvaluator::evaluate(&counts, DAILY_COMPLETENESS_THRESHOLD).unwrap();

        assert_eq!(days.len(), 4);
        assert_eq!(days[1].day, d("2024-01-02"));
        assert_eq!(days[1].observation_count, 0);
        assert!(!days[1].is_complete);
        assert!(!days[2].is_complete);
        assert!(days[0].is_complete);
        assert!(days[3].is_complete);
    }

    #[test]
    fn test_negative_count_rejected() {
        let counts = BTreeMap::from([(d("2024-01-01"), 1440), (d("2024-01-02"), -3)]);

        let err = CompletenessEvaluator::evaluate(&counts, DAILY_COMPLETENESS_THRESHOLD).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::InvalidCount { count: -3, .. }
        ));
    }

    #[test]
    fn test_empty_counts() {
        let days = CompletenessEvaluator::evaluate(&BTreeMap::new(), 1152).unwrap();
        assert!(days.is_empty());
    }
}
