//! Day segmentation
//!
//! Maps every observation of one subject to its calendar day and counts
//! observations per day. Days without any observation do not appear in the
//! counts; the completeness evaluator fills them in.

use crate::error::ComputeError;
use crate::types::Observation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-observation day labels and per-day observation counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySegmentation {
    /// Day label of each observation, in input order
    pub labels: Vec<NaiveDate>,
    /// Observation count per calendar day that has at least one observation
    pub counts: BTreeMap<NaiveDate, i64>,
}

impl DaySegmentation {
    /// Total observations across all days
    pub fn total(&self) -> i64 {
        self.counts.values().sum()
    }

    /// First and last observed day
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.counts.keys().next()?;
        let last = self.counts.keys().next_back()?;
        Some((*first, *last))
    }
}

/// Day segmenter for one subject's observations
pub struct DaySegmenter;

impl DaySegmenter {
    /// Label each observation with its calendar day and count per day.
    ///
    /// Missing activity values are still counted: a recorded minute with a
    /// missing reading is a recorded minute.
    pub fn segment(observations: &[Observation]) -> Result<DaySegmentation, ComputeError> {
        let mut labels = Vec::with_capacity(observations.len());
        let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();

        for (idx, obs) in observations.iter().enumerate() {
            let day = obs.day().ok_or_else(|| {
                ComputeError::ContractViolation(format!(
                    "observation {} of participant '{}' has no timestamp",
                    idx, obs.participant_id
                ))
            })?;
            labels.push(day);
            *counts.entry(day).or_insert(0) += 1;
        }

        Ok(DaySegmentation { labels, counts })
    }
}
