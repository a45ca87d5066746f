//! Window assembly
//!
//! For each configured window length L, every contiguous L-day span inside a
//! subject's gap-inclusive calendar range is tested, and the span is kept iff
//! all of its days are complete. Lengths are independent of one another and
//! overlapping spans of the same length are all retained.

use crate::completeness::CompletenessEvaluator;
use crate::config::WindowPolicy;
use crate::error::ComputeError;
use crate::segmenter::DaySegmenter;
use crate::types::{ActivityPoint, DayCompleteness, Group, Observation, Window};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// All windows and the per-day audit for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectWindows {
    pub participant_id: String,
    pub group: Group,
    /// One entry per calendar day in the recording range, gap days included
    pub days: Vec<DayCompleteness>,
    /// Qualifying windows keyed by length; every configured length is present
    pub windows: BTreeMap<u32, Vec<Window>>,
}

impl SubjectWindows {
    /// Windows of the given length, in ascending start-day order
    pub fn windows_for(&self, length_days: u32) -> &[Window] {
        self.windows
            .get(&length_days)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn complete_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_complete).count()
    }

    /// Total windows across all lengths
    pub fn window_count(&self) -> usize {
        self.windows.values().map(Vec::len).sum()
    }

    /// Iterate every window, grouped by ascending length
    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.values().flatten()
    }
}

/// Window assembler bound to a validated policy
#[derive(Debug, Clone)]
pub struct WindowAssembler {
    policy: WindowPolicy,
}

impl WindowAssembler {
    pub fn new(policy: WindowPolicy) -> Result<Self, ComputeError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Assemble every qualifying window for a single subject.
    ///
    /// The slice must hold observations of exactly one subject. A subject
    /// with no qualifying span for some length gets an empty list for it.
    pub fn assemble(&self, observations: &[Observation]) -> Result<SubjectWindows, ComputeError> {
        let (participant_id, group) = subject_identity(observations)?;

        let segmentation = DaySegmenter::segment(observations)?;
        let days = CompletenessEvaluator::evaluate(&segmentation.counts, self.policy.threshold())?;

        // Bucket observations by day offset so each window copies its slice
        // in calendar order without rescanning the whole series.
        let mut buckets: Vec<Vec<ActivityPoint>> = vec![Vec::new(); days.len()];
        if let Some(first) = days.first().map(|d| d.day) {
            for (obs, label) in observations.iter().zip(&segmentation.labels) {
                let offset = (*label - first).num_days() as usize;
                if let Some(timestamp) = obs.timestamp {
                    buckets[offset].push(ActivityPoint {
                        timestamp,
                        activity: obs.activity,
                    });
                }
            }
        }

        // complete_prefix[i] = number of complete days among days[..i]
        let mut complete_prefix = Vec::with_capacity(days.len() + 1);
        complete_prefix.push(0usize);
        for day in &days {
            let last = complete_prefix[complete_prefix.len() - 1];
            complete_prefix.push(last + usize::from(day.is_complete));
        }

        let mut windows = BTreeMap::new();
        for &length_days in &self.policy.window_lengths {
            let len = length_days as usize;
            let mut found = Vec::new();

            if len <= days.len() {
                for start in 0..=(days.len() - len) {
                    if complete_prefix[start + len] - complete_prefix[start] != len {
                        continue;
                    }
                    found.push(build_window(
                        &participant_id,
                        group,
                        length_days,
                        &days[start..start + len],
                        &buckets[start..start + len],
                    ));
                }
            }

            debug!(
                participant_id = %participant_id,
                length_days,
                windows = found.len(),
                "assembled windows"
            );
            windows.insert(length_days, found);
        }

        Ok(SubjectWindows {
            participant_id,
            group,
            days,
            windows,
        })
    }
}

fn subject_identity(observations: &[Observation]) -> Result<(String, Group), ComputeError> {
    let first = observations.first().ok_or_else(|| {
        ComputeError::ContractViolation("no observations for subject".to_string())
    })?;

    if first.participant_id.is_empty() {
        return Err(ComputeError::ContractViolation(
            "observation 0 has an empty participant_id".to_string(),
        ));
    }

    for (idx, obs) in observations.iter().enumerate().skip(1) {
        if obs.participant_id != first.participant_id {
            return Err(ComputeError::ContractViolation(format!(
                "observation {} belongs to '{}', expected '{}'",
                idx, obs.participant_id, first.participant_id
            )));
        }
        if obs.group != first.group {
            return Err(ComputeError::ContractViolation(format!(
                "observation {} of '{}' has group {}, expected {}",
                idx, obs.participant_id, obs.group, first.group
            )));
        }
    }

    Ok((first.participant_id.clone(), first.group))
}

fn build_window(
    participant_id: &str,
    group: Group,
    length_days: u32,
    days: &[DayCompleteness],
    buckets: &[Vec<ActivityPoint>],
) -> Window {
    let constituent_days: Vec<_> = days.iter().map(|d| d.day).collect();
    let activity_series = buckets.iter().flatten().copied().collect();

    Window {
        participant_id: participant_id.to_string(),
        group,
        length_days,
        start_day: constituent_days[0],
        end_day: constituent_days[constituent_days.len() - 1],
        constituent_days,
        activity_series,
    }
}
