//! Pipeline orchestration
//!
//! This module provides the multi-subject entry points. Observations of many
//! subjects are split per participant, each subject runs through
//! segmentation → completeness → window assembly independently, and the
//! per-subject results are tallied into a coverage report.

use crate::config::WindowPolicy;
use crate::error::ComputeError;
use crate::types::{Group, Observation};
use crate::windowing::{SubjectWindows, WindowAssembler};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Split observations per participant, in order of first appearance.
///
/// Observation order within each subject is preserved.
pub fn group_by_subject(observations: &[Observation]) -> Vec<(String, Vec<Observation>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut subjects: Vec<(String, Vec<Observation>)> = Vec::new();

    for obs in observations {
        let slot = *index.entry(obs.participant_id.as_str()).or_insert_with(|| {
            subjects.push((obs.participant_id.clone(), Vec::new()));
            subjects.len() - 1
        });
        subjects[slot].1.push(obs.clone());
    }

    subjects
}

/// Assemble windows for every subject found in `observations`.
///
/// Subjects are independent; with the `parallel` feature they are processed
/// on the rayon pool. Output order follows first appearance either way.
pub fn assemble_all(
    observations: &[Observation],
    policy: &WindowPolicy,
) -> Result<Vec<SubjectWindows>, ComputeError> {
    let assembler = WindowAssembler::new(policy.clone())?;
    let subjects = group_by_subject(observations);

    #[cfg(feature = "parallel")]
    let results: Result<Vec<_>, _> = subjects
        .par_iter()
        .map(|(_, obs)| assembler.assemble(obs))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Result<Vec<_>, _> = subjects
        .iter()
        .map(|(_, obs)| assembler.assemble(obs))
        .collect();

    let results = results?;
    info!(
        subjects = results.len(),
        windows = results.iter().map(SubjectWindows::window_count).sum::<usize>(),
        "window assembly finished"
    );
    Ok(results)
}

/// Coverage of one subject at one window length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    pub participant_id: String,
    pub group: Group,
    pub length_days: u32,
    /// Days in the gap-inclusive recording range
    pub calendar_days: usize,
    pub complete_days: usize,
    pub window_count: usize,
}

/// Per-subject, per-length window tally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub rows: Vec<CoverageRow>,
}

impl CoverageReport {
    pub fn from_subjects(subjects: &[SubjectWindows]) -> Self {
        let rows = subjects
            .iter()
            .flat_map(|subject| {
                subject.windows.iter().map(move |(&length_days, windows)| CoverageRow {
                    participant_id: subject.participant_id.clone(),
                    group: subject.group,
                    length_days,
                    calendar_days: subject.days.len(),
                    complete_days: subject.complete_days(),
                    window_count: windows.len(),
                })
            })
            .collect();
        Self { rows }
    }

    /// Number of subjects contributing at least one window of this length
    pub fn subjects_with_windows(&self, length_days: u32) -> usize {
        self.rows
            .iter()
            .filter(|r| r.length_days == length_days && r.window_count > 0)
            .count()
    }

    /// Same tally restricted to one group
    pub fn subjects_with_windows_in(&self, length_days: u32, group: Group) -> usize {
        self.rows
            .iter()
            .filter(|r| r.length_days == length_days && r.group == group && r.window_count > 0)
            .count()
    }
}

/// Processor holding a window policy across calls.
///
/// Use this when the same policy is applied to several batches of subjects.
pub struct WindowingProcessor {
    policy: WindowPolicy,
}

impl Default for WindowingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowingProcessor {
    /// Create a processor with the default study policy
    pub fn new() -> Self {
        Self {
            policy: WindowPolicy::default(),
        }
    }

    /// Create a processor with a custom policy
    pub fn with_policy(policy: WindowPolicy) -> Result<Self, ComputeError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Assemble windows for every subject in `observations`
    pub fn process(&self, observations: &[Observation]) -> Result<Vec<SubjectWindows>, ComputeError> {
        assemble_all(observations, &self.policy)
    }

    /// Assemble and tally coverage in one step
    pub fn coverage(&self, observations: &[Observation]) -> Result<CoverageReport, ComputeError> {
        let subjects = self.process(observations)?;
        Ok(CoverageReport::from_subjects(&subjects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn subject(pid: &str, group: Group, minutes_per_day: &[u32]) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut out = Vec::new();
        for (i, &minutes) in minutes_per_day.iter().enumerate() {
            let midnight = (start + Duration::days(i as i64)).and_hms_opt(0, 0, 0).unwrap();
            for m in 0..minutes {
                out.push(Observation::new(
                    pid,
                    group,
                    midnight + Duration::minutes(m as i64),
                    Some(1.0),
                ));
            }
        }
        out
    }

    #[test]
    fn test_group_by_subject_preserves_first_appearance() {
        let mut observations = subject("control_2", Group::Control, &[2]);
        observations.extend(subject("condition_1", Group::Condition, &[1]));
        observations.extend(subject("control_2", Group::Control, &[1]));

        let grouped = group_by_subject(&observations);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "control_2");
        assert_eq!(grouped[0].1.len(), 3);
        assert_eq!(grouped[1].0, "condition_1");
    }

    #[test]
    fn test_assemble_all_and_coverage() {
        let mut observations = subject("condition_1", Group::Condition, &[1440, 1440, 1440]);
        observations.extend(subject("control_1", Group::Control, &[600, 600, 600]));

        let processor =
            WindowingProcessor::with_policy(WindowPolicy::default().with_window_lengths(vec![2, 3]))
                .unwrap();
        let subjects = processor.process(&observations).unwrap();

        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].windows_for(2).len(), 2);
        assert_eq!(subjects[0].windows_for(3).len(), 1);
        // Subject with no complete days is a valid, empty outcome
        assert_eq!(subjects[1].window_count(), 0);

        let report = CoverageReport::from_subjects(&subjects);
        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.subjects_with_windows(2), 1);
        assert_eq!(report.subjects_with_windows_in(3, Group::Control), 0);

        let control_row = report
            .rows
            .iter()
            .find(|r| r.participant_id == "control_1" && r.length_days == 2)
            .unwrap();
        assert_eq!(control_row.calendar_days, 3);
        assert_eq!(control_row.complete_days, 0);
        assert_eq!(control_row.window_count, 0);
    }

    #[test]
    fn test_empty_input_yields_no_subjects() {
        let subjects = assemble_all(&[], &WindowPolicy::default()).unwrap();
        assert!(subjects.is_empty());
    }

    #[test]
    fn test_invalid_policy_surfaces() {
        let policy = WindowPolicy::default().with_window_lengths(vec![3, 3]);
        assert!(WindowingProcessor::with_policy(policy.clone()).is_err());
        assert!(assemble_all(&[], &policy).is_err());
    }
}
