//! Core types for the actiwin pipeline
//!
//! This module defines the data structures that flow through each stage:
//! raw observations, per-day completeness, assembled windows and shuffled
//! surrogates.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Study arm a subject belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Condition,
    Control,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Condition => "condition",
            Group::Control => "control",
        }
    }

    /// Infer the group from a participant id such as `condition_7` or `control_14`
    pub fn from_participant_id(participant_id: &str) -> Option<Self> {
        if participant_id.starts_with("condition_") {
            Some(Group::Condition)
        } else if participant_id.starts_with("control_") {
            Some(Group::Control)
        } else {
            None
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One minute-level reading from a subject's recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Subject identifier (e.g. `condition_7`)
    pub participant_id: String,
    /// Study arm
    pub group: Group,
    /// Minute-resolution timestamp. `None` is a contract breach the segmenter rejects.
    pub timestamp: Option<NaiveDateTime>,
    /// Activity count. `None` is the missing marker; zero is a valid reading.
    pub activity: Option<f64>,
}

impl Observation {
    /// Create an observation with a known timestamp
    pub fn new(
        participant_id: impl Into<String>,
        group: Group,
        timestamp: NaiveDateTime,
        activity: Option<f64>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            group,
            timestamp: Some(timestamp),
            activity,
        }
    }

    /// Calendar day this observation falls on, if it has a timestamp
    pub fn day(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }
}

/// Completeness classification of a single calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCompleteness {
    pub day: NaiveDate,
    /// Recorded minutes on this day (0 for gap days)
    pub observation_count: i64,
    pub is_complete: bool,
}

/// A timestamped activity value inside a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub timestamp: NaiveDateTime,
    pub activity: Option<f64>,
}

/// Identity of a window, used for surrogate provenance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId {
    pub participant_id: String,
    pub length_days: u32,
    pub start_day: NaiveDate,
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}d/{}",
            self.participant_id,
            self.length_days,
            self.start_day.format("%Y-%m-%d")
        )
    }
}

/// A contiguous run of complete calendar days used as an analysis unit
///
/// Windows own a copy of their observations; they are built fresh per run and
/// never reference the source series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub participant_id: String,
    pub group: Group,
    pub length_days: u32,
    pub start_day: NaiveDate,
    /// Inclusive: `start_day + length_days - 1`
    pub end_day: NaiveDate,
    pub constituent_days: Vec<NaiveDate>,
    pub activity_series: Vec<ActivityPoint>,
}

impl Window {
    pub fn id(&self) -> WindowId {
        WindowId {
            participant_id: self.participant_id.clone(),
            length_days: self.length_days,
            start_day: self.start_day,
        }
    }

    /// Activity values in chronological order
    pub fn values(&self) -> Vec<Option<f64>> {
        self.activity_series.iter().map(|p| p.activity).collect()
    }

    /// Copy of this window without its activity series, for compact reporting
    pub fn summary(&self) -> WindowSummary {
        WindowSummary {
            participant_id: self.participant_id.clone(),
            group: self.group,
            length_days: self.length_days,
            start_day: self.start_day,
            end_day: self.end_day,
            observation_count: self.activity_series.len(),
        }
    }
}

/// Window metadata without the minute series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub participant_id: String,
    pub group: Group,
    pub length_days: u32,
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
    pub observation_count: usize,
}

/// Where a surrogate came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurrogateProvenance {
    pub window: WindowId,
    /// Seed that reproduces this draw; `None` when a caller-owned generator was used
    pub seed: Option<u64>,
}

/// A window's activity series with values permuted across its timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surrogate {
    pub provenance: SurrogateProvenance,
    pub series: Vec<ActivityPoint>,
}

impl Surrogate {
    pub fn values(&self) -> Vec<Option<f64>> {
        self.series.iter().map(|p| p.activity).collect()
    }
}
