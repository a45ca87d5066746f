//! CSV ingestion for per-subject actigraphy files.
//!
//! Layout expected under a raw-data root:
//!
//! ```text
//! raw/
//!   condition/condition_1.csv ...
//!   control/control_1.csv ...
//!   scores.csv              (optional, loaded separately)
//! ```
//!
//! ## Subject CSV columns (case-insensitive, order-independent)
//!
//! | Column      | Example               | Notes                                   |
//! |-------------|-----------------------|-----------------------------------------|
//! | `timestamp` | `2003-05-07 12:00:00` | Rows that fail to parse are dropped      |
//! | `date`      | `2003-05-07`          | Ignored; the day is derived from `timestamp` |
//! | `activity`  | `0`                   | Empty or non-numeric becomes missing; zero is kept |
//!
//! The participant id is the file stem and the group comes from its
//! `condition_` / `control_` prefix.

use crate::error::ComputeError;
use crate::types::{Group, Observation};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Subject-level metadata row from `scores.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub participant_id: String,
    /// Remaining columns, verbatim
    pub fields: BTreeMap<String, String>,
}

/// Load one subject file, inferring participant id and group from its name
pub fn load_subject_csv(path: &Path) -> Result<Vec<Observation>, ComputeError> {
    let participant_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ComputeError::UnexpectedFileName(path.display().to_string()))?
        .to_string();

    let group = Group::from_participant_id(&participant_id)
        .ok_or_else(|| ComputeError::UnexpectedFileName(participant_id.clone()))?;

    let src = fs::read_to_string(path)?;
    parse_subject_csv_str(&src, &participant_id, group)
}

/// Parse subject CSV text (useful for tests without touching the filesystem).
///
/// See the module docs for the column contract. The result is sorted by
/// timestamp.
pub fn parse_subject_csv_str(
    src: &str,
    participant_id: &str,
    group: Group,
) -> Result<Vec<Observation>, ComputeError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(src.as_bytes());

    let headers = reader.headers()?.clone();
    let ts_idx = column_index(&headers, "timestamp")?;
    let activity_idx = column_index(&headers, "activity")?;

    let mut observations = Vec::new();
    let mut dropped = 0usize;

    for record in reader.records() {
        let record = record?;
        let timestamp = match record.get(ts_idx).and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                dropped += 1;
                continue;
            }
        };
        let activity = record.get(activity_idx).and_then(parse_activity);
        observations.push(Observation::new(participant_id, group, timestamp, activity));
    }

    if dropped > 0 {
        warn!(
            participant_id,
            dropped, "dropped rows with unparseable timestamps"
        );
    }

    observations.sort_by_key(|obs| obs.timestamp);
    debug!(participant_id, rows = observations.len(), "loaded subject");
    Ok(observations)
}

/// Load every subject under `raw_root/condition` and `raw_root/control`
pub fn load_all_subjects(raw_root: &Path) -> Result<Vec<Observation>, ComputeError> {
    let mut observations = Vec::new();
    let mut files = 0usize;

    for group in [Group::Condition, Group::Control] {
        let dir = raw_root.join(group.as_str());
        if !dir.is_dir() {
            return Err(ComputeError::MissingDirectory(dir.display().to_string()));
        }

        for path in csv_files(&dir)? {
            observations.extend(load_subject_csv(&path)?);
            files += 1;
        }
    }

    if files == 0 {
        return Err(ComputeError::NoSubjectFiles(raw_root.display().to_string()));
    }

    debug!(files, rows = observations.len(), "loaded all subjects");
    Ok(observations)
}

/// Load subject-level metadata, renaming `number` to `participant_id`
pub fn load_scores(path: &Path) -> Result<Vec<SubjectScore>, ComputeError> {
    let src = fs::read_to_string(path)?;
    parse_scores_str(&src)
}

pub fn parse_scores_str(src: &str) -> Result<Vec<SubjectScore>, ComputeError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(src.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| match h {
            "number" => "participant_id".to_string(),
            other => other.to_string(),
        })
        .collect();

    if !headers.iter().any(|h| h == "participant_id") {
        return Err(ComputeError::MissingColumn("number".to_string()));
    }

    let mut scores = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut fields: BTreeMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        let participant_id = fields.remove("participant_id").unwrap_or_default();
        scores.push(SubjectScore {
            participant_id,
            fields,
        });
    }

    Ok(scores)
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, ComputeError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, ComputeError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| ComputeError::MissingColumn(name.to_string()))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_activity(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
