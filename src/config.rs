//! Window policy configuration.
//!
//! [`WindowPolicy`] holds the completeness and window-length rules applied to
//! every subject. The defaults reproduce the fixed study policy: windows of
//! 2, 3, 5, 7 and 14 days, 1440 minutes per day, and a day counts as complete
//! with at least 80% of its minutes recorded (1152).
//!
//! Override individual fields with struct-update syntax:
//!
//! ```
//! use actiwin::WindowPolicy;
//!
//! let policy = WindowPolicy {
//!     window_lengths: vec![7, 14],
//!     ..WindowPolicy::default()
//! };
//! assert_eq!(policy.threshold(), 1152);
//! ```

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Default window lengths in days
pub const WINDOW_LENGTHS: [u32; 5] = [2, 3, 5, 7, 14];

/// Expected samples per calendar day at minute resolution
pub const MINUTES_PER_DAY: u32 = 1440;

/// Minimum share of a day's minutes (percent) required for the day to count
pub const COMPLETENESS_PERCENT: u32 = 80;

/// `ceil(0.8 * 1440)`
pub const DAILY_COMPLETENESS_THRESHOLD: i64 = 1152;

/// Completeness and window-length policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowPolicy {
    /// Window lengths in days, each evaluated independently.
    ///
    /// Default: `[2, 3, 5, 7, 14]`.
    pub window_lengths: Vec<u32>,

    /// Expected observations per calendar day.
    ///
    /// Default: `1440`.
    pub minutes_per_day: u32,

    /// Percentage of `minutes_per_day` a day needs to be complete.
    ///
    /// The threshold is computed in integer arithmetic and rounded up, so
    /// 80% of 1440 is exactly 1152 with no floating-point drift.
    ///
    /// Default: `80`.
    pub completeness_percent: u32,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            window_lengths: WINDOW_LENGTHS.to_vec(),
            minutes_per_day: MINUTES_PER_DAY,
            completeness_percent: COMPLETENESS_PERCENT,
        }
    }
}

impl WindowPolicy {
    /// Replace the window lengths
    pub fn with_window_lengths(mut self, lengths: impl Into<Vec<u32>>) -> Self {
        self.window_lengths = lengths.into();
        self
    }

    /// Replace the completeness percentage
    pub fn with_completeness_percent(mut self, percent: u32) -> Self {
        self.completeness_percent = percent;
        self
    }

    /// Minimum observation count for a complete day
    pub fn threshold(&self) -> i64 {
        let numerator = u64::from(self.completeness_percent) * u64::from(self.minutes_per_day);
        numerator.div_ceil(100) as i64
    }

    /// Reject policies the assembler cannot apply meaningfully
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.window_lengths.is_empty() {
            return Err(ComputeError::InvalidConfig(
                "at least one window length is required".to_string(),
            ));
        }
        if self.window_lengths.contains(&0) {
            return Err(ComputeError::InvalidConfig(
                "window lengths must be at least one day".to_string(),
            ));
        }
        let mut seen = self.window_lengths.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != self.window_lengths.len() {
            return Err(ComputeError::InvalidConfig(format!(
                "duplicate window lengths in {:?}",
                self.window_lengths
            )));
        }
        if self.minutes_per_day == 0 {
            return Err(ComputeError::InvalidConfig(
                "minutes_per_day must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&self.completeness_percent) {
            return Err(ComputeError::InvalidConfig(format!(
                "completeness_percent must be within 1..=100, got {}",
                self.completeness_percent
            )));
        }
        Ok(())
    }

    /// Load a policy from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
