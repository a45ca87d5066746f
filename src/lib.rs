//! actiwin - Windowing and shuffle baselines for minute-level actigraphy
//!
//! actiwin turns each subject's continuous per-minute activity stream into
//! validated multi-day analysis windows through a deterministic pipeline:
//! day segmentation → completeness evaluation → window assembly, and draws
//! within-window shuffle surrogates for permutation null models.
//!
//! ## Modules
//!
//! - **Windowing core**: [`segmenter`], [`completeness`], [`windowing`]
//! - **Null baselines**: [`baseline`]
//! - **Orchestration**: [`pipeline`] (multi-subject runs, coverage tally)
//! - **Ingestion**: [`ingest`] (per-subject CSV files and score metadata)

pub mod baseline;
pub mod completeness;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod segmenter;
pub mod types;
pub mod windowing;

pub use baseline::{ActivityTable, BaselineGenerator, ACTIVITY_COLUMN};
pub use completeness::{is_day_complete, CompletenessEvaluator};
pub use config::{
    WindowPolicy, COMPLETENESS_PERCENT, DAILY_COMPLETENESS_THRESHOLD, MINUTES_PER_DAY,
    WINDOW_LENGTHS,
};
pub use error::ComputeError;
pub use pipeline::{assemble_all, CoverageReport, CoverageRow, WindowingProcessor};
pub use segmenter::{DaySegmentation, DaySegmenter};
pub use types::{
    ActivityPoint, DayCompleteness, Group, Observation, Surrogate, SurrogateProvenance, Window,
    WindowId, WindowSummary,
};
pub use windowing::{SubjectWindows, WindowAssembler};

/// actiwin version
pub const ACTIWIN_VERSION: &str = env!("CARGO_PKG_VERSION");
