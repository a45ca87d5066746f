//! actiwin CLI - Command-line interface for actiwin
//!
//! Commands:
//! - days: Per-day completeness for every subject
//! - windows: Qualifying analysis windows
//! - coverage: Window tally per subject and length
//! - surrogate: Shuffle surrogates for one window

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use actiwin::ingest::load_all_subjects;
use actiwin::{
    BaselineGenerator, ComputeError, CoverageReport, DayCompleteness, Group, SubjectWindows,
    Surrogate, WindowPolicy, WindowSummary, WindowingProcessor, ACTIWIN_VERSION,
};

/// actiwin - Completeness-gated windows and shuffle baselines for actigraphy
#[derive(Parser)]
#[command(name = "actiwin")]
#[command(version = ACTIWIN_VERSION)]
#[command(about = "Assemble complete-day actigraphy windows and shuffle surrogates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-day completeness for every subject
    Days {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Qualifying analysis windows
    Windows {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Omit the minute series and print window metadata only
        #[arg(long)]
        summary: bool,
    },

    /// Window tally per subject and length
    Coverage {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Shuffle surrogates for one window
    Surrogate {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Participant id (e.g. condition_7)
        #[arg(long)]
        participant: String,

        /// Window length in days
        #[arg(long)]
        length: u32,

        /// Window start day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Seed for the first draw; later draws use seed+1, seed+2, ...
        #[arg(long)]
        seed: Option<u64>,

        /// Number of surrogates to draw
        #[arg(long, default_value = "1")]
        draws: usize,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Raw data root containing condition/ and control/
    #[arg(long)]
    raw_root: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Output format
    #[arg(long, default_value = "ndjson")]
    format: OutputFormat,
}

#[derive(Args)]
struct PolicyArgs {
    /// Load the window policy from a JSON file
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Window lengths in days, comma separated
    #[arg(long, value_delimiter = ',')]
    lengths: Option<Vec<u32>>,

    /// Expected observations per day
    #[arg(long)]
    minutes_per_day: Option<u32>,

    /// Percentage of a day's minutes required for completeness
    #[arg(long)]
    completeness_percent: Option<u32>,
}

impl PolicyArgs {
    fn resolve(&self) -> Result<WindowPolicy, ActiwinCliError> {
        let mut policy = match &self.policy {
            Some(path) => WindowPolicy::from_json(&fs::read_to_string(path)?)?,
            None => WindowPolicy::default(),
        };
        if let Some(lengths) = &self.lengths {
            policy.window_lengths = lengths.clone();
        }
        if let Some(minutes) = self.minutes_per_day {
            policy.minutes_per_day = minutes;
        }
        if let Some(percent) = self.completeness_percent {
            policy.completeness_percent = percent;
        }
        policy.validate()?;
        Ok(policy)
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ActiwinCliError> {
    match cli.command {
        Commands::Days { io, policy } => {
            let subjects = process(&io.raw_root, &policy.resolve()?)?;
            let records: Vec<SubjectDays> = subjects
                .iter()
                .map(|s| SubjectDays {
                    participant_id: &s.participant_id,
                    group: s.group,
                    days: &s.days,
                })
                .collect();
            write_output(&io.output, &format_output(&records, &io.format)?)
        }

        Commands::Windows {
            io,
            policy,
            summary,
        } => {
            let subjects = process(&io.raw_root, &policy.resolve()?)?;
            let data = if summary {
                let records: Vec<WindowSummary> = subjects
                    .iter()
                    .flat_map(|s| s.iter().map(|w| w.summary()))
                    .collect();
                format_output(&records, &io.format)?
            } else {
                let records: Vec<_> = subjects.iter().flat_map(SubjectWindows::iter).collect();
                format_output(&records, &io.format)?
            };
            write_output(&io.output, &data)
        }

        Commands::Coverage { io, policy } => {
            let subjects = process(&io.raw_root, &policy.resolve()?)?;
            let report = CoverageReport::from_subjects(&subjects);
            write_output(&io.output, &format_output(&report.rows, &io.format)?)
        }

        Commands::Surrogate {
            io,
            policy,
            participant,
            length,
            start,
            seed,
            draws,
        } => {
            let subjects = process(&io.raw_root, &policy.resolve()?)?;
            let window = subjects
                .iter()
                .filter(|s| s.participant_id == participant)
                .flat_map(|s| s.windows_for(length))
                .find(|w| w.start_day == start)
                .ok_or_else(|| {
                    ActiwinCliError::WindowNotFound(format!("{participant}/{length}d/{start}"))
                })?;

            let surrogates: Vec<Surrogate> = match seed {
                Some(seed) => BaselineGenerator::ensemble(window, draws, seed),
                None => (0..draws)
                    .map(|_| BaselineGenerator::surrogate(window, None))
                    .collect(),
            };
            info!(window = %window.id(), draws = surrogates.len(), "drew surrogates");
            write_output(&io.output, &format_output(&surrogates, &io.format)?)
        }
    }
}

fn process(raw_root: &Path, policy: &WindowPolicy) -> Result<Vec<SubjectWindows>, ActiwinCliError> {
    let observations = load_all_subjects(raw_root)?;
    let processor = WindowingProcessor::with_policy(policy.clone())?;
    let subjects = processor.process(&observations)?;
    if subjects.is_empty() {
        return Err(ActiwinCliError::NoSubjects);
    }
    Ok(subjects)
}

fn format_output<T: Serialize>(records: &[T], format: &OutputFormat) -> Result<String, ActiwinCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), ActiwinCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SubjectDays<'a> {
    participant_id: &'a str,
    group: Group,
    days: &'a [DayCompleteness],
}

// Error types

#[derive(Debug)]
enum ActiwinCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    WindowNotFound(String),
    NoSubjects,
}

impl From<io::Error> for ActiwinCliError {
    fn from(e: io::Error) -> Self {
        ActiwinCliError::Io(e)
    }
}

impl From<ComputeError> for ActiwinCliError {
    fn from(e: ComputeError) -> Self {
        ActiwinCliError::Compute(e)
    }
}

impl From<serde_json::Error> for ActiwinCliError {
    fn from(e: serde_json::Error) -> Self {
        ActiwinCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ActiwinCliError> for CliError {
    fn from(e: ActiwinCliError) -> Self {
        match e {
            ActiwinCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ActiwinCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidConfig(_) => {
                        ("INVALID_POLICY", "Check --lengths and --completeness-percent")
                    }
                    ComputeError::ContractViolation(_) | ComputeError::InvalidCount { .. } => {
                        ("CONTRACT_VIOLATION", "Input observations violate the loader contract")
                    }
                    _ => ("COMPUTE_ERROR", "Ensure the raw root holds condition/ and control/ CSVs"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            ActiwinCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax of the policy file".to_string()),
            },
            ActiwinCliError::WindowNotFound(id) => CliError {
                code: "WINDOW_NOT_FOUND".to_string(),
                message: format!("No qualifying window {}", id),
                hint: Some("Run 'actiwin windows --summary' to list windows".to_string()),
            },
            ActiwinCliError::NoSubjects => CliError {
                code: "NO_SUBJECTS".to_string(),
                message: "No subjects found in input".to_string(),
                hint: Some("Ensure subject CSVs are not empty".to_string()),
            },
        }
    }
}
