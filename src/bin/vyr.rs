//! VYR CLI - Command-line interface for the VYR engine
//!
//! Commands:
//! - validate: Validate and repair raw samples
//! - baseline: Compute a personal baseline from a history file
//! - state: Compute the full state for one sample
//! - patterns: Detect recurring patterns in a history file
//! - hrv: Map raw HRV milliseconds onto the 0-100 index

use chrono::Timelike;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use vyr_engine::types::QualityFlag;
use vyr_engine::{
    cognitive_window, physiological_context, pillar_descriptions, system_diagnosis,
    system_reading, today_meaning, validate_with_report, ActionContext, EngineConfig,
    EngineError, MomentAction, PersonalBaseline, RawSample, SampleStore, StateEngine,
    ValidatedSample, ENGINE_VERSION, PRODUCER_NAME,
};

/// VYR - On-device physiological-to-cognitive state engine
#[derive(Parser)]
#[command(name = "vyr")]
#[command(author = "VYR Labs")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn daily biometric samples into a cognitive state", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and repair raw samples
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output a single JSON report instead of one line per sample
        #[arg(long)]
        json: bool,
    },

    /// Compute a personal baseline from a history file
    Baseline {
        /// History file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Compute the full state for one sample
    State {
        /// Sample file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// History file to derive the baseline from
        #[arg(long, conflicts_with = "baseline")]
        history: Option<PathBuf>,

        /// Precomputed baseline file
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Format of the history file
        #[arg(long, default_value = "ndjson")]
        history_format: InputFormat,

        /// Local hour of day (defaults to the current local hour)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
        hour: Option<u8>,

        /// Actions already taken today, comma separated (e.g. BOOT,HOLD)
        #[arg(long, value_delimiter = ',')]
        taken: Vec<MomentAction>,

        /// Include context lines, the cognitive window and the pt-BR readings
        #[arg(long)]
        detailed: bool,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Detect recurring patterns in a history file
    Patterns {
        /// History file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Map raw HRV milliseconds onto the 0-100 index
    Hrv {
        /// RMSSD in milliseconds
        ms: f64,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vyr_engine=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), VyrCliError> {
    let engine = load_engine(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Baseline {
            input,
            input_format,
            output_format,
        } => cmd_baseline(&engine, &input, input_format, output_format),
        Commands::State {
            input,
            history,
            baseline,
            history_format,
            hour,
            taken,
            detailed,
            output_format,
        } => {
            let context = ActionContext {
                hour_of_day: hour.unwrap_or_else(|| chrono::Local::now().hour() as u8),
                sachets_taken_today: taken,
            };
            cmd_state(
                &engine,
                &input,
                BaselineSource::from_args(history, baseline, history_format),
                &context,
                detailed,
                output_format,
            )
        }
        Commands::Patterns {
            input,
            input_format,
            output_format,
        } => cmd_patterns(&engine, &input, input_format, output_format),
        Commands::Hrv { ms } => {
            println!("{}", vyr_engine::normalize_hrv_ms_to_index(ms));
            Ok(())
        }
    }
}

fn load_engine(config: Option<&Path>) -> Result<StateEngine, VyrCliError> {
    let config = match config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    Ok(StateEngine::new(config)?)
}

fn read_input(input: &Path) -> Result<String, VyrCliError> {
    if input.as_os_str() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(VyrCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// One parsed line: its 1-based line number and the sample or the parse error
type ParsedLine = (usize, Result<RawSample, EngineError>);

fn parse_samples(data: &str, format: InputFormat) -> Result<Vec<ParsedLine>, VyrCliError> {
    match format {
        InputFormat::Ndjson => Ok(data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| (i + 1, RawSample::from_json(line.trim())))
            .collect()),
        InputFormat::Json => {
            let values: Vec<serde_json::Value> = serde_json::from_str(data)?;
            Ok(values
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let sample = serde_json::from_value(value).map_err(|e| {
                        EngineError::MalformedSample(e.to_string())
                    });
                    (i + 1, sample)
                })
                .collect())
        }
    }
}

/// Parse a history file, failing on the first malformed entry
fn read_history(path: &Path, format: InputFormat) -> Result<Vec<ValidatedSample>, VyrCliError> {
    let data = read_input(path)?;
    let mut history = Vec::new();
    for (line, sample) in parse_samples(&data, format)? {
        let sample = sample.map_err(|e| VyrCliError::Line(line, e))?;
        history.push(vyr_engine::validate(&sample));
    }
    Ok(history)
}

fn write_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<(), VyrCliError> {
    let json = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", json);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleReport {
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample: Option<ValidatedSample>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    quality_flags: Vec<QualityFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport {
    producer: &'static str,
    version: &'static str,
    total_samples: usize,
    repaired_samples: usize,
    invalid_samples: usize,
    samples: Vec<SampleReport>,
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), VyrCliError> {
    let data = read_input(input)?;
    let parsed = parse_samples(&data, input_format)?;

    let reports: Vec<SampleReport> = parsed
        .into_iter()
        .map(|(line, sample)| match sample.and_then(|raw| {
            raw.check_structure()?;
            Ok(validate_with_report(&raw))
        }) {
            Ok((sample, quality_flags)) => SampleReport {
                line,
                sample: Some(sample),
                quality_flags,
                error: None,
            },
            Err(e) => SampleReport {
                line,
                sample: None,
                quality_flags: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();

    let invalid = reports.iter().filter(|r| r.error.is_some()).count();

    if json {
        let report = ValidationReport {
            producer: PRODUCER_NAME,
            version: ENGINE_VERSION,
            total_samples: reports.len(),
            repaired_samples: reports.iter().filter(|r| !r.quality_flags.is_empty()).count(),
            invalid_samples: invalid,
            samples: reports,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for report in &reports {
            println!("{}", serde_json::to_string(report)?);
        }
    }

    if invalid > 0 {
        return Err(VyrCliError::ValidationFailed(invalid));
    }
    Ok(())
}

fn cmd_baseline(
    engine: &StateEngine,
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), VyrCliError> {
    let history = read_history(input, input_format)?;
    if history.is_empty() {
        tracing::warn!("empty history, emitting fallback baseline");
    }
    write_output(&engine.compute_baseline(&history), output_format)
}

enum BaselineSource {
    Fallback,
    History(PathBuf, InputFormat),
    File(PathBuf),
}

impl BaselineSource {
    fn from_args(history: Option<PathBuf>, baseline: Option<PathBuf>, format: InputFormat) -> Self {
        match (history, baseline) {
            (Some(path), _) => BaselineSource::History(path, format),
            (None, Some(path)) => BaselineSource::File(path),
            (None, None) => BaselineSource::Fallback,
        }
    }

    fn load(self, engine: &StateEngine) -> Result<PersonalBaseline, VyrCliError> {
        match self {
            BaselineSource::Fallback => Ok(engine.compute_baseline(&[])),
            BaselineSource::History(path, format) => {
                Ok(engine.compute_baseline(&read_history(&path, format)?))
            }
            BaselineSource::File(path) => Ok(PersonalBaseline::from_json(&fs::read_to_string(path)?)?),
        }
    }
}

fn cmd_state(
    engine: &StateEngine,
    input: &Path,
    baseline: BaselineSource,
    context: &ActionContext,
    detailed: bool,
    output_format: OutputFormat,
) -> Result<(), VyrCliError> {
    let sample = RawSample::from_json(read_input(input)?.trim())?;
    let baseline = baseline.load(engine)?;
    let state = engine.compute_state(&sample, &baseline, context)?;

    if detailed {
        let mut value = serde_json::to_value(&state)?;
        value["physiologicalContext"] = serde_json::to_value(physiological_context(&state.pillars))?;
        value["cognitiveWindow"] = serde_json::to_value(cognitive_window(state.vyr_score, &state.pillars))?;
        value["pillarDescriptions"] = serde_json::to_value(pillar_descriptions(&state.pillars))?;
        value["systemReading"] = serde_json::to_value(system_reading(&state))?;
        value["diagnosis"] = serde_json::Value::from(system_diagnosis(&state));
        value["todayMeaning"] = serde_json::to_value(today_meaning(&state))?;
        write_output(&value, output_format)
    } else {
        write_output(&state, output_format)
    }
}

fn cmd_patterns(
    engine: &StateEngine,
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), VyrCliError> {
    let user = uuid::Uuid::new_v4();
    let mut store = SampleStore::new();
    for sample in read_history(input, input_format)? {
        store.upsert(user, &sample)?;
    }
    write_output(&store.detect_patterns(engine, user)?, output_format)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum VyrCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    Line(usize, EngineError),
    ValidationFailed(usize),
    NoInput,
}

impl From<io::Error> for VyrCliError {
    fn from(e: io::Error) -> Self {
        VyrCliError::Io(e)
    }
}

impl From<EngineError> for VyrCliError {
    fn from(e: EngineError) -> Self {
        VyrCliError::Engine(e)
    }
}

impl From<serde_json::Error> for VyrCliError {
    fn from(e: serde_json::Error) -> Self {
        VyrCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VyrCliError> for CliError {
    fn from(e: VyrCliError) -> Self {
        match e {
            VyrCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VyrCliError::Engine(EngineError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check the file passed to --config".to_string()),
            },
            VyrCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the sample has a date and numeric fields".to_string()),
            },
            VyrCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VyrCliError::Line(line, e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: format!("line {}: {}", line, e),
                hint: Some("Run 'vyr validate' for details".to_string()),
            },
            VyrCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} sample(s) could not be parsed", count),
                hint: None,
            },
            VyrCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal and no input file was given".to_string(),
                hint: Some("Pipe a sample in or pass --input <file>".to_string()),
            },
        }
    }
}
