//! emrcalc CLI
//!
//! Command-line harness for running patient calculations over a dataset file.
//!
//! ## Usage
//!
//! ```bash
//! # Evaluate every patient in a dataset
//! emrcalc evaluate --data patients.yaml
//!
//! # Selected patients, reproducible, JSON output
//! emrcalc evaluate --data patients.yaml --cohort 1,4,7 \
//!     --evaluated-at 2021-01-01T00:00:00Z --format json
//!
//! # Show the concept vocabulary in effect
//! emrcalc dictionary show --config emrcalc.yaml
//!
//! # Validate a dataset
//! emrcalc dataset validate patients.yaml
//! ```
//!
//! ## Exit Codes
//!
//! - 0: Success
//! - 3: Error

mod config;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use emrcalc_core::{
    CalculationContext, CalculationResultMap, Cohort, InMemoryPatientData, PatientCalculation,
    PatientId, PregnantAtArtStartCalculation,
};

use config::RunConfig;

/// emrcalc: patient calculations over clinical data
#[derive(Parser)]
#[command(name = "emrcalc")]
#[command(version)]
#[command(about = "Evaluate patient calculations over a clinical dataset", long_about = None)]
struct Cli {
    /// Path to a configuration file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate whether patients were pregnant when they started ART
    Evaluate {
        /// Path to the patient dataset (YAML or JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Comma-separated patient ids (defaults to every patient in the dataset)
        #[arg(long, value_delimiter = ',')]
        cohort: Vec<u32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Explicit timestamp for deterministic evaluation (ISO 8601 / RFC 3339).
        /// Example: --evaluated-at 2021-01-01T00:00:00Z
        #[arg(long, value_parser = parse_datetime)]
        evaluated_at: Option<DateTime<Utc>>,
    },

    /// Concept dictionary commands
    Dictionary {
        #[command(subcommand)]
        action: DictionaryAction,
    },

    /// Dataset commands
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },
}

#[derive(Subcommand)]
enum DictionaryAction {
    /// Show the concepts in effect
    Show,
}

#[derive(Subcommand)]
enum DatasetAction {
    /// Validate a dataset file
    Validate {
        /// Path to the dataset file
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Parse ISO 8601 / RFC 3339 datetime string to DateTime<Utc>.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid datetime format: {}. Expected ISO 8601/RFC 3339 (e.g., 2021-01-01T00:00:00Z)", e))
}

fn main() -> ExitCode {
    match run() {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => RunConfig::default(),
    };

    init_tracing(&config.log_level);

    match cli.command {
        Commands::Evaluate {
            data,
            cohort,
            format,
            evaluated_at,
        } => evaluate_command(&config, data, cohort, format, evaluated_at),

        Commands::Dictionary { action } => match action {
            DictionaryAction::Show => show_dictionary(&config),
        },

        Commands::Dataset { action } => match action {
            DatasetAction::Validate { path } => validate_dataset(path),
        },
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default().add_directive(tracing::Level::WARN.into())
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_dataset(path: &Path) -> Result<InMemoryPatientData> {
    if path.extension().map(|e| e == "json").unwrap_or(false) {
        InMemoryPatientData::from_json_file(path)
    } else {
        InMemoryPatientData::from_yaml_file(path)
    }
    .with_context(|| format!("Failed to load dataset from {:?}", path))
}

/// Cohort from explicit ids, or every patient in the dataset.
fn resolve_cohort(ids: &[u32], data: &InMemoryPatientData) -> Cohort {
    if ids.is_empty() {
        data.patients()
    } else {
        ids.iter().copied().map(PatientId::from).collect()
    }
}

fn evaluate_command(
    config: &RunConfig,
    data_path: PathBuf,
    cohort_ids: Vec<u32>,
    format: OutputFormat,
    evaluated_at: Option<DateTime<Utc>>,
) -> Result<ExitCode> {
    let data = load_dataset(&data_path)?;
    let cohort = resolve_cohort(&cohort_ids, &data);

    // Flag wins over config; otherwise evaluate as of now
    let context = match evaluated_at.or(config.determinism.evaluated_at) {
        Some(timestamp) => CalculationContext::at(timestamp),
        None => CalculationContext::now(),
    };

    let calculation = PregnantAtArtStartCalculation::new(&config.dictionary, &data, &data);
    tracing::info!(
        calculation = calculation.name(),
        cohort_size = cohort.len(),
        evaluated_at = %context.now,
        "Evaluating"
    );

    let results = calculation
        .evaluate(&cohort, &context)
        .context("Evaluation failed")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&results)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!("{}", calculation.description());
            println!();
            print_text_results(&results);
        }
    }

    Ok(ExitCode::from(0))
}

fn print_text_results(results: &CalculationResultMap) {
    for (patient, result) in results {
        let status = if result.value {
            "PREGNANT"
        } else {
            "NOT PREGNANT"
        };
        println!("{}: {}", patient, status);
    }

    let pregnant = results.values().filter(|r| r.value).count();
    println!();
    println!("{} of {} patients pregnant at ART start", pregnant, results.len());
}

fn show_dictionary(config: &RunConfig) -> Result<ExitCode> {
    if config.dictionary.concepts.is_empty() {
        println!("Dictionary is empty");
        return Ok(ExitCode::from(0));
    }

    println!("Concepts:");
    for (name, concept) in &config.dictionary.concepts {
        println!("  {}: {}", name, concept);
    }

    Ok(ExitCode::from(0))
}

fn validate_dataset(path: PathBuf) -> Result<ExitCode> {
    let data = load_dataset(&path)?;

    println!("Dataset is valid: {:?}", path);
    println!();
    println!("Patients: {}", data.patients().len());
    println!("With ART start date: {}", data.art_start_count());
    println!("Observations: {}", data.observation_count());

    Ok(ExitCode::from(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime() {
        let parsed = parse_datetime("2021-01-01T03:00:00+03:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2021-01-01T00:00:00+00:00");
        assert!(parse_datetime("2021-01-01").is_err());
    }

    #[test]
    fn test_resolve_cohort_defaults_to_dataset() {
        let data = InMemoryPatientData::new()
            .with_patient(PatientId(4))
            .with_patient(PatientId(2));

        let all = resolve_cohort(&[], &data);
        assert_eq!(all.len(), 2);

        let some = resolve_cohort(&[9, 2, 9], &data);
        let expected: Cohort = [PatientId(2), PatientId(9)].into_iter().collect();
        assert_eq!(some, expected);
    }

    #[test]
    fn test_cli_parses_cohort_list() {
        let cli = Cli::try_parse_from([
            "emrcalc",
            "evaluate",
            "--data",
            "patients.yaml",
            "--cohort",
            "1,2,3",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Evaluate { cohort, format, .. } => {
                assert_eq!(cohort, vec![1, 2, 3]);
                assert!(matches!(format, OutputFormat::Json));
            }
            _ => panic!("expected evaluate command"),
        }
    }
}
