//! `impound run | validate | atx | sac`: build Animal and Impound tables.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use log::info;
use serde::Serialize;

use impound_recon::config::{ImpoundConfig, InputFiles, SourceKind};
use impound_recon::model::{Anomaly, ImpoundMeta, ImpoundSummary};
use impound_recon::{OutputFormat, ReconError};

use crate::exit_codes::{recon_exit_code, EXIT_ANOMALIES, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_OUTPUT, EXIT_USAGE};
use crate::CliError;

/// Output options shared by every command that runs the engine.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory for the output tables (overrides [output].dir)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table encoding (overrides [output].format)
    #[arg(long, short = 'f')]
    pub format: Option<Format>,

    /// Text written for unknown values in CSV output (overrides [output].na_rep)
    #[arg(long, value_name = "TEXT")]
    pub na_rep: Option<String>,

    /// Print a JSON report (meta, summary, anomalies, files) to stdout
    #[arg(long)]
    pub json: bool,

    /// Exit with code 3 when any anomaly is reported
    #[arg(long)]
    pub fail_on_anomaly: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Json,
    Factor,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
            Format::Factor => OutputFormat::Factor,
        }
    }
}

/// Sacramento extract shape; `auto` picks from the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SacShape {
    Auto,
    Open,
    Cpra,
}

impl From<SacShape> for SourceKind {
    fn from(shape: SacShape) -> Self {
        match shape {
            SacShape::Auto => SourceKind::Sac,
            SacShape::Open => SourceKind::SacOpen,
            SacShape::Cpra => SourceKind::SacCpra,
        }
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    meta: &'a ImpoundMeta,
    summary: &'a ImpoundSummary,
    anomalies: &'a [Anomaly],
    files: Vec<String>,
}

fn impound_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn recon_err(err: ReconError) -> CliError {
    let code = recon_exit_code(&err);
    let hint = match &err {
        ReconError::MissingColumn { .. } => {
            Some("map the header with a [columns] entry in the config".to_string())
        }
        ReconError::DateParse { .. } => {
            Some("add the layout to [parse].datetime_formats (chrono strftime syntax)".to_string())
        }
        ReconError::Csv { .. } => {
            Some("every row must have as many fields as the header".to_string())
        }
        ReconError::Io(_) => Some("input paths are resolved relative to the config file".to_string()),
        _ => None,
    };
    CliError { code, message: err.to_string(), hint }
}

fn read_config(config_path: &Path) -> Result<ImpoundConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        impound_err(EXIT_USAGE, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    ImpoundConfig::from_toml(&config_str)
        .map_err(|e| impound_err(EXIT_INVALID_CONFIG, format!("{}: {e}", config_path.display())))
}

// ============================================================================
// Commands
// ============================================================================

pub fn cmd_run(config_path: PathBuf, output: OutputArgs, quiet: bool) -> Result<(), CliError> {
    let config = read_config(&config_path)?;

    // Input paths and [output].dir are relative to the config file
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    execute(config, &base_dir, output, quiet)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let inputs = [
        config.inputs.intakes.as_deref(),
        config.inputs.outcomes.as_deref(),
        config.inputs.impounds.as_deref(),
    ];
    eprintln!(
        "valid: {} '{}' with {} input file(s), {} column override(s)",
        config.source,
        config.name,
        inputs.iter().flatten().count(),
        config.columns.len(),
    );
    Ok(())
}

pub fn cmd_atx(
    intakes: PathBuf,
    outcomes: PathBuf,
    name: Option<String>,
    output: OutputArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let config = ImpoundConfig::for_source(
        name.unwrap_or_else(|| "atx".to_string()),
        SourceKind::Atx,
        InputFiles {
            intakes: Some(intakes.to_string_lossy().into_owned()),
            outcomes: Some(outcomes.to_string_lossy().into_owned()),
            impounds: None,
        },
    );
    config.validate().map_err(recon_err)?;
    execute(config, Path::new("."), output, quiet)
}

pub fn cmd_sac(
    impounds: PathBuf,
    shape: SacShape,
    name: Option<String>,
    output: OutputArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let config = ImpoundConfig::for_source(
        name.unwrap_or_else(|| "sac".to_string()),
        shape.into(),
        InputFiles {
            impounds: Some(impounds.to_string_lossy().into_owned()),
            ..InputFiles::default()
        },
    );
    config.validate().map_err(recon_err)?;
    execute(config, Path::new("."), output, quiet)
}

// ============================================================================
// Shared run path
// ============================================================================

fn execute(config: ImpoundConfig, base_dir: &Path, output: OutputArgs, quiet: bool) -> Result<(), CliError> {
    let input = impound_recon::load_input(&config, |path| {
        impound_io::csv::read_file_as_utf8(&base_dir.join(path)).map_err(ReconError::Io)
    })
    .map_err(recon_err)?;

    let result = impound_recon::run(&config, input);

    let out_dir = match (&output.output_dir, &config.output.dir) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => base_dir.join(dir),
        (None, None) => PathBuf::from("."),
    };
    let format = output.format.map(OutputFormat::from).unwrap_or(config.output.format);
    let na_rep = output.na_rep.as_deref().unwrap_or(&config.output.na_rep);

    info!("writing {format} tables to {}", out_dir.display());
    let files = impound_io::write_tables(&out_dir, &result, format, na_rep)
        .map_err(|e| impound_err(EXIT_OUTPUT, format!("cannot write output: {e}")))?;

    if output.json {
        let report = RunReport {
            meta: &result.meta,
            summary: &result.summary,
            anomalies: &result.anomalies,
            files: files.iter().map(|p| p.display().to_string()).collect(),
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| impound_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    if !quiet {
        for path in &files {
            eprintln!("wrote {}", path.display());
        }
        let s = &result.summary;
        eprintln!(
            "{}: {} animals, {} impounds ({} complete, {} in custody, {} pre-window), {} anomalies",
            result.meta.config_name,
            s.individuals,
            s.impounds,
            s.complete,
            s.in_custody,
            s.pre_window,
            s.anomalies(),
        );
    }

    let anomalies = result.summary.anomalies();
    if output.fail_on_anomaly && anomalies > 0 {
        return Err(impound_err(EXIT_ANOMALIES, format!("{anomalies} anomalies found"))
            .with_hint("each anomaly is logged as a warning unless -q is given"));
    }

    Ok(())
}
