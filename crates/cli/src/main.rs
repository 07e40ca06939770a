// Impound CLI - shelter intake/outcome reconciliation

mod exit_codes;
mod impound;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;
use impound::{OutputArgs, SacShape};

#[derive(Parser)]
#[command(name = "impound")]
#[command(about = "Reconcile animal shelter intakes and outcomes into Animal and Impound tables")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors and skip the summary lines on stderr
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run from a TOML config file
    #[command(after_help = "\
Examples:
  impound run austin.impound.toml
  impound run austin.impound.toml --format factor -o out/
  impound run sacramento.impound.toml --json --fail-on-anomaly")]
    Run {
        /// Path to the .impound.toml config file
        config: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  impound validate austin.impound.toml")]
    Validate {
        /// Path to the .impound.toml config file
        config: PathBuf,
    },

    /// Austin: separate intake and outcome files
    #[command(after_help = "\
Examples:
  impound atx --intakes Austin_Intakes.csv --outcomes Austin_Outcomes.csv -o out/
  impound atx --intakes in.csv --outcomes out.csv --format json")]
    Atx {
        /// Intake CSV
        #[arg(long)]
        intakes: PathBuf,

        /// Outcome CSV
        #[arg(long)]
        outcomes: PathBuf,

        /// Name recorded in the run metadata
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Sacramento: one combined impound file
    #[command(after_help = "\
Examples:
  impound sac --impounds Sacramento_Animal_Intake.csv -o out/
  impound sac --impounds cpra_extract.csv --shape cpra --format factor")]
    Sac {
        /// Impound CSV
        #[arg(long)]
        impounds: PathBuf,

        /// Column layout of the file
        #[arg(long, value_enum, default_value = "auto")]
        shape: SacShape,

        /// Name recorded in the run metadata
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run { config, output } => impound::cmd_run(config, output, cli.quiet),
        Commands::Validate { config } => impound::cmd_validate(config),
        Commands::Atx { intakes, outcomes, name, output } => {
            impound::cmd_atx(intakes, outcomes, name, output, cli.quiet)
        }
        Commands::Sac { impounds, shape, name, output } => {
            impound::cmd_sac(impounds, shape, name, output, cli.quiet)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
