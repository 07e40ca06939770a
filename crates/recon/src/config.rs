use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::source::col;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ImpoundConfig {
    pub name: String,
    pub source: SourceKind,
    pub inputs: InputFiles,
    #[serde(default)]
    pub parse: ParseConfig,
    /// Canonical column name -> header in the input files.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Which row shape(s) the input files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Separate intake and outcome files.
    Atx,
    /// Combined impound file; open-data or CPRA shape picked from the header.
    Sac,
    /// Combined impound file, open-data columns.
    SacOpen,
    /// Combined impound file, CPRA columns.
    SacCpra,
}

impl SourceKind {
    pub fn is_combined(&self) -> bool {
        !matches!(self, Self::Atx)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atx => write!(f, "atx"),
            Self::Sac => write!(f, "sac"),
            Self::SacOpen => write!(f, "sac_open"),
            Self::SacCpra => write!(f, "sac_cpra"),
        }
    }
}

/// Input paths, relative to the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputFiles {
    #[serde(default)]
    pub intakes: Option<String>,
    #[serde(default)]
    pub outcomes: Option<String>,
    #[serde(default)]
    pub impounds: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ParseConfig {
    /// Cell values read as "not supplied".
    #[serde(default = "default_na_values")]
    pub na_values: Vec<String>,
    /// chrono formats tried in order. Date-only formats parse as midnight.
    #[serde(default = "default_datetime_formats")]
    pub datetime_formats: Vec<String>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            na_values: default_na_values(),
            datetime_formats: default_datetime_formats(),
        }
    }
}

fn default_na_values() -> Vec<String> {
    vec!["NA".into()]
}

fn default_datetime_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %H:%M",
        "%Y-%m-%d",
        "%m/%d/%Y",
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

// ---------------------------------------------------------------------------
// Output + Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Factor,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Factor => write!(f, "factor"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
    /// How the unknown sentinel is written in CSV output.
    #[serde(default = "default_na_rep")]
    pub na_rep: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: OutputFormat::default(),
            na_rep: default_na_rep(),
        }
    }
}

fn default_na_rep() -> String {
    "NA".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Pair animals in parallel once the registry holds this many.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

fn default_parallel_threshold() -> usize {
    4096
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ImpoundConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ImpoundConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with default parse/output/engine settings, for runs driven by
    /// command-line flags instead of a file.
    pub fn for_source(name: impl Into<String>, source: SourceKind, inputs: InputFiles) -> Self {
        Self {
            name: name.into(),
            source,
            inputs,
            parse: ParseConfig::default(),
            columns: BTreeMap::new(),
            output: OutputConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        match self.source {
            SourceKind::Atx => {
                if self.inputs.intakes.is_none() || self.inputs.outcomes.is_none() {
                    return Err(ReconError::ConfigValidation(
                        "source 'atx' requires inputs.intakes and inputs.outcomes".into(),
                    ));
                }
                if self.inputs.impounds.is_some() {
                    return Err(ReconError::ConfigValidation(
                        "source 'atx' does not read inputs.impounds".into(),
                    ));
                }
            }
            kind => {
                if self.inputs.impounds.is_none() {
                    return Err(ReconError::ConfigValidation(format!(
                        "source '{kind}' requires inputs.impounds"
                    )));
                }
                if self.inputs.intakes.is_some() || self.inputs.outcomes.is_some() {
                    return Err(ReconError::ConfigValidation(format!(
                        "source '{kind}' reads a single impounds file, not intakes/outcomes"
                    )));
                }
            }
        }

        if self.parse.datetime_formats.is_empty() {
            return Err(ReconError::ConfigValidation(
                "parse.datetime_formats must list at least one format".into(),
            ));
        }

        for name in self.columns.keys() {
            if !col::ALL.contains(&name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "columns: unknown column '{name}'"
                )));
            }
        }

        Ok(())
    }

    /// Header name for a canonical column, honouring `[columns]` overrides.
    pub fn column<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.columns
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
