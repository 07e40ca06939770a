use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (missing input file, bad column override, etc.).
    ConfigValidation(String),
    /// Required column absent from an input header.
    MissingColumn { input: String, column: String },
    /// Identity key or identity timestamp is unknown on a row.
    MissingValue { input: String, line: u64, column: String },
    /// Timestamp that matches none of the configured formats.
    DateParse { input: String, line: u64, column: String, value: String },
    /// Non-integer value in an integer column.
    IntegerParse { input: String, line: u64, column: String, value: String },
    /// Malformed CSV record, e.g. a row with the wrong number of fields.
    Csv { input: String, line: u64, message: String },
    /// Input could not be read.
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { input, column } => {
                write!(f, "{input}: missing column '{column}'")
            }
            Self::MissingValue { input, line, column } => {
                write!(f, "{input}, line {line}: '{column}' is required but missing")
            }
            Self::DateParse { input, line, column, value } => {
                write!(f, "{input}, line {line}: cannot parse {column} '{value}'")
            }
            Self::IntegerParse { input, line, column, value } => {
                write!(f, "{input}, line {line}: {column} '{value}' is not an integer")
            }
            Self::Csv { input, line, message } => write!(f, "{input}, line {line}: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl ReconError {
    /// Attach the input name and line to a CSV reader error.
    pub fn csv(input: &str, err: &csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = match err.kind() {
            csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
                format!("row has {len} fields, header has {expected_len}")
            }
            csv::ErrorKind::Utf8 { err: utf8, .. } => format!("invalid UTF-8: {utf8}"),
            _ => err.to_string(),
        };
        Self::Csv {
            input: input.into(),
            line,
            message,
        }
    }
}
