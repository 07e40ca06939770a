//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Domain    | Description                                   |
//! |------|-----------|-----------------------------------------------|
//! | 0    | Universal | Success                                       |
//! | 1    | Universal | General error (unspecified)                   |
//! | 2    | Universal | CLI usage error (bad args, unreadable file)   |
//! | 3    | impound   | Anomalies found and `--fail-on-anomaly` set   |
//! | 4    | impound   | Invalid config                                |
//! | 5    | impound   | Input parse error                             |
//! | 6    | impound   | Output write error                            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use impound_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Impound (3-9)
// =============================================================================

/// Run completed but produced anomalies, and `--fail-on-anomaly` was given.
/// Output tables are still written.
pub const EXIT_ANOMALIES: u8 = 3;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// An input row violated an adapter precondition (malformed CSV record,
/// missing column, missing identity, unparseable timestamp or integer).
pub const EXIT_INPUT_PARSE: u8 = 5;

/// Output tables could not be written.
pub const EXIT_OUTPUT: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Csv { .. }
        | ReconError::MissingColumn { .. }
        | ReconError::MissingValue { .. }
        | ReconError::DateParse { .. }
        | ReconError::IntegerParse { .. } => EXIT_INPUT_PARSE,
        ReconError::Io(_) => EXIT_USAGE,
    }
}
