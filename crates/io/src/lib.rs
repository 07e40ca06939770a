// File I/O: input decoding and output table writers

pub mod csv;
pub mod factor;
pub mod json;

use std::path::{Path, PathBuf};

use impound_recon::{ImpoundResult, OutputFormat};

pub const ANIMALS_CSV: &str = "animals.csv";
pub const IMPOUNDS_CSV: &str = "impounds.csv";
pub const TABLES_JSON: &str = "impound_tables.json";
pub const FACTORS_JSON: &str = "impound_factors.json";

/// Write the run's tables into `dir` (created if missing) in `format`.
/// Returns the paths written, in write order.
pub fn write_tables(
    dir: &Path,
    result: &ImpoundResult,
    format: OutputFormat,
    na_rep: &str,
) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("{}: {e}", dir.display()))?;

    let written = match format {
        OutputFormat::Csv => {
            let animals = dir.join(ANIMALS_CSV);
            let impounds = dir.join(IMPOUNDS_CSV);
            csv::export(&result.tables.animals, &animals, na_rep)?;
            csv::export(&result.tables.impounds, &impounds, na_rep)?;
            vec![animals, impounds]
        }
        OutputFormat::Json => {
            let path = dir.join(TABLES_JSON);
            json::export(result, &path)?;
            vec![path]
        }
        OutputFormat::Factor => {
            let path = dir.join(FACTORS_JSON);
            factor::export(result, &path)?;
            vec![path]
        }
    };

    Ok(written)
}
