//! Columnar, category-encoded table export.
//!
//! Every text column becomes a factor: `levels` holds the sorted distinct known
//! values and `codes` the 1-based level of each row, `null` when unknown. The
//! unknown sentinel is never a level. Integer and timestamp columns are plain
//! arrays.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use impound_recon::tables::{Cell, TableRow};
use impound_recon::ImpoundResult;

use crate::csv::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorColumn {
    pub levels: Vec<String>,
    pub codes: Vec<Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Column {
    Factor(FactorColumn),
    Integer { values: Vec<Option<i64>> },
    Timestamp { values: Vec<Option<String>> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedColumn {
    pub name: &'static str,
    #[serde(flatten)]
    pub column: Column,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorTable {
    pub rows: usize,
    pub columns: Vec<NamedColumn>,
}

#[derive(Debug, Serialize)]
struct FactorDocument<'a> {
    config_name: &'a str,
    animals: FactorTable,
    impounds: FactorTable,
}

pub fn encode_factor(values: &[Option<&str>]) -> FactorColumn {
    let distinct: BTreeSet<&str> = values.iter().flatten().copied().collect();
    let levels: Vec<String> = distinct.into_iter().map(String::from).collect();

    let codes = values
        .iter()
        .map(|value| {
            value
                .and_then(|s| levels.binary_search_by(|level| level.as_str().cmp(s)).ok())
                .map(|i| i as u32 + 1)
        })
        .collect();

    FactorColumn { levels, codes }
}

/// Encode a table column by column. Column type follows the cells; a table
/// with no rows has nothing to inspect and encodes as empty factors.
pub fn encode_table<R: TableRow>(rows: &[R]) -> FactorTable {
    let grid: Vec<Vec<Cell<'_>>> = rows.iter().map(|r| r.cells()).collect();

    let columns = R::COLUMNS
        .iter()
        .enumerate()
        .map(|(j, &name)| {
            let cells: Vec<Cell<'_>> = grid.iter().filter_map(|row| row.get(j).copied()).collect();
            NamedColumn {
                name,
                column: encode_column(&cells),
            }
        })
        .collect();

    FactorTable {
        rows: rows.len(),
        columns,
    }
}

fn encode_column(cells: &[Cell<'_>]) -> Column {
    match cells.first() {
        Some(Cell::Integer(_)) => Column::Integer {
            values: cells
                .iter()
                .map(|c| match c {
                    Cell::Integer(v) => *v,
                    _ => None,
                })
                .collect(),
        },
        Some(Cell::Timestamp(_)) => Column::Timestamp {
            values: cells
                .iter()
                .map(|c| match c {
                    Cell::Timestamp(v) => v.map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()),
                    _ => None,
                })
                .collect(),
        },
        Some(Cell::Text(_)) | None => {
            let values: Vec<Option<&str>> = cells
                .iter()
                .map(|c| match c {
                    Cell::Text(v) => *v,
                    _ => None,
                })
                .collect();
            Column::Factor(encode_factor(&values))
        }
    }
}

pub fn export(result: &ImpoundResult, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let writer = BufWriter::new(file);

    let document = FactorDocument {
        config_name: &result.meta.config_name,
        animals: encode_table(&result.tables.animals),
        impounds: encode_table(&result.tables.impounds),
    };
    serde_json::to_writer_pretty(writer, &document).map_err(|e| e.to_string())?;

    Ok(())
}
