//! Input adapters: CSV rows of each supported shape into [`SourceRow`]s.
//!
//! Columns a shape does not carry, and cells equal to one of the configured
//! NA tokens, come through as unknown (`None`). Timestamp and integer cells
//! that are empty are unknown as well.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use log::debug;

use crate::config::{ImpoundConfig, SourceKind};
use crate::error::ReconError;
use crate::model::{Age, Attributes, IntakeEvent, OutcomeEvent, SourceRow};

/// Canonical column names.
pub mod col {
    pub const REC_SOURCE: &str = "rec_source";
    pub const ANIMAL_ID: &str = "animal_id";
    pub const KIND: &str = "kind";
    pub const GENDER: &str = "gender";
    pub const NAME: &str = "name";
    pub const COLOR_1: &str = "color_1";
    pub const COLOR_2: &str = "color_2";
    pub const BREED_1: &str = "breed_1";
    pub const BREED_2: &str = "breed_2";
    pub const KENNEL: &str = "kennel";
    pub const SPAY_NEUTER: &str = "spay_neuter";
    pub const INTAKE_DATE: &str = "intake_date";
    pub const INTAKE_TYPE: &str = "intake_type";
    pub const INTAKE_SUBTYPE: &str = "intake_subtype";
    pub const INTAKE_CONDITION: &str = "intake_condition";
    pub const INTAKE_LOCATION: &str = "intake_location";
    pub const INTAKE_AGE_COUNT: &str = "intake_age_count";
    pub const INTAKE_AGE_UNITS: &str = "intake_age_units";
    pub const INTAKE_AGE: &str = "intake_age";
    pub const INTAKE_SPAY_NEUTER: &str = "intake_spay_neuter";
    pub const OUTCOME_DATE: &str = "outcome_date";
    pub const OUTCOME_TYPE: &str = "outcome_type";
    pub const OUTCOME_SUBTYPE: &str = "outcome_subtype";
    pub const OUTCOME_CONDITION: &str = "outcome_condition";
    pub const OUTCOME_SPAY_NEUTER: &str = "outcome_spay_neuter";

    pub const ALL: &[&str] = &[
        REC_SOURCE, ANIMAL_ID, KIND, GENDER, NAME, COLOR_1, COLOR_2, BREED_1, BREED_2, KENNEL,
        SPAY_NEUTER, INTAKE_DATE, INTAKE_TYPE, INTAKE_SUBTYPE, INTAKE_CONDITION, INTAKE_LOCATION,
        INTAKE_AGE_COUNT, INTAKE_AGE_UNITS, INTAKE_AGE, INTAKE_SPAY_NEUTER, OUTCOME_DATE,
        OUTCOME_TYPE, OUTCOME_SUBTYPE, OUTCOME_CONDITION, OUTCOME_SPAY_NEUTER,
    ];
}

const ANIMAL_COLUMNS: &[&str] = &[
    col::ANIMAL_ID,
    col::KIND,
    col::GENDER,
    col::NAME,
    col::COLOR_1,
    col::COLOR_2,
    col::BREED_1,
    col::BREED_2,
];

const ATX_INTAKE_COLUMNS: &[&str] = &[
    col::INTAKE_DATE,
    col::INTAKE_TYPE,
    col::INTAKE_CONDITION,
    col::INTAKE_LOCATION,
    col::INTAKE_AGE_COUNT,
    col::INTAKE_AGE_UNITS,
    col::INTAKE_AGE,
    col::INTAKE_SPAY_NEUTER,
];

const ATX_OUTCOME_COLUMNS: &[&str] = &[
    col::OUTCOME_DATE,
    col::OUTCOME_TYPE,
    col::OUTCOME_SUBTYPE,
    col::OUTCOME_SPAY_NEUTER,
];

const SAC_OPEN_COLUMNS: &[&str] = &[
    col::ANIMAL_ID,
    col::KIND,
    col::NAME,
    col::INTAKE_DATE,
    col::INTAKE_TYPE,
    col::INTAKE_LOCATION,
    col::OUTCOME_DATE,
    col::OUTCOME_TYPE,
];

const SAC_CPRA_COLUMNS: &[&str] = &[
    col::ANIMAL_ID,
    col::KIND,
    col::NAME,
    col::GENDER,
    col::COLOR_1,
    col::COLOR_2,
    col::BREED_1,
    col::BREED_2,
    col::KENNEL,
    col::SPAY_NEUTER,
    col::INTAKE_DATE,
    col::INTAKE_TYPE,
    col::INTAKE_SUBTYPE,
    col::INTAKE_CONDITION,
    col::INTAKE_LOCATION,
    col::OUTCOME_DATE,
    col::OUTCOME_TYPE,
    col::OUTCOME_SUBTYPE,
    col::OUTCOME_CONDITION,
];

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Austin intake file: one intake per row, animal observed at intake time.
pub fn load_atx_intakes(csv_data: &str, config: &ImpoundConfig) -> Result<Vec<SourceRow>, ReconError> {
    let columns: Vec<&str> = ANIMAL_COLUMNS.iter().chain(ATX_INTAKE_COLUMNS).copied().collect();
    read_rows("intakes", csv_data, config, &columns, |layout, record| {
        let timestamp = layout.required_timestamp(record, col::INTAKE_DATE)?;
        let intake = IntakeEvent {
            intake_type: layout.text(record, col::INTAKE_TYPE),
            condition: layout.text(record, col::INTAKE_CONDITION),
            location: layout.text(record, col::INTAKE_LOCATION),
            age: layout.age(record)?,
            spay_neuter: layout.text(record, col::INTAKE_SPAY_NEUTER),
            ..IntakeEvent::at(timestamp)
        };
        Ok(SourceRow {
            animal_id: layout.required_text(record, col::ANIMAL_ID)?,
            timestamp,
            attributes: layout.attributes(record),
            intake: Some(intake),
            outcome: None,
        })
    })
}

/// Austin outcome file: one outcome per row, animal observed at outcome time.
pub fn load_atx_outcomes(csv_data: &str, config: &ImpoundConfig) -> Result<Vec<SourceRow>, ReconError> {
    let columns: Vec<&str> = ANIMAL_COLUMNS.iter().chain(ATX_OUTCOME_COLUMNS).copied().collect();
    read_rows("outcomes", csv_data, config, &columns, |layout, record| {
        let timestamp = layout.required_timestamp(record, col::OUTCOME_DATE)?;
        let outcome = OutcomeEvent {
            outcome_type: layout.text(record, col::OUTCOME_TYPE),
            outcome_subtype: layout.text(record, col::OUTCOME_SUBTYPE),
            spay_neuter: layout.text(record, col::OUTCOME_SPAY_NEUTER),
            ..OutcomeEvent::at(timestamp)
        };
        Ok(SourceRow {
            animal_id: layout.required_text(record, col::ANIMAL_ID)?,
            timestamp,
            attributes: layout.attributes(record),
            intake: None,
            outcome: Some(outcome),
        })
    })
}

/// Sacramento impound file: one intake per row plus its outcome when the row
/// has an outcome date. The shape comes from `config.source`; for
/// [`SourceKind::Sac`] it is detected from the header.
pub fn load_sac_impounds(csv_data: &str, config: &ImpoundConfig) -> Result<Vec<SourceRow>, ReconError> {
    let shape = match config.source {
        SourceKind::Sac => {
            let mut reader = csv_reader(csv_data);
            let headers = reader.headers().map_err(|e| ReconError::csv("impounds", &e))?;
            detect_sac_shape(headers, config)
        }
        other => other,
    };
    debug!("reading impounds as {shape}");

    let columns = match shape {
        SourceKind::SacCpra => SAC_CPRA_COLUMNS,
        SourceKind::SacOpen => SAC_OPEN_COLUMNS,
        SourceKind::Atx | SourceKind::Sac => {
            return Err(ReconError::ConfigValidation(format!(
                "source '{}' has no impound file shape",
                config.source
            )))
        }
    };

    read_rows("impounds", csv_data, config, columns, |layout, record| {
        let timestamp = layout.required_timestamp(record, col::INTAKE_DATE)?;
        let intake = IntakeEvent {
            intake_type: layout.text(record, col::INTAKE_TYPE),
            intake_subtype: layout.text(record, col::INTAKE_SUBTYPE),
            condition: layout.text(record, col::INTAKE_CONDITION),
            location: layout.text(record, col::INTAKE_LOCATION),
            spay_neuter: layout.text(record, col::SPAY_NEUTER),
            kennel: layout.text(record, col::KENNEL),
            ..IntakeEvent::at(timestamp)
        };
        let outcome = layout
            .timestamp(record, col::OUTCOME_DATE)?
            .map(|outcome_date| OutcomeEvent {
                outcome_type: layout.text(record, col::OUTCOME_TYPE),
                outcome_subtype: layout.text(record, col::OUTCOME_SUBTYPE),
                condition: layout.text(record, col::OUTCOME_CONDITION),
                ..OutcomeEvent::at(outcome_date)
            });
        Ok(SourceRow {
            animal_id: layout.required_text(record, col::ANIMAL_ID)?,
            timestamp,
            attributes: layout.attributes(record),
            intake: Some(intake),
            outcome,
        })
    })
}

/// CPRA extracts carry a record-source column; open-data extracts do not.
pub fn detect_sac_shape(headers: &StringRecord, config: &ImpoundConfig) -> SourceKind {
    let rec_source = config.column(col::REC_SOURCE);
    if headers.iter().any(|h| clean_header(h) == rec_source) {
        SourceKind::SacCpra
    } else {
        SourceKind::SacOpen
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Parse with the first matching format. A date-only match is midnight.
pub fn parse_timestamp(value: &str, formats: &[String]) -> Option<NaiveDateTime> {
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format).ok().or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
    })
}

/// Age in seconds from a count and a unit such as `days`, `mo` or `Year`.
/// Months are 30 days and years 365.
pub fn age_in_seconds(count: i32, units: &str) -> Option<i64> {
    const DAY: i64 = 86_400;
    let unit = units.trim().to_ascii_lowercase();
    let unit = unit.strip_suffix('s').unwrap_or(&unit);
    let per_unit = match unit {
        "day" | "dy" | "d" => DAY,
        "week" | "wk" | "w" => 7 * DAY,
        "month" | "mo" | "m" => 30 * DAY,
        "year" | "yr" | "y" => 365 * DAY,
        _ => return None,
    };
    Some(i64::from(count) * per_unit)
}

// ---------------------------------------------------------------------------
// Row reading
// ---------------------------------------------------------------------------

fn csv_reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes())
}

fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

fn read_rows<F>(
    input: &str,
    csv_data: &str,
    config: &ImpoundConfig,
    columns: &[&'static str],
    mut build: F,
) -> Result<Vec<SourceRow>, ReconError>
where
    F: FnMut(&Layout<'_>, &StringRecord) -> Result<SourceRow, ReconError>,
{
    let mut reader = csv_reader(csv_data);
    let headers = reader.headers().map_err(|e| ReconError::csv(input, &e))?;
    let layout = Layout::bind(input, config, headers, columns)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::csv(input, &e))?;
        rows.push(build(&layout, &record)?);
    }

    debug!("{input}: {} rows", rows.len());
    Ok(rows)
}

/// Column positions of one input file, resolved once from its header.
struct Layout<'a> {
    input: &'a str,
    config: &'a ImpoundConfig,
    index: HashMap<&'static str, usize>,
}

impl<'a> Layout<'a> {
    fn bind(
        input: &'a str,
        config: &'a ImpoundConfig,
        headers: &StringRecord,
        columns: &[&'static str],
    ) -> Result<Self, ReconError> {
        let mut index = HashMap::with_capacity(columns.len());
        for &canonical in columns {
            let header = config.column(canonical);
            let pos = headers
                .iter()
                .position(|h| clean_header(h) == header)
                .ok_or_else(|| ReconError::MissingColumn {
                    input: input.into(),
                    column: header.into(),
                })?;
            index.insert(canonical, pos);
        }
        Ok(Self { input, config, index })
    }

    fn line(record: &StringRecord) -> u64 {
        record.position().map(|p| p.line()).unwrap_or(0)
    }

    fn raw<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index.get(column).and_then(|&i| record.get(i))
    }

    fn text(&self, record: &StringRecord, column: &str) -> Option<String> {
        let value = self.raw(record, column)?;
        let trimmed = value.trim();
        if self.config.parse.na_values.iter().any(|na| na == trimmed) {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Known, non-blank value for a typed column.
    fn typed(&self, record: &StringRecord, column: &str) -> Option<String> {
        self.text(record, column)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required_text(&self, record: &StringRecord, column: &str) -> Result<String, ReconError> {
        self.text(record, column)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| self.missing(record, column))
    }

    fn timestamp(&self, record: &StringRecord, column: &str) -> Result<Option<NaiveDateTime>, ReconError> {
        let Some(value) = self.typed(record, column) else {
            return Ok(None);
        };
        parse_timestamp(&value, &self.config.parse.datetime_formats)
            .map(Some)
            .ok_or_else(|| ReconError::DateParse {
                input: self.input.into(),
                line: Self::line(record),
                column: self.config.column(column).into(),
                value,
            })
    }

    fn required_timestamp(&self, record: &StringRecord, column: &str) -> Result<NaiveDateTime, ReconError> {
        self.timestamp(record, column)?
            .ok_or_else(|| self.missing(record, column))
    }

    fn integer(&self, record: &StringRecord, column: &str) -> Result<Option<i64>, ReconError> {
        let Some(value) = self.typed(record, column) else {
            return Ok(None);
        };
        value.parse::<i64>().map(Some).map_err(|_| ReconError::IntegerParse {
            input: self.input.into(),
            line: Self::line(record),
            column: self.config.column(column).into(),
            value,
        })
    }

    fn missing(&self, record: &StringRecord, column: &str) -> ReconError {
        ReconError::MissingValue {
            input: self.input.into(),
            line: Self::line(record),
            column: self.config.column(column).into(),
        }
    }

    fn attributes(&self, record: &StringRecord) -> Attributes {
        Attributes {
            kind: self.text(record, col::KIND),
            sex: self.text(record, col::GENDER),
            name: self.text(record, col::NAME),
            color1: self.text(record, col::COLOR_1),
            color2: self.text(record, col::COLOR_2),
            breed1: self.text(record, col::BREED_1),
            breed2: self.text(record, col::BREED_2),
        }
    }

    fn age(&self, record: &StringRecord) -> Result<Age, ReconError> {
        let count = match self.integer(record, col::INTAKE_AGE_COUNT)? {
            Some(n) => Some(i32::try_from(n).map_err(|_| ReconError::IntegerParse {
                input: self.input.into(),
                line: Self::line(record),
                column: self.config.column(col::INTAKE_AGE_COUNT).into(),
                value: n.to_string(),
            })?),
            None => None,
        };
        let units = self.text(record, col::INTAKE_AGE_UNITS);
        let seconds = match self.integer(record, col::INTAKE_AGE)? {
            Some(total) => Some(total),
            None => count.zip(units.as_deref()).and_then(|(c, u)| age_in_seconds(c, u)),
        };
        Ok(Age { count, units, seconds })
    }
}
