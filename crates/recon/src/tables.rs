use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{ImpoundRecord, Individual};
use crate::pairing::Pairing;
use crate::registry::Registry;

/// A single cell as seen by table encoders. `None` is the unknown sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Text(Option<&'a str>),
    Integer(Option<i64>),
    Timestamp(Option<NaiveDateTime>),
}

/// Fixed-schema output row.
pub trait TableRow {
    /// Column names in output order.
    const COLUMNS: &'static [&'static str];

    /// One cell per entry of [`TableRow::COLUMNS`], same order.
    fn cells(&self) -> Vec<Cell<'_>>;
}

// ---------------------------------------------------------------------------
// Animal table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimalRow {
    pub animal_id: String,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub color_1: Option<String>,
    pub color_2: Option<String>,
    pub breed_1: Option<String>,
    pub breed_2: Option<String>,
}

impl From<&Individual> for AnimalRow {
    fn from(animal: &Individual) -> Self {
        let a = &animal.attributes;
        Self {
            animal_id: animal.animal_id.clone(),
            kind: a.kind.clone(),
            name: a.name.clone(),
            gender: a.sex.clone(),
            color_1: a.color1.clone(),
            color_2: a.color2.clone(),
            breed_1: a.breed1.clone(),
            breed_2: a.breed2.clone(),
        }
    }
}

impl TableRow for AnimalRow {
    const COLUMNS: &'static [&'static str] = &[
        "animal_id", "kind", "name", "gender", "color_1", "color_2", "breed_1", "breed_2",
    ];

    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(Some(&self.animal_id)),
            Cell::Text(self.kind.as_deref()),
            Cell::Text(self.name.as_deref()),
            Cell::Text(self.gender.as_deref()),
            Cell::Text(self.color_1.as_deref()),
            Cell::Text(self.color_2.as_deref()),
            Cell::Text(self.breed_1.as_deref()),
            Cell::Text(self.breed_2.as_deref()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Impound table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpoundRow {
    pub animal_id: String,
    pub intake_date: Option<NaiveDateTime>,
    pub intake_type: Option<String>,
    pub intake_subtype: Option<String>,
    pub intake_condition: Option<String>,
    pub intake_location: Option<String>,
    pub intake_age_count: Option<i32>,
    pub intake_age_units: Option<String>,
    pub intake_age: Option<i64>,
    pub intake_spay_neuter: Option<String>,
    pub kennel: Option<String>,
    pub outcome_date: Option<NaiveDateTime>,
    pub outcome_type: Option<String>,
    pub outcome_subtype: Option<String>,
    pub outcome_condition: Option<String>,
    pub outcome_spay_neuter: Option<String>,
}

impl From<&ImpoundRecord> for ImpoundRow {
    fn from(record: &ImpoundRecord) -> Self {
        let intake = record.intake();
        let outcome = record.outcome();
        Self {
            animal_id: record.animal_id.clone(),
            intake_date: intake.map(|i| i.timestamp),
            intake_type: intake.and_then(|i| i.intake_type.clone()),
            intake_subtype: intake.and_then(|i| i.intake_subtype.clone()),
            intake_condition: intake.and_then(|i| i.condition.clone()),
            intake_location: intake.and_then(|i| i.location.clone()),
            intake_age_count: intake.and_then(|i| i.age.count),
            intake_age_units: intake.and_then(|i| i.age.units.clone()),
            intake_age: intake.and_then(|i| i.age.seconds),
            intake_spay_neuter: intake.and_then(|i| i.spay_neuter.clone()),
            kennel: intake.and_then(|i| i.kennel.clone()),
            outcome_date: outcome.map(|o| o.timestamp),
            outcome_type: outcome.and_then(|o| o.outcome_type.clone()),
            outcome_subtype: outcome.and_then(|o| o.outcome_subtype.clone()),
            outcome_condition: outcome.and_then(|o| o.condition.clone()),
            outcome_spay_neuter: outcome.and_then(|o| o.spay_neuter.clone()),
        }
    }
}

impl TableRow for ImpoundRow {
    const COLUMNS: &'static [&'static str] = &[
        "animal_id",
        "intake_date",
        "intake_type",
        "intake_subtype",
        "intake_condition",
        "intake_location",
        "intake_age_count",
        "intake_age_units",
        "intake_age",
        "intake_spay_neuter",
        "kennel",
        "outcome_date",
        "outcome_type",
        "outcome_subtype",
        "outcome_condition",
        "outcome_spay_neuter",
    ];

    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(Some(&self.animal_id)),
            Cell::Timestamp(self.intake_date),
            Cell::Text(self.intake_type.as_deref()),
            Cell::Text(self.intake_subtype.as_deref()),
            Cell::Text(self.intake_condition.as_deref()),
            Cell::Text(self.intake_location.as_deref()),
            Cell::Integer(self.intake_age_count.map(i64::from)),
            Cell::Text(self.intake_age_units.as_deref()),
            Cell::Integer(self.intake_age),
            Cell::Text(self.intake_spay_neuter.as_deref()),
            Cell::Text(self.kennel.as_deref()),
            Cell::Timestamp(self.outcome_date),
            Cell::Text(self.outcome_type.as_deref()),
            Cell::Text(self.outcome_subtype.as_deref()),
            Cell::Text(self.outcome_condition.as_deref()),
            Cell::Text(self.outcome_spay_neuter.as_deref()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tables {
    pub animals: Vec<AnimalRow>,
    pub impounds: Vec<ImpoundRow>,
}

/// Project the registry and the per-animal pairings into the two output
/// tables. `pairings` must be in registry iteration order.
pub fn assemble(registry: &Registry, pairings: &[Pairing]) -> Tables {
    Tables {
        animals: registry.iter().map(AnimalRow::from).collect(),
        impounds: pairings
            .iter()
            .flat_map(|p| p.records.iter())
            .map(ImpoundRow::from)
            .collect(),
    }
}
