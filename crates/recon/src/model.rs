use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::SourceKind;
use crate::tables::Tables;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Age at intake. The three parts travel independently: a source may carry
/// the count/units pair, the denormalized total, both, or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Age {
    pub count: Option<i32>,
    pub units: Option<String>,
    /// Total age in seconds.
    pub seconds: Option<i64>,
}

/// Start of a custody episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeEvent {
    pub timestamp: NaiveDateTime,
    pub intake_type: Option<String>,
    pub intake_subtype: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub age: Age,
    pub spay_neuter: Option<String>,
    pub kennel: Option<String>,
}

impl IntakeEvent {
    /// An intake at `timestamp` with every other field unknown.
    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            intake_type: None,
            intake_subtype: None,
            condition: None,
            location: None,
            age: Age::default(),
            spay_neuter: None,
            kennel: None,
        }
    }
}

/// End of a custody episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeEvent {
    pub timestamp: NaiveDateTime,
    pub outcome_type: Option<String>,
    pub outcome_subtype: Option<String>,
    pub condition: Option<String>,
    pub spay_neuter: Option<String>,
}

impl OutcomeEvent {
    /// An outcome at `timestamp` with every other field unknown.
    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            outcome_type: None,
            outcome_subtype: None,
            condition: None,
            spay_neuter: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Individual
// ---------------------------------------------------------------------------

/// Descriptive attributes of an animal. `None` means the source row did not
/// supply the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    pub kind: Option<String>,
    pub sex: Option<String>,
    pub name: Option<String>,
    pub color1: Option<String>,
    pub color2: Option<String>,
    pub breed1: Option<String>,
    pub breed2: Option<String>,
}

/// Canonical record for one animal plus its accumulated events.
///
/// `timestamp` is the time of the most recent source row whose attributes
/// were merged in. Events are kept in arrival order until
/// [`Individual::order_events`] runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual {
    pub animal_id: String,
    pub timestamp: NaiveDateTime,
    pub attributes: Attributes,
    pub(crate) intakes: Vec<IntakeEvent>,
    pub(crate) outcomes: Vec<OutcomeEvent>,
}

impl Individual {
    pub fn new(animal_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            animal_id: animal_id.into(),
            timestamp,
            attributes: Attributes::default(),
            intakes: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn add_intake(&mut self, intake: IntakeEvent) {
        self.intakes.push(intake);
    }

    pub fn add_outcome(&mut self, outcome: OutcomeEvent) {
        self.outcomes.push(outcome);
    }

    pub fn intakes(&self) -> &[IntakeEvent] {
        &self.intakes
    }

    pub fn outcomes(&self) -> &[OutcomeEvent] {
        &self.outcomes
    }
}

// ---------------------------------------------------------------------------
// Impound records
// ---------------------------------------------------------------------------

/// One custody episode as seen from the observation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stay", rename_all = "snake_case")]
pub enum Stay {
    /// Intake paired with the outcome that ended it.
    Complete { intake: IntakeEvent, outcome: OutcomeEvent },
    /// Intake with no outcome: still in custody when the data ends.
    InCustody { intake: IntakeEvent },
    /// Outcome with no intake: the stay began before the data starts.
    PreWindow { outcome: OutcomeEvent },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpoundRecord {
    pub animal_id: String,
    #[serde(flatten)]
    pub stay: Stay,
}

impl ImpoundRecord {
    pub fn complete(animal_id: &str, intake: IntakeEvent, outcome: OutcomeEvent) -> Self {
        Self {
            animal_id: animal_id.to_string(),
            stay: Stay::Complete { intake, outcome },
        }
    }

    pub fn in_custody(animal_id: &str, intake: IntakeEvent) -> Self {
        Self {
            animal_id: animal_id.to_string(),
            stay: Stay::InCustody { intake },
        }
    }

    pub fn pre_window(animal_id: &str, outcome: OutcomeEvent) -> Self {
        Self {
            animal_id: animal_id.to_string(),
            stay: Stay::PreWindow { outcome },
        }
    }

    pub fn intake(&self) -> Option<&IntakeEvent> {
        match &self.stay {
            Stay::Complete { intake, .. } | Stay::InCustody { intake } => Some(intake),
            Stay::PreWindow { .. } => None,
        }
    }

    pub fn outcome(&self) -> Option<&OutcomeEvent> {
        match &self.stay {
            Stay::Complete { outcome, .. } | Stay::PreWindow { outcome } => Some(outcome),
            Stay::InCustody { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Anomalies
// ---------------------------------------------------------------------------

/// Non-fatal discrepancy found while pairing one animal's events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Several intakes left with no outcome; only the latest was kept.
    UnmatchedIntake { dropped: usize },
    /// Outcome on an earlier day than the intake it would close.
    OutcomeOutOfOrder { outcome_date: NaiveDateTime },
    /// Outcomes left over after every intake was consumed.
    ExtraOutcomes { dropped: usize },
}

impl AnomalyKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnmatchedIntake { .. } => "unmatched_intake",
            Self::OutcomeOutOfOrder { .. } => "outcome_out_of_order",
            Self::ExtraOutcomes { .. } => "extra_outcomes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub animal_id: String,
    #[serde(flatten)]
    pub kind: AnomalyKind,
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            AnomalyKind::UnmatchedIntake { dropped } => write!(
                f,
                "{} - Intake not matched with outcome ({dropped} earlier intake(s) discarded).",
                self.animal_id
            ),
            AnomalyKind::OutcomeOutOfOrder { outcome_date } => write!(
                f,
                "{} - Outcome out of order ({}). Discarded.",
                self.animal_id,
                outcome_date.format("%Y-%m-%d %H:%M")
            ),
            AnomalyKind::ExtraOutcomes { dropped } => write!(
                f,
                "{} - Extra outcomes remaining at end ({dropped} discarded).",
                self.animal_id
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One adapted source row: the animal as described by that row, plus the
/// intake and/or outcome it records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub animal_id: String,
    /// Time the row's animal information was observed.
    pub timestamp: NaiveDateTime,
    pub attributes: Attributes,
    pub intake: Option<IntakeEvent>,
    pub outcome: Option<OutcomeEvent>,
}

/// Pre-loaded rows in ingestion order.
#[derive(Debug, Default)]
pub struct ImpoundInput {
    pub rows: Vec<SourceRow>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImpoundSummary {
    pub individuals: usize,
    pub impounds: usize,
    pub complete: usize,
    pub in_custody: usize,
    pub pre_window: usize,
    pub intakes_dropped: usize,
    pub outcomes_dropped: usize,
    pub anomaly_counts: BTreeMap<String, usize>,
}

impl ImpoundSummary {
    pub fn anomalies(&self) -> usize {
        self.anomaly_counts.values().sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpoundMeta {
    pub config_name: String,
    pub source: SourceKind,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpoundResult {
    pub meta: ImpoundMeta,
    pub summary: ImpoundSummary,
    pub anomalies: Vec<Anomaly>,
    pub tables: Tables,
}
