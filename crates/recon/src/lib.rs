//! `impound-recon`: shelter intake/outcome reconciliation engine.
//!
//! Pure engine crate: adapts CSV text into source rows, resolves animal
//! identities, pairs each animal's intakes and outcomes into impound records,
//! and returns the Animal and Impound tables. No filesystem or CLI
//! dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod ordering;
pub mod pairing;
pub mod registry;
pub mod source;
pub mod summary;
pub mod tables;

pub use config::{ImpoundConfig, OutputFormat, SourceKind};
pub use engine::{ingest, load_input, reconcile, run};
pub use error::ReconError;
pub use model::{Anomaly, AnomalyKind, ImpoundInput, ImpoundRecord, ImpoundResult, Individual, SourceRow};
pub use registry::Registry;
pub use tables::{AnimalRow, Cell, ImpoundRow, TableRow, Tables};
