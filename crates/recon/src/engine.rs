use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{ImpoundConfig, SourceKind};
use crate::error::ReconError;
use crate::model::{ImpoundInput, ImpoundMeta, ImpoundResult, Individual, SourceRow};
use crate::pairing::{pair_individual, Pairing};
use crate::registry::Registry;
use crate::source::{load_atx_intakes, load_atx_outcomes, load_sac_impounds};
use crate::summary::compute_summary;
use crate::tables::assemble;

/// Run the full pipeline: resolve identities, order and pair each animal's
/// events, then assemble the output tables.
pub fn run(config: &ImpoundConfig, input: ImpoundInput) -> ImpoundResult {
    let rows = input.rows.len();
    let mut registry = ingest(input.rows);
    info!(
        "{}: {rows} rows resolved to {} animals",
        config.name,
        registry.len()
    );

    let pairings = reconcile(&mut registry, config.engine.parallel_threshold);
    let anomalies: Vec<_> = pairings
        .iter()
        .flat_map(|p| p.anomalies.iter().cloned())
        .collect();
    for anomaly in &anomalies {
        warn!("{anomaly}");
    }

    let summary = compute_summary(registry.len(), &pairings);
    let tables = assemble(&registry, &pairings);
    info!(
        "{}: {} impounds ({} complete, {} in custody, {} pre-window), {} anomalies",
        config.name,
        summary.impounds,
        summary.complete,
        summary.in_custody,
        summary.pre_window,
        anomalies.len()
    );

    ImpoundResult {
        meta: ImpoundMeta {
            config_name: config.name.clone(),
            source: config.source,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        anomalies,
        tables,
    }
}

/// Resolve every row to its canonical animal, attaching the row's events.
/// Rows are applied in order; later rows only update attributes when newer.
pub fn ingest(rows: Vec<SourceRow>) -> Registry {
    let mut registry = Registry::new();
    for row in rows {
        let mut candidate = Individual::new(row.animal_id, row.timestamp).with_attributes(row.attributes);
        if let Some(intake) = row.intake {
            candidate.add_intake(intake);
        }
        if let Some(outcome) = row.outcome {
            candidate.add_outcome(outcome);
        }
        registry.resolve(candidate);
    }
    registry
}

/// Order and pair every animal. Pairings come back in registry order.
///
/// Animals are independent, so at or above `parallel_threshold` animals the
/// work is spread across the rayon pool.
pub fn reconcile(registry: &mut Registry, parallel_threshold: usize) -> Vec<Pairing> {
    let mut animals: Vec<&mut Individual> = registry.iter_mut().collect();
    if animals.len() >= parallel_threshold {
        debug!("pairing {} animals in parallel", animals.len());
        animals.par_iter_mut().map(|a| reconcile_one(a)).collect()
    } else {
        animals.iter_mut().map(|a| reconcile_one(a)).collect()
    }
}

fn reconcile_one(animal: &mut Individual) -> Pairing {
    animal.order_events();
    pair_individual(animal)
}

/// Read and adapt the config's input files. `read` maps a configured path to
/// the file's text; ATX intakes are ingested before outcomes.
pub fn load_input<F>(config: &ImpoundConfig, mut read: F) -> Result<ImpoundInput, ReconError>
where
    F: FnMut(&str) -> Result<String, ReconError>,
{
    let required = |path: &Option<String>, what: &str| {
        path.clone().ok_or_else(|| {
            ReconError::ConfigValidation(format!("source '{}' requires inputs.{what}", config.source))
        })
    };

    let rows = match config.source {
        SourceKind::Atx => {
            let intakes = read(&required(&config.inputs.intakes, "intakes")?)?;
            let outcomes = read(&required(&config.inputs.outcomes, "outcomes")?)?;
            let mut rows = load_atx_intakes(&intakes, config)?;
            rows.extend(load_atx_outcomes(&outcomes, config)?);
            rows
        }
        SourceKind::Sac | SourceKind::SacOpen | SourceKind::SacCpra => {
            let impounds = read(&required(&config.inputs.impounds, "impounds")?)?;
            load_sac_impounds(&impounds, config)?
        }
    };

    info!("{}: loaded {} rows", config.name, rows.len());
    Ok(ImpoundInput { rows })
}
