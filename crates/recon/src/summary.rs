use crate::model::{AnomalyKind, ImpoundSummary, Stay};
use crate::pairing::Pairing;

/// Compute summary statistics from per-animal pairings.
pub fn compute_summary(individuals: usize, pairings: &[Pairing]) -> ImpoundSummary {
    let mut summary = ImpoundSummary {
        individuals,
        ..ImpoundSummary::default()
    };

    for pairing in pairings {
        for record in &pairing.records {
            summary.impounds += 1;
            match record.stay {
                Stay::Complete { .. } => summary.complete += 1,
                Stay::InCustody { .. } => summary.in_custody += 1,
                Stay::PreWindow { .. } => summary.pre_window += 1,
            }
        }

        for anomaly in &pairing.anomalies {
            *summary
                .anomaly_counts
                .entry(anomaly.kind.label().to_string())
                .or_insert(0) += 1;

            match anomaly.kind {
                AnomalyKind::UnmatchedIntake { dropped } => summary.intakes_dropped += dropped,
                AnomalyKind::OutcomeOutOfOrder { .. } => summary.outcomes_dropped += 1,
                AnomalyKind::ExtraOutcomes { dropped } => summary.outcomes_dropped += dropped,
            }
        }
    }

    summary
}
