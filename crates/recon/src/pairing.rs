use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::model::{Anomaly, AnomalyKind, ImpoundRecord, Individual, IntakeEvent, OutcomeEvent};

/// Calendar-day relation of one timestamp to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRelation {
    Earlier,
    Same,
    Later,
}

/// Compare `a` to `b` by year, month and day only.
pub fn compare_by_day(a: &NaiveDateTime, b: &NaiveDateTime) -> DayRelation {
    match a.date().cmp(&b.date()) {
        Ordering::Less => DayRelation::Earlier,
        Ordering::Equal => DayRelation::Same,
        Ordering::Greater => DayRelation::Later,
    }
}

/// Records and anomalies produced for one animal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pub records: Vec<ImpoundRecord>,
    pub anomalies: Vec<Anomaly>,
}

impl Pairing {
    fn anomaly(&mut self, animal_id: &str, kind: AnomalyKind) {
        self.anomalies.push(Anomaly {
            animal_id: animal_id.to_string(),
            kind,
        });
    }
}

/// Pair an animal's events. Events must already be in chronological order
/// (see [`Individual::order_events`]).
pub fn pair_individual(animal: &Individual) -> Pairing {
    pair_events(&animal.animal_id, animal.intakes(), animal.outcomes())
}

/// Forward-only merge of ordered intakes and outcomes into impound records.
///
/// Each intake is paired with the next outcome falling on the same or a later
/// day. An outcome on an earlier day than the first intake is a stay that began
/// before the data window; later in the stream it is out of order and dropped.
/// Trailing intakes collapse to the most recent one (still in custody).
/// Trailing outcomes are kept only when the animal has no intakes at all.
pub fn pair_events(animal_id: &str, intakes: &[IntakeEvent], outcomes: &[OutcomeEvent]) -> Pairing {
    let mut out = Pairing::default();
    let mut next_intake = 0;
    let mut next_outcome = 0;

    while next_intake < intakes.len() {
        let intake = &intakes[next_intake];

        if next_outcome == outcomes.len() {
            let remaining = intakes.len() - next_intake;
            if remaining > 1 {
                out.anomaly(animal_id, AnomalyKind::UnmatchedIntake { dropped: remaining - 1 });
                let latest = &intakes[intakes.len() - 1];
                out.records.push(ImpoundRecord::in_custody(animal_id, latest.clone()));
            } else {
                out.records.push(ImpoundRecord::in_custody(animal_id, intake.clone()));
            }
            next_intake = intakes.len();
            continue;
        }

        let outcome = &outcomes[next_outcome];
        next_outcome += 1;

        match compare_by_day(&outcome.timestamp, &intake.timestamp) {
            DayRelation::Earlier if next_intake == 0 => {
                out.records.push(ImpoundRecord::pre_window(animal_id, outcome.clone()));
            }
            DayRelation::Earlier => {
                out.anomaly(
                    animal_id,
                    AnomalyKind::OutcomeOutOfOrder {
                        outcome_date: outcome.timestamp,
                    },
                );
            }
            DayRelation::Same | DayRelation::Later => {
                out.records.push(ImpoundRecord::complete(
                    animal_id,
                    intake.clone(),
                    outcome.clone(),
                ));
                next_intake += 1;
            }
        }
    }

    let leftover = &outcomes[next_outcome..];
    if !leftover.is_empty() {
        if intakes.is_empty() {
            for outcome in leftover {
                out.records.push(ImpoundRecord::pre_window(animal_id, outcome.clone()));
            }
        } else {
            out.anomaly(animal_id, AnomalyKind::ExtraOutcomes { dropped: leftover.len() });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stay;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn ts(date: &str, hour: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn intakes(dates: &[&str]) -> Vec<IntakeEvent> {
        dates.iter().map(|d| IntakeEvent::at(ts(d, 10))).collect()
    }

    fn outcomes(dates: &[&str]) -> Vec<OutcomeEvent> {
        dates.iter().map(|d| OutcomeEvent::at(ts(d, 15))).collect()
    }

    #[test]
    fn day_comparison_ignores_time() {
        let morning = ts("2024-01-01", 1);
        let evening = ts("2024-01-01", 23);
        assert_eq!(compare_by_day(&evening, &morning), DayRelation::Same);
        assert_eq!(compare_by_day(&morning, &evening), DayRelation::Same);
        assert_eq!(compare_by_day(&ts("2023-12-31", 23), &morning), DayRelation::Earlier);
        assert_eq!(compare_by_day(&ts("2024-02-01", 0), &ts("2024-01-31", 0)), DayRelation::Later);
    }

    #[test]
    fn single_stay_is_paired() {
        let out = pair_events("A1", &intakes(&["2024-01-01"]), &outcomes(&["2024-01-05"]));
        assert!(out.anomalies.is_empty());
        assert_eq!(out.records.len(), 1);
        assert!(matches!(out.records[0].stay, Stay::Complete { .. }));
        assert_eq!(out.records[0].intake().unwrap().timestamp, ts("2024-01-01", 10));
        assert_eq!(out.records[0].outcome().unwrap().timestamp, ts("2024-01-05", 15));
    }

    #[test]
    fn same_day_outcome_pairs_even_if_earlier_in_the_day() {
        let i = vec![IntakeEvent::at(ts("2024-01-01", 18))];
        let o = vec![OutcomeEvent::at(ts("2024-01-01", 8))];
        let out = pair_events("A1", &i, &o);
        assert!(out.anomalies.is_empty());
        assert!(matches!(out.records[0].stay, Stay::Complete { .. }));
    }

    #[test]
    fn trailing_intakes_keep_only_latest() {
        let out = pair_events("A1", &intakes(&["2024-01-01", "2024-01-10"]), &[]);
        assert_eq!(out.records.len(), 1);
        assert!(matches!(out.records[0].stay, Stay::InCustody { .. }));
        assert_eq!(out.records[0].intake().unwrap().timestamp, ts("2024-01-10", 10));
        assert_eq!(out.anomalies.len(), 1);
        assert_eq!(out.anomalies[0].kind, AnomalyKind::UnmatchedIntake { dropped: 1 });
        assert_eq!(out.anomalies[0].animal_id, "A1");
    }

    #[test]
    fn outcome_only_animal_is_pre_window() {
        let out = pair_events("A1", &[], &outcomes(&["2024-02-01"]));
        assert!(out.anomalies.is_empty());
        assert_eq!(out.records.len(), 1);
        assert!(matches!(out.records[0].stay, Stay::PreWindow { .. }));
    }

    #[test]
    fn every_leftover_outcome_emitted_without_intakes() {
        let out = pair_events("A1", &[], &outcomes(&["2024-02-01", "2024-03-01", "2024-04-01"]));
        assert!(out.anomalies.is_empty());
        assert_eq!(out.records.len(), 3);
        assert!(out.records.iter().all(|r| r.intake().is_none()));
    }

    #[test]
    fn early_outcome_before_first_intake_is_pre_window() {
        let out = pair_events("A1", &intakes(&["2024-03-05"]), &outcomes(&["2024-03-01"]));
        assert!(out.anomalies.is_empty());
        assert_eq!(out.records.len(), 2);
        assert!(matches!(out.records[0].stay, Stay::PreWindow { .. }));
        assert_eq!(out.records[0].outcome().unwrap().timestamp, ts("2024-03-01", 15));
        assert!(matches!(out.records[1].stay, Stay::InCustody { .. }));
        assert_eq!(out.records[1].intake().unwrap().timestamp, ts("2024-03-05", 10));
    }

    #[test]
    fn several_pre_window_outcomes_before_first_intake() {
        let out = pair_events(
            "A1",
            &intakes(&["2024-03-05"]),
            &outcomes(&["2024-01-01", "2024-02-01", "2024-03-06"]),
        );
        assert!(out.anomalies.is_empty());
        assert_eq!(out.records.len(), 3);
        assert!(matches!(out.records[0].stay, Stay::PreWindow { .. }));
        assert!(matches!(out.records[1].stay, Stay::PreWindow { .. }));
        assert!(matches!(out.records[2].stay, Stay::Complete { .. }));
    }

    #[test]
    fn mid_stream_early_outcome_is_dropped() {
        // Stay 1: 01-01 -> 01-05. Outcome 01-07 precedes intake 01-10.
        let out = pair_events(
            "A1",
            &intakes(&["2024-01-01", "2024-01-10"]),
            &outcomes(&["2024-01-05", "2024-01-07", "2024-01-12"]),
        );
        assert_eq!(out.records.len(), 2);
        assert!(out.records.iter().all(|r| matches!(r.stay, Stay::Complete { .. })));
        assert_eq!(out.records[1].outcome().unwrap().timestamp, ts("2024-01-12", 15));
        assert_eq!(
            out.anomalies[0].kind,
            AnomalyKind::OutcomeOutOfOrder { outcome_date: ts("2024-01-07", 15) }
        );
    }

    #[test]
    fn out_of_order_then_exhausted_leaves_intake_in_custody() {
        let out = pair_events(
            "A1",
            &intakes(&["2024-01-01", "2024-01-10"]),
            &outcomes(&["2024-01-05", "2024-01-07"]),
        );
        assert_eq!(out.records.len(), 2);
        assert!(matches!(out.records[1].stay, Stay::InCustody { .. }));
        assert_eq!(out.anomalies.len(), 1);
    }

    #[test]
    fn extra_outcomes_dropped_with_one_anomaly() {
        let out = pair_events(
            "A1",
            &intakes(&["2024-01-01"]),
            &outcomes(&["2024-01-05", "2024-01-06", "2024-01-07"]),
        );
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.anomalies.len(), 1);
        assert_eq!(out.anomalies[0].kind, AnomalyKind::ExtraOutcomes { dropped: 2 });
    }

    #[test]
    fn nothing_in_nothing_out() {
        let out = pair_events("A1", &[], &[]);
        assert_eq!(out, Pairing::default());
    }

    #[test]
    fn pairs_repeated_stays_in_order() {
        let out = pair_events(
            "A1",
            &intakes(&["2024-01-01", "2024-02-01", "2024-03-01"]),
            &outcomes(&["2024-01-15", "2024-02-15"]),
        );
        assert!(out.anomalies.is_empty());
        assert_eq!(out.records.len(), 3);
        assert!(matches!(out.records[2].stay, Stay::InCustody { .. }));
    }

    fn day_offsets() -> impl Strategy<Value = Vec<u32>> {
        proptest::collection::vec(0u32..60, 0..8).prop_map(|mut v| {
            v.sort_unstable();
            v
        })
    }

    proptest! {
        #[test]
        fn complete_records_never_run_backwards(i in day_offsets(), o in day_offsets()) {
            let base = ts("2024-01-01", 12);
            let ins: Vec<_> = i.iter().map(|d| IntakeEvent::at(base + chrono::Duration::days(i64::from(*d)))).collect();
            let outs: Vec<_> = o.iter().map(|d| OutcomeEvent::at(base + chrono::Duration::days(i64::from(*d)))).collect();
            let out = pair_events("A1", &ins, &outs);

            for record in &out.records {
                if let Stay::Complete { intake, outcome } = &record.stay {
                    prop_assert_ne!(compare_by_day(&outcome.timestamp, &intake.timestamp), DayRelation::Earlier);
                }
            }
        }

        #[test]
        fn intake_accounting_balances(i in day_offsets(), o in day_offsets()) {
            let base = ts("2024-01-01", 12);
            let ins: Vec<_> = i.iter().map(|d| IntakeEvent::at(base + chrono::Duration::days(i64::from(*d)))).collect();
            let outs: Vec<_> = o.iter().map(|d| OutcomeEvent::at(base + chrono::Duration::days(i64::from(*d)))).collect();
            let out = pair_events("A1", &ins, &outs);

            let emitted = out.records.iter().filter(|r| r.intake().is_some()).count();
            let dropped: usize = out.anomalies.iter().map(|a| match a.kind {
                AnomalyKind::UnmatchedIntake { dropped } => dropped,
                _ => 0,
            }).sum();
            prop_assert_eq!(emitted + dropped, ins.len());

            let outcomes_emitted = out.records.iter().filter(|r| r.outcome().is_some()).count();
            let outcomes_dropped: usize = out.anomalies.iter().map(|a| match a.kind {
                AnomalyKind::OutcomeOutOfOrder { .. } => 1,
                AnomalyKind::ExtraOutcomes { dropped } => dropped,
                AnomalyKind::UnmatchedIntake { .. } => 0,
            }).sum();
            prop_assert_eq!(outcomes_emitted + outcomes_dropped, outs.len());
        }
    }
}
