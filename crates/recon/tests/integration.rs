use std::path::PathBuf;

use impound_recon::config::{ImpoundConfig, InputFiles, SourceKind};
use impound_recon::engine::{load_input, run};
use impound_recon::model::{AnomalyKind, ImpoundResult};
use impound_recon::ReconError;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_and_run(config: &ImpoundConfig) -> ImpoundResult {
    let dir = fixtures_dir();
    let input = load_input(config, |path| {
        std::fs::read_to_string(dir.join(path)).map_err(|e| ReconError::Io(format!("{path}: {e}")))
    })
    .unwrap();
    run(config, input)
}

fn fixture_config(name: &str) -> ImpoundConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join(name)).unwrap();
    ImpoundConfig::from_toml(&toml).unwrap()
}

// -------------------------------------------------------------------------
// Austin: separate intake and outcome files
// -------------------------------------------------------------------------

#[test]
fn atx_summary() {
    let result = load_and_run(&fixture_config("atx.impound.toml"));

    assert_eq!(result.meta.config_name, "Austin sample");
    assert_eq!(result.meta.source, SourceKind::Atx);
    assert_eq!(result.summary.individuals, 5);
    assert_eq!(result.summary.impounds, 6);
    assert_eq!(result.summary.complete, 3);
    assert_eq!(result.summary.in_custody, 2);
    assert_eq!(result.summary.pre_window, 1);
    assert_eq!(result.summary.intakes_dropped, 1);
    assert_eq!(result.summary.outcomes_dropped, 1);
    assert_eq!(result.summary.anomalies(), 2);
}

#[test]
fn atx_animals_sorted_with_newest_known_attributes() {
    let result = load_and_run(&fixture_config("atx.impound.toml"));
    let animals = &result.tables.animals;

    let ids: Vec<_> = animals.iter().map(|a| a.animal_id.as_str()).collect();
    assert_eq!(ids, vec!["A100", "A200", "A300", "A400", "A500"]);

    // Outcome row for A100 predates its second intake, so its name is ignored.
    assert_eq!(animals[0].name.as_deref(), Some("Rex"));
    // A200 was unnamed at intake and named by the later outcome row.
    assert_eq!(animals[1].name.as_deref(), Some("Clementine"));
    assert_eq!(animals[2].gender, None);
    assert_eq!(animals[3].kind.as_deref(), Some("Dog"));
}

#[test]
fn atx_impound_rows() {
    let result = load_and_run(&fixture_config("atx.impound.toml"));
    let impounds = &result.tables.impounds;

    let ids: Vec<_> = impounds.iter().map(|r| r.animal_id.as_str()).collect();
    assert_eq!(ids, vec!["A100", "A100", "A200", "A300", "A400", "A500"]);

    // A100: returned to owner, then back in custody.
    assert_eq!(impounds[0].outcome_type.as_deref(), Some("Return to Owner"));
    assert_eq!(impounds[1].intake_condition.as_deref(), Some("Injured"));
    assert!(impounds[1].outcome_date.is_none());

    // A200: 3 months at intake.
    assert_eq!(impounds[2].intake_age, Some(90 * 86_400));
    assert_eq!(impounds[2].outcome_subtype.as_deref(), Some("Foster"));

    // A300: only the latest of two open intakes survives.
    assert_eq!(
        impounds[3].intake_date.map(|d| d.format("%Y-%m-%d").to_string()),
        Some("2015-11-09".to_string())
    );

    // A400: stay began before the data window.
    assert!(impounds[4].intake_date.is_none());
    assert_eq!(impounds[4].outcome_type.as_deref(), Some("Transfer"));
}

#[test]
fn atx_anomalies() {
    let result = load_and_run(&fixture_config("atx.impound.toml"));

    assert_eq!(result.anomalies.len(), 2);
    assert_eq!(result.anomalies[0].animal_id, "A300");
    assert_eq!(result.anomalies[0].kind, AnomalyKind::UnmatchedIntake { dropped: 1 });
    assert_eq!(result.anomalies[1].animal_id, "A500");
    assert_eq!(result.anomalies[1].kind, AnomalyKind::ExtraOutcomes { dropped: 1 });
    assert!(result.anomalies[0]
        .to_string()
        .starts_with("A300 - Intake not matched with outcome"));
}

#[test]
fn atx_result_serializes() {
    let result = load_and_run(&fixture_config("atx.impound.toml"));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["meta"]["source"], "atx");
    assert_eq!(json["summary"]["anomaly_counts"]["unmatched_intake"], 1);
    assert_eq!(json["anomalies"][1]["kind"], "extra_outcomes");
    assert_eq!(json["anomalies"][1]["dropped"], 1);
    assert!(json["tables"]["impounds"][4]["intake_date"].is_null());
}

// -------------------------------------------------------------------------
// Sacramento: combined impound file
// -------------------------------------------------------------------------

#[test]
fn sac_open_data() {
    let result = load_and_run(&fixture_config("sac.impound.toml"));

    assert!(result.anomalies.is_empty());
    assert_eq!(result.summary.individuals, 2);
    assert_eq!(result.summary.complete, 2);
    assert_eq!(result.summary.in_custody, 1);

    let animals = &result.tables.animals;
    assert_eq!(animals[0].animal_id, "S1");
    assert_eq!(animals[0].name.as_deref(), Some("Buddy Boy"));
    assert_eq!(animals[0].color_1, None);

    // Same-day intake and outcome pair.
    let second = &result.tables.impounds[1];
    assert_eq!(second.outcome_type.as_deref(), Some("Return to Owner"));
    assert_eq!(
        second.intake_date.map(|d| d.date()),
        second.outcome_date.map(|d| d.date())
    );
}

#[test]
fn sac_cpra_detected() {
    let config = ImpoundConfig::for_source(
        "Sacramento CPRA",
        SourceKind::Sac,
        InputFiles {
            impounds: Some("sac_cpra.csv".into()),
            ..InputFiles::default()
        },
    );
    let result = load_and_run(&config);

    assert_eq!(result.summary.individuals, 2);
    let impounds = &result.tables.impounds;
    assert_eq!(impounds[0].kennel.as_deref(), Some("K12"));
    assert_eq!(impounds[0].intake_spay_neuter.as_deref(), Some("Neutered"));
    assert_eq!(impounds[0].outcome_condition.as_deref(), Some("Healthy"));
    assert_eq!(impounds[1].animal_id, "S3");
    assert!(impounds[1].outcome_date.is_none());
    assert_eq!(result.tables.animals[1].kind.as_deref(), Some("Rabbit"));
}

#[test]
fn wrong_shape_reports_missing_column() {
    // Open-data file read as CPRA.
    let config = ImpoundConfig::for_source(
        "forced",
        SourceKind::SacCpra,
        InputFiles {
            impounds: Some("sac_open.csv".into()),
            ..InputFiles::default()
        },
    );
    let dir = fixtures_dir();
    let err = load_input(&config, |path| {
        std::fs::read_to_string(dir.join(path)).map_err(|e| ReconError::Io(e.to_string()))
    })
    .unwrap_err();
    assert!(matches!(err, ReconError::MissingColumn { .. }));
}
