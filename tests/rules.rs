use std::io::Write;

use problem_finder::{
    cli::rules::render_rules,
    nlp::{LabelSource, RuleSet, TargetRule},
    PipelineError,
};

#[test]
fn parses_target_rules_with_defaults() {
    let rules = RuleSet::from_json(
        r#"{"target_rules": [
            {"literal": " pneumothorax ", "category": "PROBLEM"},
            {"literal": "nodule"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules.rules()[0].literal, "pneumothorax");
    assert_eq!(rules.rules()[1].category, "PROBLEM");
    assert!(rules.rules()[1].pattern.is_none());
}

#[test]
fn duplicate_literals_are_rejected() {
    let err = RuleSet::from_json(
        r#"{"target_rules": [
            {"literal": "Pleural  Effusion", "category": "PROBLEM"},
            {"literal": "pleural effusion", "category": "FINDING"}
        ]}"#,
    )
    .unwrap_err();
    match err {
        PipelineError::Configuration(msg) => assert!(msg.contains("#1 and #2"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_and_empty_sources_fail() {
    for raw in [
        "not json",
        r#"{"rules": []}"#,
        r#"{"target_rules": []}"#,
        r#"{"target_rules": [{"literal": "   "}]}"#,
        r#"{"target_rules": [{"literal": "mass", "pattern": "(unclosed"}]}"#,
        r#"{"target_rules": [{"literal": "mass", "pattern": [{"LOWER": "mass"}]}]}"#,
    ] {
        assert!(
            matches!(RuleSet::from_json(raw), Err(PipelineError::Configuration(_))),
            "accepted {raw}"
        );
    }
}

#[test]
fn missing_rule_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuleSet::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[test]
fn loads_rules_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"target_rules": [{{"literal": "cardiomegaly", "category": "PROBLEM"}}]}}"#
    )
    .unwrap();
    let rules = RuleSet::from_path(file.path()).unwrap();
    assert_eq!(rules.rules()[0].key(), "cardiomegaly");
}

#[test]
fn shipped_rule_file_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/problem_targets.json");
    let rules = RuleSet::from_path(&path).unwrap();
    assert!(rules.rules().iter().any(|r| r.literal == "pneumothorax"));
}

#[test]
fn rule_listing() {
    let rules = RuleSet::new(vec![
        TargetRule {
            literal: "Pleural Effusion".into(),
            category: "PROBLEM".into(),
            pattern: Some("effusions?".into()),
        },
        TargetRule {
            literal: "pneumothorax".into(),
            category: "Problem".into(),
            pattern: None,
        },
    ])
    .unwrap();
    insta::assert_snapshot!(render_rules(&rules, LabelSource::Literal).trim_end(), @r#"
    pleural effusion <- "Pleural Effusion" /effusions?/
    pneumothorax <- "pneumothorax"
    "#);
    insta::assert_snapshot!(render_rules(&rules, LabelSource::Category).trim_end(), @r#"
    problem <- "Pleural Effusion" /effusions?/
    problem <- "pneumothorax"
    "#);
}
