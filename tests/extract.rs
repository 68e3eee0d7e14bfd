use problem_finder::{
    extract::{extract_study, ExtractionRow, Redaction, NONE_FLAGGED},
    nlp::{LabelSource, Pipeline, RuleSet, TargetRule},
};
use proptest::prelude::*;

fn rule(literal: &str, category: &str) -> TargetRule {
    TargetRule {
        literal: literal.into(),
        category: category.into(),
        pattern: None,
    }
}

fn pipeline(rules: Vec<TargetRule>, source: LabelSource) -> Pipeline {
    Pipeline::new(RuleSet::new(rules).unwrap(), source).unwrap()
}

fn radiology() -> Pipeline {
    pipeline(
        vec![
            rule("cardiomegaly", "PROBLEM"),
            TargetRule {
                literal: "pleural effusion".into(),
                category: "PROBLEM".into(),
                pattern: Some(r"\beffusions?\b".into()),
            },
        ],
        LabelSource::Literal,
    )
}

#[test]
fn chest_pain_maps_to_its_category() {
    let nlp = pipeline(vec![rule("chest pain", "pain")], LabelSource::Category);
    let rows = extract_study(
        1,
        Some("Patient denies chest pain. Follow up in 2 weeks."),
        &nlp,
        &Redaction::default(),
    );
    assert_eq!(
        rows,
        vec![ExtractionRow {
            study_id: 1,
            sent_id: 0,
            problem: "pain".into(),
            sentence: "Patient denies chest pain.".into(),
        }]
    );
}

#[test]
fn absent_text_yields_the_sentinel() {
    let rows = extract_study(2, None, &radiology(), &Redaction::default());
    assert_eq!(rows, vec![ExtractionRow::sentinel(2)]);
    let row = &rows[0];
    assert_eq!((row.sent_id, row.problem.as_str(), row.sentence.as_str()), (-1, NONE_FLAGGED, ""));
}

#[test]
fn unmatched_text_yields_the_sentinel() {
    let nlp = radiology();
    let redaction = Redaction::default();
    assert_eq!(
        extract_study(3, Some("No abnormalities. ___ discharged home."), &nlp, &redaction),
        vec![ExtractionRow::sentinel(3)]
    );
    assert_eq!(extract_study(4, Some(""), &nlp, &redaction), vec![ExtractionRow::sentinel(4)]);
}

#[test]
fn labels_are_lowercased_literals_and_match_case_insensitively() {
    let rows = extract_study(
        7,
        Some("No acute process. Small left PLEURAL   EFFUSION."),
        &radiology(),
        &Redaction::default(),
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].problem, "pleural effusion");
    assert_eq!(rows[0].sent_id, 4);
    assert_eq!(rows[0].sentence, "Small left PLEURAL   EFFUSION.");
}

#[test]
fn pattern_triggers_report_the_rule_literal() {
    let rows = extract_study(8, Some("Bilateral effusions persist."), &radiology(), &Redaction::default());
    assert_eq!(rows[0].problem, "pleural effusion");
}

#[test]
fn literal_must_sit_on_word_boundaries() {
    let nlp = pipeline(vec![rule("mass", "PROBLEM")], LabelSource::Literal);
    let rows = extract_study(9, Some("Massive hemothorax."), &nlp, &Redaction::default());
    assert_eq!(rows, vec![ExtractionRow::sentinel(9)]);
}

#[test]
fn placeholder_is_restored_in_sentences() {
    let rows = extract_study(
        10,
        Some("Seen by Dr. ___ today. Mild cardiomegaly noted on ___ exam."),
        &radiology(),
        &Redaction::default(),
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sent_id, 7);
    assert_eq!(rows[0].sentence, "Mild cardiomegaly noted on ___ exam.");
}

#[test]
fn reports_containing_the_stand_in_are_left_untouched() {
    let text = "PII review: ___ has cardiomegaly.";
    let redaction = Redaction::default();
    assert!(redaction.collides(text));
    let rows = extract_study(11, Some(text), &radiology(), &redaction);
    assert_eq!(rows[0].sentence, text);
}

#[test]
fn duplicate_mentions_in_one_sentence_collapse() {
    let rows = extract_study(
        12,
        Some("Cardiomegaly and more cardiomegaly. Cardiomegaly again."),
        &radiology(),
        &Redaction::default(),
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].sent_id, 0);
    assert_eq!(rows[1].sent_id, 5);
}

#[test]
fn overlapping_matches_keep_the_longest() {
    let nlp = pipeline(
        vec![rule("effusion", "PROBLEM"), rule("pleural effusion", "PROBLEM")],
        LabelSource::Literal,
    );
    let rows = extract_study(13, Some("Small pleural effusion."), &nlp, &Redaction::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].problem, "pleural effusion");
}

#[test]
fn redaction_settings_are_validated() {
    assert!(Redaction::new("___", "").is_err());
    assert!(Redaction::new("___", "P.I").is_err());
    assert!(Redaction::new("XXX", "XX").is_err());
    let custom = Redaction::new("[**]", "REDACTED").unwrap();
    assert_eq!(custom.stand_in(), "REDACTED");
}

#[test]
fn rules_matching_the_stand_in_are_rejected() {
    let redaction = Redaction::default();
    let rules = RuleSet::new(vec![rule("pii leak", "PROBLEM")]).unwrap();
    assert!(redaction.check_rules(&rules).is_err());
    let rules = RuleSet::new(vec![TargetRule {
        literal: "identifier".into(),
        category: "PROBLEM".into(),
        pattern: Some(r"\bp\w+".into()),
    }])
    .unwrap();
    assert!(redaction.check_rules(&rules).is_err());
    assert!(redaction
        .check_rules(&RuleSet::new(vec![rule("cardiomegaly", "PROBLEM")]).unwrap())
        .is_ok());
}

fn report_text() -> impl Strategy<Value = String> {
    let word = prop::sample::select(vec!["no", "acute", "___", "cardiomegaly", "seen", "today", "effusion"]);
    let sentence = prop::collection::vec(word, 1..8).prop_map(|words| words.join(" "));
    prop::collection::vec(sentence, 1..5).prop_map(|sentences| format!("{}.", sentences.join(". ")))
}

proptest! {
    #[test]
    fn placeholder_substitution_is_transparent(text in report_text()) {
        let rows = extract_study(1, Some(&text), &radiology(), &Redaction::default());
        prop_assert!(!rows.is_empty());
        for row in rows {
            if row.is_sentinel() {
                continue;
            }
            prop_assert!(row.sent_id >= 0);
            prop_assert_ne!(row.problem.as_str(), NONE_FLAGGED);
            prop_assert!(!row.sentence.contains("PII"));
            prop_assert!(text.contains(&row.sentence), "{:?} not in {:?}", row.sentence, text);
        }
    }
}
