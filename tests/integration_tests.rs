use chrono::NaiveDate;
use grade_ranking::aggregate::{aggregate_records, rank};
use grade_ranking::models::{EntityKind, PerformanceTier, ReportScope, ScoreRecord};
use grade_ranking::report::build_report;
use grade_ranking::source::{CsvScoreSource, ScoreSource};

fn fixture() -> CsvScoreSource {
    CsvScoreSource::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample_grades.csv"))
}

async fn records(scope: &ReportScope) -> Vec<ScoreRecord<String>> {
    fixture()
        .fetch(scope)
        .await
        .expect("read fixture")
        .iter()
        .map(|row| row.to_record(scope.kind))
        .collect()
}

#[tokio::test]
async fn student_ranking_from_csv() {
    let scope = ReportScope::new(EntityKind::Student);
    let aggregation = aggregate_records(&records(&scope).await);
    assert_eq!(aggregation.rejected.len(), 1);
    assert_eq!(aggregation.rejected[0].entity_id, "S-005");

    let ranked = rank(aggregation.results);
    let order: Vec<(&str, usize, usize)> = ranked
        .iter()
        .map(|r| (r.aggregate.entity_id.as_str(), r.aggregate.count, r.rank))
        .collect();
    assert_eq!(
        order,
        vec![("S-001", 2, 1), ("S-003", 3, 2), ("S-002", 2, 3), ("S-004", 1, 4)]
    );

    let top = &ranked[0];
    assert_eq!(top.aggregate.mean, 17.0);
    assert_eq!(top.aggregate.std_dev, 1.0);
    assert_eq!(top.tier, PerformanceTier::Excellent);
    assert_eq!(ranked[1].tier, PerformanceTier::VeryGood);
    assert_eq!(ranked[1].aggregate.std_dev, 0.0);
    assert_eq!(ranked[3].tier, PerformanceTier::Insufficient);
}

#[tokio::test]
async fn period_filter_drops_other_terms() {
    let mut scope = ReportScope::new(EntityKind::Student);
    scope.period = Some("T1".to_string());
    let ranked = rank(aggregate_records(&records(&scope).await).results);
    assert!(ranked.iter().all(|r| r.aggregate.entity_id != "S-004"));
    assert_eq!(ranked.len(), 3);
}

#[tokio::test]
async fn class_ranking_from_csv() {
    let scope = ReportScope::new(EntityKind::Class);
    let ranked = rank(aggregate_records(&records(&scope).await).results);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].aggregate.entity_id, "6A");
    assert!((ranked[0].aggregate.mean - 16.0).abs() < 1e-9);
    assert_eq!(ranked[1].aggregate.entity_id, "6B");
    assert!((ranked[1].aggregate.mean - 13.5).abs() < 1e-9);
    assert_eq!(ranked[1].aggregate.min, 9.0);
}

#[tokio::test]
async fn report_for_filtered_subject() {
    let mut scope = ReportScope::new(EntityKind::Student);
    scope.subject = Some("HIST".to_string());
    let aggregation = aggregate_records(&records(&scope).await);
    let report = build_report(
        &scope,
        NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date"),
        &aggregation,
    );
    assert!(report.contains("Generated for students, subject HIST on 2026-02-01"));
    assert!(report.contains("| 1 | S-003 | 15.00 |"));
    assert!(!report.contains("S-001"));
}
