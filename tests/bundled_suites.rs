// The bundled suites all pass when run through the harness.

use verdict::{suites, Outcome, Pattern, Registry, Runner};

#[test]
fn every_bundled_unit_passes() {
    let mut registry = Registry::new();
    suites::register_all(&mut registry).unwrap();

    let summary = Runner::run(registry.all_units());
    let failures: Vec<_> = summary
        .outcomes()
        .filter(|(_, outcome)| !outcome.is_passed())
        .map(|(unit, outcome)| format!("{}: {:?}", unit.qualified_name(), outcome))
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
    assert_eq!(summary.counts().passed, registry.len());
}

#[test]
fn pattern_selects_one_suite() {
    let mut registry = Registry::new();
    suites::register_all(&mut registry).unwrap();

    let pattern = Pattern::new(r"^DatabaseTest\.").unwrap();
    let summary = Runner::run(registry.matching(Some(&pattern)));
    let ran: Vec<_> = summary
        .outcomes()
        .map(|(unit, outcome)| (unit.name().to_string(), outcome.clone()))
        .collect();
    assert_eq!(
        ran,
        [
            ("test_create_table".to_string(), Outcome::Passed),
            ("test_insert_user".to_string(), Outcome::Passed),
            ("test_query_users".to_string(), Outcome::Passed),
        ]
    );
}
