//! End-to-end reconciliation scenarios.

use std::time::Duration;

use netcfg::core::{decode_rules, Identified};
use netcfg::endpoint::{JsonFileSource, JsonFileTarget, MemoryDevice};
use netcfg::{AccessError, ReconcileError, Reconciler, ReconcilerConfig, RetryPolicy, Rule};
use netcfg_testkit::fixtures::{self, DevicePair};
use netcfg_testkit::scripted::{Call, CallCounter, Journal, Op, ScriptedSource, ScriptedTarget};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn quick(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_secs(60), Duration::from_millis(1))
}

fn config(source: u32, target: u32) -> ReconcilerConfig {
    ReconcilerConfig::default()
        .with_source(quick(source))
        .with_target(quick(target))
}

// ============================================================================
// Apply order
// ============================================================================

#[test]
fn test_rule_b_replaced_by_rule_a_in_protocol_order() {
    init_tracing();
    let journal = Journal::default();
    let (src, tgt) = (journal.clone(), journal.clone());

    let reconciler = Reconciler::new(
        move || Ok::<_, AccessError>(ScriptedSource::new(src.clone()).with_rules(&[fixtures::rule_a()])),
        move || Ok::<_, AccessError>(ScriptedTarget::new(tgt.clone()).with_rules(&[fixtures::rule_b()])),
        config(1, 1),
    );

    let report = reconciler.run().unwrap();
    assert_eq!(report.applied.total(), 6);

    let a = fixtures::rule_a();
    let b = fixtures::rule_b();
    assert_eq!(
        journal.mutations(),
        vec![
            Call::DeleteRule(b.identifier().clone()),
            Call::DeleteFilter(fixtures::filter_2().identifier().clone()),
            Call::DeleteOwner(fixtures::owner_2().identifier().clone()),
            Call::AddOwner(fixtures::owner_1().identifier().clone()),
            Call::AddFilter(fixtures::filter_1().identifier().clone()),
            Call::AddRule(a.identifier().clone()),
        ]
    );

    let calls = journal.calls();
    let commit = calls.iter().position(|c| *c == Call::ApplyChanges).unwrap();
    assert!(calls[..commit].iter().any(Call::is_mutation));
    assert!(!calls[commit..].iter().any(Call::is_mutation));
    assert_eq!(calls.last(), Some(&Call::Close));
}

#[test]
fn test_failed_change_stops_remaining_steps() {
    init_tracing();
    let journal = Journal::default();
    let (src, tgt) = (journal.clone(), journal.clone());

    let reconciler = Reconciler::new(
        move || Ok::<_, AccessError>(ScriptedSource::new(src.clone()).with_rules(&[fixtures::rule_a()])),
        move || {
            Ok::<_, AccessError>(
                ScriptedTarget::new(tgt.clone())
                    .with_rules(&[fixtures::rule_b()])
                    .fail_on(Op::AddFilter, || AccessError::Rejected("filter table full".into())),
            )
        },
        config(1, 3),
    );

    let err = reconciler.run().unwrap_err();
    assert!(matches!(err, ReconcileError::Target { attempts: 1, .. }));

    let mutations = journal.mutations();
    assert_eq!(mutations.len(), 5);
    assert!(matches!(mutations.last(), Some(Call::AddFilter(_))));
    assert_eq!(journal.count(&Call::ApplyChanges), 0);
    assert_eq!(journal.calls().last(), Some(&Call::Close));
}

// ============================================================================
// Retry
// ============================================================================

#[test]
fn test_exhaustion_creates_one_handle_per_attempt() {
    init_tracing();
    let made = CallCounter::default();
    let counter = made.clone();

    let reconciler = Reconciler::new(
        || Ok::<_, AccessError>(ScriptedSource::new(Journal::default())),
        move || {
            counter.bump();
            Ok::<_, AccessError>(
                ScriptedTarget::new(Journal::default())
                    .fail_on(Op::Open, || AccessError::Unavailable("maintenance".into())),
            )
        },
        config(1, 3),
    );

    let err = reconciler.run().unwrap_err();
    match &err {
        ReconcileError::Target { attempts, cause } => {
            assert_eq!(*attempts, 3);
            assert!(matches!(cause, AccessError::Unavailable(_)));
        }
        other => panic!("expected target failure, got {:?}", other),
    }
    assert_eq!(made.get(), 3);
}

#[test]
fn test_source_exhaustion_creates_one_handle_per_attempt() {
    init_tracing();
    let made = CallCounter::default();
    let counter = made.clone();
    let target = MemoryDevice::new();

    let reconciler = Reconciler::new(
        move || {
            counter.bump();
            Ok::<_, AccessError>(
                ScriptedSource::new(Journal::default())
                    .fail_on(Op::Open, || AccessError::Unavailable("maintenance".into())),
            )
        },
        target.clone(),
        config(3, 1),
    );

    let err = reconciler.run().unwrap_err();
    assert!(matches!(err, ReconcileError::Source { attempts: 3, .. }));
    assert!(matches!(err.cause(), AccessError::Unavailable(_)));
    assert_eq!(made.get(), 3);
    assert_eq!(target.connections(), 0);
}

#[test]
fn test_factory_failure_is_retried() {
    init_tracing();
    let made = CallCounter::default();
    let counter = made.clone();

    let reconciler = Reconciler::new(
        move || {
            if counter.bump() < 3 {
                return Err(AccessError::Connection("no route to host".into()));
            }
            Ok(ScriptedSource::new(Journal::default()).with_rules(&[fixtures::rule_a()]))
        },
        MemoryDevice::new(),
        config(3, 1),
    );

    let report = reconciler.run().unwrap();
    assert_eq!(report.source_attempts, 3);
    assert_eq!(report.rules_read, 1);
    assert_eq!(made.get(), 3);
}

#[test]
fn test_fatal_error_short_circuits() {
    init_tracing();
    let made = CallCounter::default();
    let counter = made.clone();

    let reconciler = Reconciler::new(
        move || {
            counter.bump();
            Ok::<_, AccessError>(
                ScriptedSource::new(Journal::default())
                    .fail_on(Op::Open, || AccessError::Authentication("bad key".into())),
            )
        },
        MemoryDevice::new(),
        config(5, 1),
    );

    let err = reconciler.run().unwrap_err();
    assert!(matches!(err, ReconcileError::Source { attempts: 1, .. }));
    assert!(!err.cause().is_recoverable());
    assert_eq!(made.get(), 1);
}

#[test]
fn test_time_budget_stops_before_attempt_budget() {
    init_tracing();
    let made = CallCounter::default();
    let counter = made.clone();
    let slow = RetryPolicy::new(100, Duration::from_millis(30), Duration::from_millis(20));

    let reconciler = Reconciler::new(
        || Ok::<_, AccessError>(ScriptedSource::new(Journal::default())),
        move || {
            counter.bump();
            Ok::<_, AccessError>(
                ScriptedTarget::new(Journal::default())
                    .fail_on(Op::Read, || AccessError::Connection("reset".into())),
            )
        },
        ReconcilerConfig::default()
            .with_source(quick(1))
            .with_target(slow),
    );

    let err = reconciler.run().unwrap_err();
    assert!(err.attempts() >= 2);
    assert!(err.attempts() < 100);
    assert_eq!(made.get(), err.attempts());
}

#[test]
fn test_recoverable_commit_failure_retries_whole_phase() {
    init_tracing();
    let journal = Journal::default();
    let tgt = journal.clone();

    let reconciler = Reconciler::new(
        || Ok::<_, AccessError>(ScriptedSource::new(Journal::default()).with_rules(&[fixtures::rule_a()])),
        move || {
            Ok::<_, AccessError>(
                ScriptedTarget::new(tgt.clone())
                    .fail_on(Op::ApplyChanges, || AccessError::Unavailable("busy".into())),
            )
        },
        config(1, 2),
    );

    let err = reconciler.run().unwrap_err();
    assert_eq!(err.attempts(), 2);
    assert_eq!(journal.count(&Call::Open), 2);
    assert_eq!(journal.count(&Call::ApplyChanges), 2);
    assert_eq!(journal.count(&Call::Close), 2);
}

#[test]
fn test_flaky_device_recovers() {
    init_tracing();
    let pair = DevicePair::a_over_b();
    pair.source.refuse_connections(1);
    pair.target.refuse_connections(2);

    let reconciler = Reconciler::new(pair.source.clone(), pair.target.clone(), config(3, 3));
    let report = reconciler.run().unwrap();

    assert_eq!(report.source_attempts, 2);
    assert_eq!(report.target_attempts, 3);
    assert_eq!(pair.target.rules(), vec![fixtures::rule_a()]);
    assert_eq!(pair.target.connections(), 3);
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_corrupt_source_record_is_fatal() {
    init_tracing();
    let mut record = fixtures::rule_a().to_value();
    record["identifier"] = serde_json::json!("X-0000000000000000000000000000000000000000");

    let reconciler = Reconciler::new(
        move || Ok::<_, AccessError>(ScriptedSource::new(Journal::default()).with_records(vec![record.clone()])),
        MemoryDevice::new(),
        config(3, 1),
    );

    let err = reconciler.run().unwrap_err();
    assert!(matches!(err, ReconcileError::Source { attempts: 1, .. }));
    assert!(matches!(err.cause(), AccessError::Deserialization(_)));
}

// ============================================================================
// Memory device
// ============================================================================

#[test]
fn test_second_run_issues_nothing() {
    init_tracing();
    let pair = DevicePair::a_over_b();
    let reconciler = Reconciler::new(pair.source.clone(), pair.target.clone(), config(1, 1));

    let first = reconciler.run().unwrap();
    assert_eq!(first.applied.rules_deleted, 1);
    assert_eq!(first.applied.filters_deleted, 1);
    assert_eq!(first.applied.owners_deleted, 1);
    assert_eq!(first.applied.owners_added, 1);
    assert_eq!(first.applied.filters_added, 1);
    assert_eq!(first.applied.rules_added, 1);

    let second = reconciler.run().unwrap();
    assert_eq!(second.applied.total(), 0);
    assert!(reconciler.plan().unwrap().is_empty());

    assert_eq!(pair.target.rules(), vec![fixtures::rule_a()]);
    assert_eq!(pair.target.filters(), vec![fixtures::filter_1()]);
    assert_eq!(pair.target.owners(), vec![fixtures::owner_1()]);
    assert_eq!(pair.target.commits(), 2);
}

#[test]
fn test_shared_filter_survives() {
    init_tracing();
    let keep = fixtures::tcp_rule(1, 2, 22);
    let stale = fixtures::tcp_rule(3, 4, 22);
    let pair = DevicePair::new([keep.clone()], [keep.clone(), stale]);

    let report = Reconciler::new(pair.source.clone(), pair.target.clone(), config(1, 1))
        .run()
        .unwrap();

    assert_eq!(report.applied.rules_deleted, 1);
    assert_eq!(report.applied.filters_deleted, 0);
    assert_eq!(pair.target.rules(), vec![keep.clone()]);
    assert_eq!(pair.target.filters(), vec![keep.packet_filter().clone()]);
}

#[test]
fn test_empty_source_clears_target() {
    init_tracing();
    let pair = DevicePair::new(Vec::<Rule>::new(), [fixtures::rule_a(), fixtures::rule_b()]);
    let report = Reconciler::new(pair.source.clone(), pair.target.clone(), config(1, 1))
        .run()
        .unwrap();

    assert_eq!(report.applied.rules_deleted, 2);
    assert!(pair.target.rules().is_empty());
    assert!(pair.target.filters().is_empty());
    assert!(pair.target.owners().is_empty());
}

// ============================================================================
// JSON files
// ============================================================================

#[test]
fn test_json_file_rewritten_to_desired_rules() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let source = fixtures::write_rules_file(
        dir.path(),
        "desired.json",
        &[fixtures::rule_a(), fixtures::rule_b()],
    )
    .unwrap();
    let target = fixtures::write_rules_file(
        dir.path(),
        "device.json",
        &[fixtures::rule_b(), fixtures::tcp_rule(1, 2, 22)],
    )
    .unwrap();

    let report = Reconciler::new(
        JsonFileSource::factory(&source),
        JsonFileTarget::factory(&target),
        config(1, 1),
    )
    .run()
    .unwrap();

    assert_eq!(report.rules_read, 2);
    assert_eq!(report.applied.rules_added, 1);
    assert_eq!(report.applied.rules_deleted, 1);

    let written = decode_rules(fixtures::read_rules_file(&target).unwrap()).unwrap();
    let expected = decode_rules(fixtures::read_rules_file(&source).unwrap()).unwrap();
    assert_eq!(written, expected);
}

#[test]
fn test_json_target_created_when_missing() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let source = fixtures::write_rules_file(dir.path(), "desired.json", &[fixtures::rule_a()]).unwrap();
    let target = dir.path().join("new-device.json");

    Reconciler::new(
        JsonFileSource::factory(&source),
        JsonFileTarget::factory(&target),
        config(1, 1),
    )
    .run()
    .unwrap();

    let records = fixtures::read_rules_file(&target).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["identifier"], fixtures::rule_a().identifier().as_str());
}

#[test]
fn test_json_source_not_an_array_is_fatal() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let source = dir.path().join("desired.json");
    std::fs::write(&source, r#"{"rules": []}"#).unwrap();

    let err = Reconciler::new(
        JsonFileSource::factory(&source),
        MemoryDevice::new(),
        config(3, 1),
    )
    .run()
    .unwrap_err();

    assert!(matches!(err, ReconcileError::Source { attempts: 1, .. }));
    assert!(matches!(err.cause(), AccessError::Deserialization(_)));
}

// ============================================================================
// Dry run
// ============================================================================

#[test]
fn test_plan_lists_changes_in_order() {
    init_tracing();
    let pair = DevicePair::a_over_b();
    let plan = Reconciler::new(pair.source.clone(), pair.target.clone(), config(1, 1))
        .plan()
        .unwrap();

    let rendered: Vec<String> = plan.changes().map(|c| c.to_string()).collect();
    assert_eq!(rendered.len(), 6);
    assert!(rendered[0].starts_with("delete rule"));
    assert!(rendered[5].starts_with("add rule"));
    assert_eq!(pair.target.rules(), vec![fixtures::rule_b()]);
    assert_eq!(pair.target.commits(), 0);
}
