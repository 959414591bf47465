//! Contract Test: Update Cycle
//!
//! Constraints verified:
//! - `update_record` is called exactly when resolved != stored
//! - Equal addresses produce zero write calls
//! - Missing state produces no registrar call and no panic
//! - Every failure is soft

mod common;

use common::*;
use ddns_core::{
    Address, ManagedRecord, MemoryConfigStore, RecordType, Reconciler, UpdateOutcome,
};

struct Fixture {
    provider: FakeRegistrar,
    store: MemoryConfigStore,
    record_id: String,
}

fn fixture(stored: &str) -> Fixture {
    let provider = FakeRegistrar::with_zone("example.com", "zone-1");
    let record_id = provider.seed_record("zone-1", "home.example.com", RecordType::A, stored);
    let store = MemoryConfigStore::with_record(ManagedRecord::new(
        "zone-1",
        record_id.clone(),
        "home.example.com",
    ));
    Fixture {
        provider,
        store,
        record_id,
    }
}

#[tokio::test]
async fn writes_exactly_when_addresses_differ() {
    let cases = [
        ("203.0.113.5", "203.0.113.5", false),
        ("203.0.113.5", "203.0.113.9", true),
        ("2001:db8::1", "2001:db8::1", false),
        ("198.51.100.1", "198.51.100.10", true),
    ];

    let config = config_for("example.com", Some("home"), RecordType::A);
    for (stored, resolved, expect_write) in cases {
        let f = fixture(stored);
        let reconciler = Reconciler::new(
            &config,
            Box::new(ScriptedSource::fixed(resolved)),
            Box::new(f.provider.clone()),
            Box::new(f.store.clone()),
        );

        reconciler.update().await;

        assert_eq!(
            f.provider.call_count("update_record"),
            usize::from(expect_write),
            "stored={} resolved={}",
            stored,
            resolved
        );
        assert_eq!(f.provider.call_count("create_record"), 0);
        assert_eq!(f.provider.call_count("delete_record"), 0);
    }
}

#[tokio::test]
async fn missing_state_makes_no_registrar_call() {
    let config = config_for("example.com", Some("home"), RecordType::A);
    let provider = FakeRegistrar::with_zone("example.com", "zone-1");
    let source = ScriptedSource::fixed("203.0.113.5");

    let reconciler = Reconciler::new(
        &config,
        Box::new(source.clone()),
        Box::new(provider.clone()),
        Box::new(MemoryConfigStore::new()),
    );

    assert_eq!(reconciler.update().await, UpdateOutcome::NotConfigured);
    assert!(provider.calls().is_empty());
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn unreadable_state_file_is_soft() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloudflare.conf");
    std::fs::write(&path, "{not json").unwrap();

    let config = config_for("example.com", Some("home"), RecordType::A);
    let provider = FakeRegistrar::with_zone("example.com", "zone-1");
    let reconciler = Reconciler::new(
        &config,
        Box::new(ScriptedSource::fixed("203.0.113.5")),
        Box::new(provider.clone()),
        Box::new(ddns_core::FileConfigStore::new(&path)),
    );

    assert_eq!(reconciler.update().await, UpdateOutcome::NotConfigured);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn resolution_failure_is_soft_and_writes_nothing() {
    let f = fixture("203.0.113.5");
    let config = config_for("example.com", Some("home"), RecordType::A);

    let reconciler = Reconciler::new(
        &config,
        Box::new(ScriptedSource::failing()),
        Box::new(f.provider.clone()),
        Box::new(f.store.clone()),
    );

    assert_eq!(reconciler.update().await, UpdateOutcome::ResolutionFailed);
    assert_eq!(f.provider.write_calls(), 0);
}

#[tokio::test]
async fn provider_update_failure_is_reported_not_raised() {
    let f = fixture("203.0.113.5");
    f.provider.fail_update();
    let config = config_for("example.com", Some("home"), RecordType::A);

    let reconciler = Reconciler::new(
        &config,
        Box::new(ScriptedSource::fixed("203.0.113.9")),
        Box::new(f.provider.clone()),
        Box::new(f.store.clone()),
    );

    let outcome = reconciler.update().await;
    assert!(matches!(outcome, UpdateOutcome::UpdateFailed { .. }));
    assert_eq!(f.provider.records()[0].content, "203.0.113.5");
}

#[tokio::test]
async fn unreadable_provider_content_counts_as_different() {
    let f = fixture("203.0.113.5");
    f.provider.fail_get();
    let config = config_for("example.com", Some("home"), RecordType::A);

    let reconciler = Reconciler::new(
        &config,
        Box::new(ScriptedSource::fixed("203.0.113.5")),
        Box::new(f.provider.clone()),
        Box::new(f.store.clone()),
    );

    let outcome = reconciler.update().await;
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            previous: None,
            current: Address::new("203.0.113.5"),
        }
    );
    assert_eq!(f.provider.call_count("update_record"), 1);
}

#[tokio::test]
async fn update_targets_the_persisted_record_not_a_lookup() {
    let f = fixture("203.0.113.5");
    f.provider
        .seed_record("zone-1", "home.example.com", RecordType::A, "203.0.113.5");
    let config = config_for("example.com", Some("home"), RecordType::A);

    let reconciler = Reconciler::new(
        &config,
        Box::new(ScriptedSource::fixed("203.0.113.9")),
        Box::new(f.provider.clone()),
        Box::new(f.store.clone()),
    );
    reconciler.update().await;

    assert_eq!(f.provider.call_count("find_record_id"), 0);
    assert_eq!(f.provider.call_count("find_zone_id"), 0);

    let records = f.provider.records();
    let ours = records.iter().find(|r| r.id == f.record_id).unwrap();
    let other = records.iter().find(|r| r.id != f.record_id).unwrap();
    assert_eq!(ours.content, "203.0.113.9");
    assert_eq!(other.content, "203.0.113.5");
}
