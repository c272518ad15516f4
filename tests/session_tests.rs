//! Integration tests for session loading, reconciliation and readiness.

use std::rc::Rc;
use std::time::Duration;

use hazardmap::map::{HeadlessMap, MapWidget};
use hazardmap::models::{CategoryGroup, FileSpec, LatLng};
use hazardmap::services::{CategoryRegistry, LoadState, Readiness, Session};
use tokio::task::LocalSet;

mod fixtures;
use fixtures::*;

const POLL: Duration = Duration::from_millis(200);

fn reference_session(zoom: u8) -> Session<HeadlessMap> {
    Session::new(
        CategoryRegistry::reference(),
        HeadlessMap::new(LatLng::new(CENTER.0, CENTER.1), zoom),
    )
    .unwrap()
}

/// Two groups: `g1` zoom-gated at 16 holding `A`, `g2` ungated holding `B`.
fn two_group_registry() -> CategoryRegistry {
    CategoryRegistry::new(vec![
        CategoryGroup::new("g1", "Gated")
            .unwrap()
            .enabled_by_default(true)
            .with_zoom_gate(16)
            .with_file(FileSpec::new("A")),
        CategoryGroup::new("g2", "Plain")
            .unwrap()
            .enabled_by_default(true)
            .with_file(FileSpec::new("B")),
    ])
    .unwrap()
}

async fn load(
    session: &Session<HeadlessMap>,
    source: MemorySource,
    timeout: Duration,
) -> Readiness {
    session.load_all(Rc::new(source));
    session.wait_all_ready(timeout, POLL).await
}

#[tokio::test]
async fn test_load_all_reaches_ready() {
    let session = reference_session(12);
    let readiness = LocalSet::new()
        .run_until(load(&session, MemorySource::reference(), Duration::from_secs(5)))
        .await;

    assert_eq!(readiness, Readiness::AllReady);
    assert_eq!(session.store().ready_count(), 11);

    // Support files are on by default, fire-water ones are not
    assert!(session.is_attached("医療機関"));
    assert!(session.is_attached("給油【地上部隊】"));
    assert!(!session.is_attached("地上式"));
    assert_eq!(session.map().attached_count(), 8);
}

#[tokio::test]
async fn test_gated_and_ungated_groups_scenario() {
    let session = Session::new(
        two_group_registry(),
        HeadlessMap::new(LatLng::new(CENTER.0, CENTER.1), 10),
    )
    .unwrap();
    let source = MemorySource::default()
        .with_file("A", kml(&[("a", CENTER.0, CENTER.1)]))
        .with_file("B", kml(&[("b", CENTER.0, CENTER.1)]));

    let readiness = LocalSet::new()
        .run_until(load(&session, source, Duration::from_secs(5)))
        .await;
    assert!(readiness.is_all_ready());

    assert!(!session.is_attached("A"));
    assert!(session.is_attached("B"));

    session.zoom_to(16);
    assert!(session.is_attached("A"));
    assert!(session.is_attached("B"));
}

#[tokio::test]
async fn test_zoom_gate_boundary() {
    let session = reference_session(15);
    LocalSet::new()
        .run_until(load(&session, MemorySource::reference(), Duration::from_secs(5)))
        .await;

    session.set_file_visible("地上式", true).unwrap();
    assert!(!session.is_attached("地上式"), "gate must be closed at T-1");

    session.zoom_to(16);
    assert!(session.is_attached("地上式"), "gate must be open at T");
    // Hidden siblings stay detached even with the gate open
    assert!(!session.is_attached("地下式"));
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let session = reference_session(16);
    LocalSet::new()
        .run_until(load(&session, MemorySource::reference(), Duration::from_secs(5)))
        .await;
    session.set_group_enabled("shoubou", true).unwrap();

    let calls = {
        let map = session.map();
        (map.attach_calls(), map.detach_calls())
    };
    assert!(session.on_zoom_changed().is_noop());
    assert!(session.set_group_enabled("shoubou", true).unwrap().is_noop());
    assert!(session.set_file_visible("医療機関", true).unwrap().is_noop());

    let map = session.map();
    assert_eq!((map.attach_calls(), map.detach_calls()), calls);
}

#[tokio::test]
async fn test_group_enable_invariant() {
    let session = reference_session(16);
    LocalSet::new()
        .run_until(load(&session, MemorySource::reference(), Duration::from_secs(5)))
        .await;

    session.set_group_enabled("shoubou", true).unwrap();
    let store = session.store();
    let group = store.group("shoubou").unwrap();
    for entry in store.members_of(group) {
        assert!(entry.is_visible());
        assert!(session.is_attached(entry.file_id()), "{}", entry.file_id());
    }
}

#[tokio::test]
async fn test_group_disable_invariant() {
    let session = reference_session(16);
    LocalSet::new()
        .run_until(load(&session, MemorySource::reference(), Duration::from_secs(5)))
        .await;
    session.set_group_enabled("shoubou", true).unwrap();

    let outcome = session.set_group_enabled("support", false).unwrap();
    assert_eq!(outcome.detached, 8);

    let store = session.store();
    let group = store.group("support").unwrap();
    assert!(!group.is_user_enabled());
    for entry in store.members_of(group) {
        assert!(!entry.is_visible());
        assert!(!session.is_attached(entry.file_id()));
    }
    // The other group is untouched
    assert!(session.is_attached("地上式"));
}

#[tokio::test]
async fn test_failed_load_is_contained() {
    let session = reference_session(12);
    let source = MemorySource::reference()
        .without_file("宿営可能地")
        .with_file("医療機関", "<kml><Placemark><name>broken</nam></Placemark></kml>");

    let readiness = LocalSet::new()
        .run_until(load(&session, source, Duration::from_millis(400)))
        .await;
    assert_eq!(readiness, Readiness::TimedOut);

    let store = session.store();
    assert_eq!(store.file("宿営可能地").unwrap().load_state(), LoadState::Failed);
    assert_eq!(store.file("医療機関").unwrap().load_state(), LoadState::Failed);
    assert_eq!(store.ready_count(), 9);
    assert!(session.is_attached("前進拠点"));
    assert!(!session.is_attached("医療機関"));
}

#[tokio::test(start_paused = true)]
async fn test_late_file_attaches_when_it_settles() {
    let session = reference_session(12);
    let source = MemorySource::reference().with_delay("前進拠点", Duration::from_secs(2));

    let local = LocalSet::new();
    local
        .run_until(async {
            session.load_all(Rc::new(source));
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(!session.is_attached("前進拠点"));
            assert_eq!(session.store().ready_count(), 10);

            let readiness = session.wait_all_ready(Duration::from_secs(5), POLL).await;
            assert_eq!(readiness, Readiness::AllReady);
        })
        .await;
    assert!(session.is_attached("前進拠点"));
}

#[tokio::test]
async fn test_readiness_timeout_window() {
    let session = reference_session(12);
    let start = std::time::Instant::now();
    // Nothing is ever loaded
    let readiness = session
        .wait_all_ready(Duration::from_millis(100), POLL)
        .await;
    let waited = start.elapsed();

    assert_eq!(readiness, Readiness::TimedOut);
    assert!(waited >= Duration::from_millis(100), "waited {waited:?}");
    assert!(waited < Duration::from_millis(600), "waited {waited:?}");
}

#[tokio::test]
async fn test_empty_registry_waits_out_timeout() {
    let session = Session::new(
        CategoryRegistry::new(Vec::new()).unwrap(),
        HeadlessMap::default(),
    )
    .unwrap();
    let readiness = session
        .wait_all_ready(Duration::from_millis(100), POLL)
        .await;
    assert_eq!(readiness, Readiness::TimedOut);
    assert_eq!(session.map().current_zoom(), 12);
}
