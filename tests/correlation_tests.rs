//! Integration tests for deep-link correlation over loaded data.

use std::rc::Rc;
use std::time::Duration;

use hazardmap::map::{HeadlessMap, MapWidget};
use hazardmap::models::LatLng;
use hazardmap::services::{
    find_exact, find_nearest, CategoryRegistry, DeepLink, MatchKind, Readiness, Session,
};
use tokio::task::LocalSet;

mod fixtures;
use fixtures::*;

const RADIUS_M: f64 = 2000.0;
const FOCUS_ZOOM: u8 = 16;

async fn loaded_session() -> Session<HeadlessMap> {
    let session = Session::new(
        CategoryRegistry::reference(),
        HeadlessMap::new(LatLng::new(CENTER.0, CENTER.1), 12),
    )
    .unwrap();
    LocalSet::new()
        .run_until(async {
            session.load_all(Rc::new(MemorySource::reference()));
            let readiness = session
                .wait_all_ready(Duration::from_secs(5), Duration::from_millis(50))
                .await;
            assert_eq!(readiness, Readiness::AllReady);
        })
        .await;
    session
}

#[tokio::test]
async fn test_find_nearest_at_default_center() {
    let session = loaded_session().await;
    let store = session.store();
    let mut map = HeadlessMap::new(LatLng::new(CENTER.0, CENTER.1), 12);
    // Attach the same layers the session attached
    for entry in store.files() {
        if let Some(layer) = entry.layer().filter(|_| session.is_attached(entry.file_id())) {
            map.attach(layer);
        }
    }

    let found = find_nearest(
        &store,
        &mut map,
        LatLng::new(41.7688, 140.7288),
        RADIUS_M,
        FOCUS_ZOOM,
    )
    .unwrap();
    assert_eq!(found.file_id, "前進拠点");
    assert!(found.distance_m.unwrap() < 1e-6);
    assert!(map.current_zoom() >= 16);
    assert_eq!(map.center(), LatLng::new(41.7688, 140.7288));
}

#[tokio::test]
async fn test_exact_match_beats_closer_marker() {
    let session = loaded_session().await;
    // 前進拠点 has a same-named placemark exactly on the query point
    let link = DeepLink::at(CENTER.0, CENTER.1).with_target("医療機関", "市立函館病院");

    let (kind, found) = session.resolve(&link, RADIUS_M, FOCUS_ZOOM).unwrap();
    assert_eq!(kind, MatchKind::Exact);
    assert_eq!(found.file_id, "医療機関");
    assert_eq!(session.map().center(), LatLng::new(41.7897, 140.7574));
}

#[tokio::test]
async fn test_missing_exact_falls_back_to_nearest() {
    let session = loaded_session().await;
    let link = DeepLink::at(41.7801, 140.7351).with_target("医療機関", "閉院した病院");

    let (kind, found) = session.resolve(&link, RADIUS_M, FOCUS_ZOOM).unwrap();
    assert_eq!(kind, MatchKind::Nearest);
    assert_eq!(found.placemark, "共愛会病院");
    assert!(found.distance_m.unwrap() < 50.0);
}

#[tokio::test]
async fn test_hidden_layer_is_not_searched() {
    let session = loaded_session().await;
    // 地上式 is loaded but its group is off by default
    let link = DeepLink::at(41.7690, 140.7290).with_target("地上式", "H-101");

    let (kind, found) = session.resolve(&link, RADIUS_M, FOCUS_ZOOM).unwrap();
    assert_eq!(kind, MatchKind::Nearest);
    assert_ne!(found.file_id, "地上式");
}

#[tokio::test]
async fn test_activation_opens_zoom_gate() {
    let session = loaded_session().await;
    session.set_group_enabled("shoubou", true).unwrap();
    assert!(!session.is_attached("地上式"));

    // Zooming in to the support marker opens the fire-water gate
    let link = DeepLink::at(CENTER.0, CENTER.1);
    session.resolve(&link, RADIUS_M, FOCUS_ZOOM).unwrap();
    assert_eq!(session.map().current_zoom(), 16);
    assert!(session.is_attached("地上式"));

    let store = session.store();
    let mut map = session.map().clone();
    let found = find_exact(&store, &mut map, "地上式", "H-102", FOCUS_ZOOM).unwrap();
    assert_eq!(found.zoom, 16);
}

#[tokio::test]
async fn test_nothing_within_radius() {
    let session = loaded_session().await;
    // Far out in the strait
    let link = DeepLink::at(41.60, 140.60);
    assert!(session.resolve(&link, RADIUS_M, FOCUS_ZOOM).is_none());
    assert_eq!(session.map().current_zoom(), 12);
    assert!(session.map().popup().is_none());
}
