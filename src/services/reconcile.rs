//! Group reconciliation: decides which layers are attached to the map.
//!
//! A member layer should be attached iff the file's `visible` flag is set and
//! its group's zoom gate is open at the current zoom. Every entry point here
//! mutates the store first, then reconciles only the groups it touched.
//! Attach/detach calls are made only on an actual change, so re-running a
//! pass on unchanged state is free.

use tracing::{debug, warn};

use crate::map::MapWidget;
use crate::models::MarkerLayer;
use crate::services::store::{StoreError, VisibilityStore};

/// Map calls made by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Layers attached by this pass
    pub attached: usize,
    /// Layers detached by this pass
    pub detached: usize,
}

impl ReconcileOutcome {
    /// Returns true if the pass changed nothing on the map.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.attached == 0 && self.detached == 0
    }

    fn merge(&mut self, other: Self) {
        self.attached += other.attached;
        self.detached += other.detached;
    }
}

/// Reconciles one group at the map's current zoom.
pub fn reconcile_group<M: MapWidget>(
    store: &VisibilityStore,
    map: &mut M,
    group_key: &str,
) -> Result<ReconcileOutcome, StoreError> {
    let zoom = map.current_zoom();
    reconcile_group_at(store, map, group_key, zoom)
}

/// Reconciles one group as if the map were at `zoom`.
pub fn reconcile_group_at<M: MapWidget>(
    store: &VisibilityStore,
    map: &mut M,
    group_key: &str,
    zoom: u8,
) -> Result<ReconcileOutcome, StoreError> {
    let group = store
        .group(group_key)
        .ok_or_else(|| StoreError::UnknownGroup(group_key.to_string()))?;
    let gate_open = group.gate_open(zoom);
    let mut outcome = ReconcileOutcome::default();

    for entry in store.members_of(group) {
        // Not loaded yet (or failed): nothing to attach
        let Some(layer) = entry.layer() else {
            continue;
        };
        let should_attach = entry.is_visible() && gate_open;
        let attached = map.is_attached(layer.id());

        if should_attach && !attached {
            map.attach(layer);
            outcome.attached += 1;
        } else if !should_attach && attached {
            map.detach(layer.id());
            outcome.detached += 1;
        }
    }

    if !outcome.is_noop() {
        debug!(
            group = group_key,
            zoom,
            gate_open,
            attached = outcome.attached,
            detached = outcome.detached,
            "reconciled group"
        );
    }
    Ok(outcome)
}

/// Reconciles every group in registry order.
pub fn reconcile_all<M: MapWidget>(store: &VisibilityStore, map: &mut M) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    for group in store.groups() {
        if let Ok(o) = reconcile_group(store, map, group.key()) {
            outcome.merge(o);
        }
    }
    outcome
}

/// Sets one file's toggle and reconciles its group only.
pub fn set_file_visible<M: MapWidget>(
    store: &mut VisibilityStore,
    map: &mut M,
    file_id: &str,
    visible: bool,
) -> Result<ReconcileOutcome, StoreError> {
    let group_key = store.set_visible(file_id, visible)?;
    reconcile_group(store, map, &group_key)
}

/// Applies the group-level toggle.
///
/// Enabling forces every member visible and then reconciles, so the zoom
/// gate still applies. Disabling forces every member hidden and detaches
/// every attached member layer outright.
pub fn set_group_enabled<M: MapWidget>(
    store: &mut VisibilityStore,
    map: &mut M,
    group_key: &str,
    enabled: bool,
) -> Result<ReconcileOutcome, StoreError> {
    store.set_group_enabled(group_key, enabled)?;
    if enabled {
        return reconcile_group(store, map, group_key);
    }

    let mut outcome = ReconcileOutcome::default();
    let group = store
        .group(group_key)
        .ok_or_else(|| StoreError::UnknownGroup(group_key.to_string()))?;
    for layer in store.members_of(group).filter_map(|e| e.layer()) {
        if map.is_attached(layer.id()) {
            map.detach(layer.id());
            outcome.detached += 1;
        }
    }
    debug!(group = group_key, detached = outcome.detached, "group disabled");
    Ok(outcome)
}

/// Re-runs reconciliation for zoom-gated groups only.
pub fn on_zoom_changed<M: MapWidget>(
    store: &VisibilityStore,
    map: &mut M,
    zoom: u8,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    for group in store.groups().iter().filter(|g| g.is_zoom_gated()) {
        if let Ok(o) = reconcile_group_at(store, map, group.key(), zoom) {
            outcome.merge(o);
        }
    }
    outcome
}

/// Settles a file as ready and reconciles its group.
///
/// Unknown or already-settled files are logged and dropped; the error is
/// returned for callers that care but is never fatal.
pub fn mark_ready<M: MapWidget>(
    store: &mut VisibilityStore,
    map: &mut M,
    file_id: &str,
    layer: MarkerLayer,
) -> Result<ReconcileOutcome, StoreError> {
    match store.mark_ready(file_id, layer) {
        Ok(group_key) => reconcile_group(store, map, &group_key),
        Err(e) => {
            warn!(file = file_id, "dropping readiness callback: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::HeadlessMap;
    use crate::models::{MarkerStyle, Placemark, RgbColor};
    use crate::services::registry::CategoryRegistry;

    fn layer(file_id: &str) -> MarkerLayer {
        MarkerLayer::new(
            file_id,
            MarkerStyle {
                icon: "place".to_string(),
                color: RgbColor::new(0, 0, 0),
            },
            vec![Placemark::at(file_id, 41.77, 140.73)],
        )
    }

    fn setup(zoom: u8) -> (VisibilityStore, HeadlessMap) {
        let mut store = VisibilityStore::new(&CategoryRegistry::reference());
        store.register_file("地上式", "shoubou").unwrap();
        store.register_file("医療機関", "support").unwrap();
        store.register_file("前進拠点", "support").unwrap();
        let map = HeadlessMap::new(crate::models::LatLng::new(41.77, 140.73), zoom);
        (store, map)
    }

    fn attached(store: &VisibilityStore, map: &HeadlessMap, file_id: &str) -> bool {
        store
            .file(file_id)
            .and_then(|e| e.layer())
            .is_some_and(|l| map.is_attached(l.id()))
    }

    #[test]
    fn test_mark_ready_attaches_visible_file() {
        let (mut store, mut map) = setup(12);
        let outcome = mark_ready(&mut store, &mut map, "医療機関", layer("医療機関")).unwrap();
        assert_eq!(outcome.attached, 1);
        assert!(attached(&store, &map, "医療機関"));
    }

    #[test]
    fn test_mark_ready_unknown_file_is_not_fatal() {
        let (mut store, mut map) = setup(12);
        let err = mark_ready(&mut store, &mut map, "ghost", layer("ghost")).unwrap_err();
        assert_eq!(err, StoreError::UnknownFile("ghost".to_string()));
        assert_eq!(map.attach_calls(), 0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (mut store, mut map) = setup(12);
        mark_ready(&mut store, &mut map, "医療機関", layer("医療機関")).unwrap();
        let calls = (map.attach_calls(), map.detach_calls());

        let second = reconcile_group(&store, &mut map, "support").unwrap();
        assert!(second.is_noop());
        assert!(reconcile_all(&store, &mut map).is_noop());
        assert_eq!((map.attach_calls(), map.detach_calls()), calls);
    }

    #[test]
    fn test_not_ready_files_are_skipped() {
        let (store, mut map) = setup(12);
        assert!(reconcile_all(&store, &mut map).is_noop());
    }

    #[test]
    fn test_set_file_visible_scoped_to_group() {
        let (mut store, mut map) = setup(16);
        mark_ready(&mut store, &mut map, "医療機関", layer("医療機関")).unwrap();
        mark_ready(&mut store, &mut map, "地上式", layer("地上式")).unwrap();
        store.set_visible("地上式", true).unwrap();

        // 地上式 is eligible but only support is reconciled
        let outcome = set_file_visible(&mut store, &mut map, "医療機関", false).unwrap();
        assert_eq!(outcome, ReconcileOutcome { attached: 0, detached: 1 });
        assert!(!attached(&store, &map, "地上式"));
    }

    #[test]
    fn test_zoom_gate_threshold() {
        let (mut store, mut map) = setup(15);
        mark_ready(&mut store, &mut map, "地上式", layer("地上式")).unwrap();
        set_group_enabled(&mut store, &mut map, "shoubou", true).unwrap();
        assert!(store.file("地上式").unwrap().is_visible());
        assert!(!attached(&store, &map, "地上式"));

        map.set_zoom(16);
        let outcome = on_zoom_changed(&store, &mut map, 16);
        assert_eq!(outcome.attached, 1);
        assert!(attached(&store, &map, "地上式"));

        map.set_zoom(15);
        on_zoom_changed(&store, &mut map, 15);
        assert!(!attached(&store, &map, "地上式"));
    }

    #[test]
    fn test_zoom_change_ignores_ungated_groups() {
        let (mut store, mut map) = setup(12);
        mark_ready(&mut store, &mut map, "医療機関", layer("医療機関")).unwrap();
        // Hide without reconciling; a zoom pass must not pick this up
        store.set_visible("医療機関", false).unwrap();
        assert!(on_zoom_changed(&store, &mut map, 18).is_noop());
        assert!(attached(&store, &map, "医療機関"));
    }

    #[test]
    fn test_group_disable_detaches_everything() {
        let (mut store, mut map) = setup(12);
        mark_ready(&mut store, &mut map, "医療機関", layer("医療機関")).unwrap();
        mark_ready(&mut store, &mut map, "前進拠点", layer("前進拠点")).unwrap();

        let outcome = set_group_enabled(&mut store, &mut map, "support", false).unwrap();
        assert_eq!(outcome.detached, 2);
        assert!(store.files().all(|e| e.group_key() != "support" || !e.is_visible()));
        assert_eq!(map.attached_count(), 0);
    }

    #[test]
    fn test_group_disable_detaches_regardless_of_file_flag() {
        let (mut store, mut map) = setup(12);
        mark_ready(&mut store, &mut map, "医療機関", layer("医療機関")).unwrap();
        // Flag cleared without reconciling: the layer is still on the map
        store.set_visible("医療機関", false).unwrap();
        assert!(attached(&store, &map, "医療機関"));

        let outcome = set_group_enabled(&mut store, &mut map, "support", false).unwrap();
        assert_eq!(outcome.detached, 1);
        assert!(!attached(&store, &map, "医療機関"));
    }

    #[test]
    fn test_group_enable_restores_hidden_members() {
        let (mut store, mut map) = setup(12);
        mark_ready(&mut store, &mut map, "医療機関", layer("医療機関")).unwrap();
        mark_ready(&mut store, &mut map, "前進拠点", layer("前進拠点")).unwrap();
        set_file_visible(&mut store, &mut map, "前進拠点", false).unwrap();

        set_group_enabled(&mut store, &mut map, "support", true).unwrap();
        assert!(store.file("前進拠点").unwrap().is_visible());
        assert!(attached(&store, &map, "前進拠点"));
        assert!(attached(&store, &map, "医療機関"));
    }

    #[test]
    fn test_unknown_group() {
        let (mut store, mut map) = setup(12);
        assert!(matches!(
            set_group_enabled(&mut store, &mut map, "nope", true),
            Err(StoreError::UnknownGroup(_))
        ));
    }
}
