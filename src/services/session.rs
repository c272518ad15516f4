//! A map session: one registry, one visibility store, one map widget.
//!
//! All state lives behind `Rc<RefCell<..>>` and is only touched from tasks
//! on a single `LocalSet`. Borrows never span an `.await`: every load task
//! settles its file in one synchronous step after its I/O completes.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::map::MapWidget;
use crate::models::{LatLng, MarkerLayer};
use crate::services::correlate::{self, Activation, MatchKind};
use crate::services::deep_link::DeepLink;
use crate::services::loader::{load_file, FileSource};
use crate::services::readiness::{self, Readiness};
use crate::services::reconcile::{self, ReconcileOutcome};
use crate::services::registry::CategoryRegistry;
use crate::services::store::{StoreError, VisibilityStore};

/// Shell-side state for one map view.
pub struct Session<M: MapWidget> {
    registry: Rc<CategoryRegistry>,
    store: Rc<RefCell<VisibilityStore>>,
    map: Rc<RefCell<M>>,
}

impl<M: MapWidget + 'static> Session<M> {
    /// Registers every registry file on a fresh store and reconciles once.
    pub fn new(registry: CategoryRegistry, map: M) -> Result<Self, StoreError> {
        let mut store = VisibilityStore::new(&registry);
        for group in registry.groups() {
            for file in &group.files {
                store.register_file(&file.id, &group.key)?;
            }
        }

        let mut map = map;
        reconcile::reconcile_all(&store, &mut map);

        Ok(Self {
            registry: Rc::new(registry),
            store: Rc::new(RefCell::new(store)),
            map: Rc::new(RefCell::new(map)),
        })
    }

    /// Starts one load task per registered file on the current `LocalSet`.
    ///
    /// Each task settles its file exactly once: ready with a layer (and its
    /// group reconciled) or failed. Must be called from within a `LocalSet`.
    pub fn load_all<S: FileSource + 'static>(&self, source: Rc<S>) -> Vec<JoinHandle<()>> {
        let file_ids: Vec<String> = self
            .store
            .borrow()
            .files()
            .map(|e| e.file_id().to_string())
            .collect();

        file_ids
            .into_iter()
            .map(|file_id| {
                let source = Rc::clone(&source);
                let registry = Rc::clone(&self.registry);
                let store = Rc::clone(&self.store);
                let map = Rc::clone(&self.map);

                tokio::task::spawn_local(async move {
                    let Some(style) = registry.style_of(&file_id) else {
                        warn!(file = %file_id, "no style for file, skipping load");
                        return;
                    };
                    let result = load_file(source.as_ref(), &file_id, style).await;
                    settle(&store, &map, &file_id, result);
                })
            })
            .collect()
    }

    /// Waits for every file to load, bounded by `timeout`.
    pub async fn wait_all_ready(&self, timeout: Duration, poll_interval: Duration) -> Readiness {
        readiness::wait_all_ready(&self.store, timeout, poll_interval).await
    }

    /// Settles `file_id` as ready with `layer` and reconciles its group.
    pub fn mark_ready(
        &self,
        file_id: &str,
        layer: MarkerLayer,
    ) -> Result<ReconcileOutcome, StoreError> {
        let mut store = self.store.borrow_mut();
        let mut map = self.map.borrow_mut();
        reconcile::mark_ready(&mut store, &mut *map, file_id, layer)
    }

    /// Per-file toggle.
    pub fn set_file_visible(
        &self,
        file_id: &str,
        visible: bool,
    ) -> Result<ReconcileOutcome, StoreError> {
        let mut store = self.store.borrow_mut();
        let mut map = self.map.borrow_mut();
        reconcile::set_file_visible(&mut store, &mut *map, file_id, visible)
    }

    /// Group toggle.
    pub fn set_group_enabled(
        &self,
        group_key: &str,
        enabled: bool,
    ) -> Result<ReconcileOutcome, StoreError> {
        let mut store = self.store.borrow_mut();
        let mut map = self.map.borrow_mut();
        reconcile::set_group_enabled(&mut store, &mut *map, group_key, enabled)
    }

    /// Changes the map zoom and forwards the change to zoom-gated groups.
    pub fn zoom_to(&self, zoom: u8) -> ReconcileOutcome {
        self.map.borrow_mut().set_zoom(zoom);
        self.on_zoom_changed()
    }

    /// Moves the view and forwards the zoom change.
    pub fn set_view(&self, center: LatLng, zoom: u8) -> ReconcileOutcome {
        self.map.borrow_mut().set_view(center, zoom);
        self.on_zoom_changed()
    }

    /// Reconciles zoom-gated groups at the map's current zoom.
    pub fn on_zoom_changed(&self) -> ReconcileOutcome {
        let store = self.store.borrow();
        let mut map = self.map.borrow_mut();
        let zoom = map.current_zoom();
        reconcile::on_zoom_changed(&store, &mut *map, zoom)
    }

    /// Resolves a deep link against the attached layers.
    ///
    /// Activation may raise the zoom, which opens zoom gates; those groups
    /// are reconciled before returning.
    pub fn resolve(
        &self,
        link: &DeepLink,
        radius_m: f64,
        focus_zoom: u8,
    ) -> Option<(MatchKind, Activation)> {
        let found = {
            let store = self.store.borrow();
            let mut map = self.map.borrow_mut();
            correlate::resolve(&store, &mut *map, link, radius_m, focus_zoom)
        };
        if found.is_some() {
            self.on_zoom_changed();
        }
        found
    }

    /// Returns true if `file_id` has a layer currently on the map.
    #[must_use]
    pub fn is_attached(&self, file_id: &str) -> bool {
        let store = self.store.borrow();
        let map = self.map.borrow();
        store
            .file(file_id)
            .and_then(|e| e.layer())
            .is_some_and(|layer| map.is_attached(layer.id()))
    }

    /// The category registry this session was built from.
    #[must_use]
    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Borrows the visibility store.
    #[must_use]
    pub fn store(&self) -> Ref<'_, VisibilityStore> {
        self.store.borrow()
    }

    /// Borrows the map widget.
    #[must_use]
    pub fn map(&self) -> Ref<'_, M> {
        self.map.borrow()
    }
}

/// Records the outcome of one file load.
fn settle<M: MapWidget, E: std::fmt::Display>(
    store: &RefCell<VisibilityStore>,
    map: &RefCell<M>,
    file_id: &str,
    result: Result<MarkerLayer, E>,
) {
    let mut store = store.borrow_mut();
    match result {
        Ok(layer) => {
            let count = layer.markers().len();
            let mut map = map.borrow_mut();
            // Errors are logged by mark_ready
            if reconcile::mark_ready(&mut store, &mut *map, file_id, layer).is_ok() {
                info!(file = file_id, placemarks = count, "loaded");
            }
        }
        Err(e) => {
            warn!(file = file_id, "load failed: {e}");
            if let Err(e) = store.mark_failed(file_id) {
                warn!(file = file_id, "dropping failure callback: {e}");
            }
        }
    }
}
