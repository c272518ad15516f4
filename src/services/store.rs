//! Visibility state store: per-file and per-group session state.
//!
//! The store only records state. Deciding which layers are attached to the
//! map is the reconciliation engine's job (see `services::reconcile`); the
//! transitions here never touch the map.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::MarkerLayer;
use crate::services::registry::CategoryRegistry;

/// Errors raised by store transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The file id is already registered in this session.
    #[error("file '{0}' is already registered")]
    DuplicateFile(String),
    /// The file id is not tracked by this session.
    #[error("file '{0}' is not registered")]
    UnknownFile(String),
    /// The group key is not part of the registry.
    #[error("group '{0}' does not exist")]
    UnknownGroup(String),
    /// A second load completion arrived for a file that already settled.
    #[error("file '{0}' has already settled")]
    AlreadySettled(String),
}

/// Load progress of a file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Load initiated, not yet settled.
    Pending,
    /// Parsed and layer constructed.
    Ready,
    /// Fetch or parse failed; the file never becomes ready.
    Failed,
}

/// Session state of one data file.
#[derive(Debug)]
pub struct FileEntry {
    file_id: String,
    group_key: String,
    layer: Option<MarkerLayer>,
    state: LoadState,
    visible: bool,
}

impl FileEntry {
    /// Returns the file id.
    #[must_use]
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Returns the owning group key.
    #[must_use]
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    /// Returns the marker layer once the load has succeeded.
    #[must_use]
    pub const fn layer(&self) -> Option<&MarkerLayer> {
        self.layer.as_ref()
    }

    /// Returns true once the file's layer is constructed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    /// Returns the load state.
    #[must_use]
    pub const fn load_state(&self) -> LoadState {
        self.state
    }

    /// Returns the user's per-file toggle state.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Session state of one category group.
#[derive(Debug, Clone)]
pub struct GroupState {
    key: String,
    title: String,
    default_enabled: bool,
    user_enabled: bool,
    zoom_gate: Option<u8>,
    members: Vec<String>,
}

impl GroupState {
    /// Returns the group key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the group-level toggle state.
    #[must_use]
    pub const fn is_user_enabled(&self) -> bool {
        self.user_enabled
    }

    /// Returns true if the group is zoom-gated.
    #[must_use]
    pub const fn is_zoom_gated(&self) -> bool {
        self.zoom_gate.is_some()
    }

    /// Returns the zoom threshold, if gated.
    #[must_use]
    pub const fn zoom_threshold(&self) -> Option<u8> {
        self.zoom_gate
    }

    /// Returns true if members may be shown at `zoom`.
    #[must_use]
    pub fn gate_open(&self, zoom: u8) -> bool {
        self.zoom_gate.map_or(true, |threshold| zoom >= threshold)
    }

    /// Returns member file ids in registration order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

/// Owner of every `FileEntry` and `GroupState` for one session.
#[derive(Debug, Default)]
pub struct VisibilityStore {
    files: Vec<FileEntry>,
    file_index: HashMap<String, usize>,
    groups: Vec<GroupState>,
}

impl VisibilityStore {
    /// Creates a store with one group state per registry group and no files.
    #[must_use]
    pub fn new(registry: &CategoryRegistry) -> Self {
        let groups = registry
            .groups()
            .iter()
            .map(|g| GroupState {
                key: g.key.clone(),
                title: g.title.clone(),
                default_enabled: g.default_enabled,
                user_enabled: g.default_enabled,
                zoom_gate: g.zoom_gate,
                members: Vec::new(),
            })
            .collect();

        Self {
            files: Vec::new(),
            file_index: HashMap::new(),
            groups,
        }
    }

    /// Registers a file under `group_key`, visible iff the group is enabled
    /// by default.
    pub fn register_file(
        &mut self,
        file_id: &str,
        group_key: &str,
    ) -> Result<&FileEntry, StoreError> {
        if self.file_index.contains_key(file_id) {
            return Err(StoreError::DuplicateFile(file_id.to_string()));
        }
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.key == group_key)
            .ok_or_else(|| StoreError::UnknownGroup(group_key.to_string()))?;

        group.members.push(file_id.to_string());
        let entry = FileEntry {
            file_id: file_id.to_string(),
            group_key: group_key.to_string(),
            layer: None,
            state: LoadState::Pending,
            visible: group.default_enabled,
        };

        let idx = self.files.len();
        self.files.push(entry);
        self.file_index.insert(file_id.to_string(), idx);
        Ok(&self.files[idx])
    }

    /// Settles a file as ready with its layer. Returns the owning group key.
    pub fn mark_ready(&mut self, file_id: &str, layer: MarkerLayer) -> Result<String, StoreError> {
        let entry = self.pending_entry_mut(file_id)?;
        entry.layer = Some(layer);
        entry.state = LoadState::Ready;
        Ok(entry.group_key.clone())
    }

    /// Settles a file as failed: it keeps no layer and never becomes ready.
    pub fn mark_failed(&mut self, file_id: &str) -> Result<(), StoreError> {
        let entry = self.pending_entry_mut(file_id)?;
        entry.state = LoadState::Failed;
        Ok(())
    }

    fn pending_entry_mut(&mut self, file_id: &str) -> Result<&mut FileEntry, StoreError> {
        let entry = self
            .file_mut(file_id)
            .ok_or_else(|| StoreError::UnknownFile(file_id.to_string()))?;
        if entry.state != LoadState::Pending {
            return Err(StoreError::AlreadySettled(file_id.to_string()));
        }
        Ok(entry)
    }

    /// Sets a file's toggle flag. Returns the owning group key.
    pub fn set_visible(&mut self, file_id: &str, visible: bool) -> Result<String, StoreError> {
        let entry = self
            .file_mut(file_id)
            .ok_or_else(|| StoreError::UnknownFile(file_id.to_string()))?;
        entry.visible = visible;
        Ok(entry.group_key.clone())
    }

    /// Sets a group's toggle and forces every member's flag to match.
    pub fn set_group_enabled(&mut self, group_key: &str, enabled: bool) -> Result<(), StoreError> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.key == group_key)
            .ok_or_else(|| StoreError::UnknownGroup(group_key.to_string()))?;
        group.user_enabled = enabled;

        for entry in self.files.iter_mut().filter(|e| e.group_key == group_key) {
            entry.visible = enabled;
        }
        Ok(())
    }

    /// Looks up a file entry.
    #[must_use]
    pub fn file(&self, file_id: &str) -> Option<&FileEntry> {
        self.file_index.get(file_id).map(|&idx| &self.files[idx])
    }

    fn file_mut(&mut self, file_id: &str) -> Option<&mut FileEntry> {
        let idx = *self.file_index.get(file_id)?;
        self.files.get_mut(idx)
    }

    /// Returns file entries in registration order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter()
    }

    /// Looks up a group state.
    #[must_use]
    pub fn group(&self, group_key: &str) -> Option<&GroupState> {
        self.groups.iter().find(|g| g.key == group_key)
    }

    /// Returns group states in registry order.
    #[must_use]
    pub fn groups(&self) -> &[GroupState] {
        &self.groups
    }

    /// Returns the entries of a group's members in registration order.
    pub fn members_of<'a>(&'a self, group: &'a GroupState) -> impl Iterator<Item = &'a FileEntry> {
        group.members.iter().filter_map(|id| self.file(id))
    }

    /// Number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no files are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True only when at least one file is registered and every file is ready.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        !self.files.is_empty() && self.files.iter().all(FileEntry::is_ready)
    }

    /// Number of files that are ready.
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.files.iter().filter(|e| e.is_ready()).count()
    }
}
