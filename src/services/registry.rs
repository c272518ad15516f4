//! Category registry: the static mapping of data files to groups and styles.
//!
//! The registry is pure data. Lookups that miss return `None`; nothing here
//! fails after construction.

use std::collections::HashMap;

use thiserror::Error;

use crate::constants::{FIRE_WATER_ZOOM_THRESHOLD, MARKER_COLORS};
use crate::models::{CategoryGroup, FileSpec, MarkerStyle, RgbColor};

/// Configuration errors detected when building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A group failed its own validation.
    #[error("invalid group: {0}")]
    InvalidGroup(String),
    /// Two groups share a key.
    #[error("group key '{0}' is defined more than once")]
    DuplicateGroup(String),
    /// A file id is listed under more than one group.
    #[error("file '{file_id}' belongs to both '{first}' and '{second}'")]
    FileInMultipleGroups {
        /// The repeated file id
        file_id: String,
        /// Group that listed it first
        first: String,
        /// Group that listed it again
        second: String,
    },
}

/// Validated, read-only set of category groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    groups: Vec<CategoryGroup>,
    /// file id -> (group index, global registration index)
    file_index: HashMap<String, (usize, usize)>,
}

impl CategoryRegistry {
    /// Builds a registry, checking that every file belongs to exactly one group.
    pub fn new(groups: Vec<CategoryGroup>) -> Result<Self, RegistryError> {
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for (group_idx, group) in groups.iter().enumerate() {
            group
                .validate()
                .map_err(|e| RegistryError::InvalidGroup(e.to_string()))?;

            if groups[..group_idx].iter().any(|g| g.key == group.key) {
                return Err(RegistryError::DuplicateGroup(group.key.clone()));
            }

            for file in &group.files {
                if let Some(first) = seen.insert(&file.id, &group.key) {
                    return Err(RegistryError::FileInMultipleGroups {
                        file_id: file.id.clone(),
                        first: first.to_string(),
                        second: group.key.clone(),
                    });
                }
            }
        }

        Ok(Self::indexed(groups))
    }

    /// Indexes groups that are already known to be valid.
    fn indexed(groups: Vec<CategoryGroup>) -> Self {
        let file_index = groups
            .iter()
            .enumerate()
            .flat_map(|(group_idx, g)| g.files.iter().map(move |f| (group_idx, f)))
            .enumerate()
            .map(|(global, (group_idx, f))| (f.id.clone(), (group_idx, global)))
            .collect();

        Self { groups, file_index }
    }

    /// The reference configuration: fire-water sources (zoom-gated, off by
    /// default, hidden from the list page) and support bases (on by default).
    ///
    /// The table is static and checked by `new` in the unit tests.
    #[must_use]
    pub fn reference() -> Self {
        Self::indexed(reference_groups())
    }

    /// Returns all groups in configuration order.
    #[must_use]
    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    /// Looks up a group by key.
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&CategoryGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Every file id, group order then member order.
    #[must_use]
    pub fn list_all_files(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.files.iter().map(|f| f.id.as_str()))
            .collect()
    }

    /// File ids of listed groups only, in registry order.
    #[must_use]
    pub fn listed_files(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| g.listed)
            .flat_map(|g| g.files.iter().map(|f| f.id.as_str()))
            .collect()
    }

    /// Returns the group owning `file_id`.
    #[must_use]
    pub fn group_of(&self, file_id: &str) -> Option<&CategoryGroup> {
        self.file_index
            .get(file_id)
            .map(|&(group_idx, _)| &self.groups[group_idx])
    }

    /// Returns the file spec for `file_id`.
    #[must_use]
    pub fn file(&self, file_id: &str) -> Option<&FileSpec> {
        self.group_of(file_id)?.files.iter().find(|f| f.id == file_id)
    }

    /// Resolves the marker style for `file_id`.
    ///
    /// Files without an explicit color take the palette entry at their
    /// global registration index.
    #[must_use]
    pub fn style_of(&self, file_id: &str) -> Option<MarkerStyle> {
        let &(_, global) = self.file_index.get(file_id)?;
        let spec = self.file(file_id)?;
        Some(MarkerStyle {
            icon: spec.icon.clone(),
            color: spec
                .color
                .unwrap_or(MARKER_COLORS[global % MARKER_COLORS.len()]),
        })
    }

    /// Number of files across all groups.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.file_index.len()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::reference()
    }
}

/// Group definitions of the reference deployment.
#[must_use]
pub fn reference_groups() -> Vec<CategoryGroup> {
    let file = |id: &str, icon: &str, (r, g, b): (u8, u8, u8)| {
        FileSpec::new(id)
            .with_icon(icon)
            .with_color(RgbColor::new(r, g, b))
    };

    vec![
        CategoryGroup {
            key: "shoubou".to_string(),
            title: "消防水利（ズーム時のみ表示）".to_string(),
            default_enabled: false,
            zoom_gate: Some(FIRE_WATER_ZOOM_THRESHOLD),
            listed: false,
            files: vec![
                file("防火水槽", "crop_square", (0x49, 0x8a, 0xeb)),
                file("地上式", "fire_hydrant", (0xeb, 0xcb, 0x3d)),
                file("地下式", "poker_chip", (0xf5, 0x85, 0x52)),
            ],
        },
        CategoryGroup {
            key: "support".to_string(),
            title: "受援情報".to_string(),
            default_enabled: true,
            zoom_gate: None,
            listed: true,
            files: vec![
                file("拠点【航空部隊】", "flight", (0x59, 0xb6, 0x5e)),
                file("拠点【地上部隊】", "fire_truck", (0x66, 0x69, 0xf7)),
                file("宿営可能地", "hotel", (0xf3, 0x9c, 0x12)),
                file("前進拠点", "flag", (0xe6, 0x7e, 0x22)),
                file("ヘリ離発着", "helicopter", (0x7f, 0x88, 0x92)),
                file("医療機関", "local_hospital", (0xf5, 0x64, 0x54)),
                file("給油【航空部隊】", "local_gas_station", (0x16, 0xa0, 0x85)),
                file("給油【地上部隊】", "local_gas_station", (0x29, 0x80, 0xb9)),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(key: &str, files: &[&str]) -> CategoryGroup {
        files.iter().fold(
            CategoryGroup::new(key, key.to_uppercase()).unwrap(),
            |g, f| g.with_file(FileSpec::new(*f)),
        )
    }

    #[test]
    fn test_reference_groups_are_valid() {
        let checked = CategoryRegistry::new(reference_groups()).unwrap();
        assert_eq!(checked, CategoryRegistry::reference());
    }

    #[test]
    fn test_reference_registry() {
        let registry = CategoryRegistry::reference();
        assert_eq!(registry.groups().len(), 2);
        assert_eq!(registry.file_count(), 11);

        let all = registry.list_all_files();
        assert_eq!(all.first(), Some(&"防火水槽"));
        assert_eq!(all.last(), Some(&"給油【地上部隊】"));

        let shoubou = registry.group("shoubou").unwrap();
        assert_eq!(shoubou.zoom_gate, Some(16));
        assert!(!shoubou.default_enabled);

        assert_eq!(registry.group_of("医療機関").unwrap().key, "support");
        assert_eq!(registry.listed_files().len(), 8);
        assert!(!registry.listed_files().contains(&"地上式"));
    }

    #[test]
    fn test_lookup_misses_return_none() {
        let registry = CategoryRegistry::reference();
        assert!(registry.group("nope").is_none());
        assert!(registry.group_of("nope").is_none());
        assert!(registry.style_of("nope").is_none());
    }

    #[test]
    fn test_style_falls_back_to_palette_by_global_index() {
        let registry =
            CategoryRegistry::new(vec![group("a", &["a1", "a2"]), group("b", &["b1"])]).unwrap();

        assert_eq!(registry.style_of("a1").unwrap().color, MARKER_COLORS[0]);
        assert_eq!(registry.style_of("b1").unwrap().color, MARKER_COLORS[2]);
        assert_eq!(registry.style_of("b1").unwrap().icon, "place");
    }

    #[test]
    fn test_explicit_style_wins() {
        let registry = CategoryRegistry::reference();
        let style = registry.style_of("地上式").unwrap();
        assert_eq!(style.icon, "fire_hydrant");
        assert_eq!(style.color.to_hex(), "#ebcb3d");
    }

    #[test]
    fn test_file_in_two_groups_is_rejected() {
        let err = CategoryRegistry::new(vec![group("a", &["x"]), group("b", &["x"])]).unwrap_err();
        assert!(matches!(err, RegistryError::FileInMultipleGroups { .. }));
    }

    #[test]
    fn test_duplicate_group_key_is_rejected() {
        let err = CategoryRegistry::new(vec![group("a", &["x"]), group("a", &["y"])]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateGroup(_)));
    }
}
