//! Category groups for organizing KML data files into togglable sets.

use crate::models::RgbColor;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Icon used for files that do not name one.
pub const DEFAULT_ICON: &str = "place";

/// One data file within a category group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Stable identifier: the source filename without the `.kml` extension
    pub id: String,
    /// Material Symbols icon name for the file's markers
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Marker color; falls back to the shared palette when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<RgbColor>,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

impl FileSpec {
    /// Creates a file spec with the default icon and palette color.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            icon: default_icon(),
            color: None,
        }
    }

    /// Sets the icon name.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Sets an explicit marker color.
    #[must_use]
    pub const fn with_color(mut self, color: RgbColor) -> Self {
        self.color = Some(color);
        self
    }
}

/// A named collection of data files toggled together by one checkbox.
///
/// # Validation
///
/// - Key must be non-empty and kebab-case (lowercase ASCII, digits, hyphens)
/// - Title must be non-empty
/// - File ids must be unique within the group (uniqueness across groups is
///   checked by the registry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Unique identifier (e.g., "shoubou", "support")
    pub key: String,
    /// Display label
    pub title: String,
    /// Initial value of the group's user-enabled flag
    #[serde(default)]
    pub default_enabled: bool,
    /// Minimum map zoom at which members may be shown; `None` means ungated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_gate: Option<u8>,
    /// Whether the list page shows this group's files
    #[serde(default = "default_listed")]
    pub listed: bool,
    /// Member files in display order
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

const fn default_listed() -> bool {
    true
}

impl CategoryGroup {
    /// Creates a new, ungated, initially disabled group with validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use hazardmap::models::CategoryGroup;
    ///
    /// let group = CategoryGroup::new("support", "Support bases").unwrap();
    /// assert!(!group.is_zoom_gated());
    /// ```
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let title = title.into();

        Self::validate_key(&key)?;
        Self::validate_title(&title)?;

        Ok(Self {
            key,
            title,
            default_enabled: false,
            zoom_gate: None,
            listed: true,
            files: Vec::new(),
        })
    }

    /// Sets the initial user-enabled flag.
    #[must_use]
    pub const fn enabled_by_default(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Gates the group's members behind a minimum zoom level.
    #[must_use]
    pub const fn with_zoom_gate(mut self, threshold: u8) -> Self {
        self.zoom_gate = Some(threshold);
        self
    }

    /// Hides the group's files from the list page.
    #[must_use]
    pub const fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    /// Appends a member file.
    #[must_use]
    pub fn with_file(mut self, file: FileSpec) -> Self {
        self.files.push(file);
        self
    }

    /// Returns true if the group is zoom-gated.
    #[must_use]
    pub const fn is_zoom_gated(&self) -> bool {
        self.zoom_gate.is_some()
    }

    /// Returns true if `file_id` is a member of this group.
    #[must_use]
    pub fn contains(&self, file_id: &str) -> bool {
        self.files.iter().any(|f| f.id == file_id)
    }

    /// Validates the group's own fields and member uniqueness.
    pub fn validate(&self) -> Result<()> {
        Self::validate_key(&self.key)?;
        Self::validate_title(&self.title)?;

        for (idx, file) in self.files.iter().enumerate() {
            if file.id.trim().is_empty() {
                anyhow::bail!("Group '{}' has a file with an empty id", self.key);
            }
            if self.files[..idx].iter().any(|f| f.id == file.id) {
                anyhow::bail!("Group '{}' lists file '{}' twice", self.key, file.id);
            }
        }

        Ok(())
    }

    /// Validates group key format (kebab-case).
    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            anyhow::bail!("Group key cannot be empty");
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            anyhow::bail!("Group key '{key}' must be kebab-case (lowercase, hyphens, and digits only)");
        }

        if key.starts_with('-') || key.ends_with('-') {
            anyhow::bail!("Group key '{key}' cannot start or end with a hyphen");
        }

        Ok(())
    }

    fn validate_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            anyhow::bail!("Group title cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let group = CategoryGroup::new("shoubou", "Fire water").unwrap();
        assert_eq!(group.key, "shoubou");
        assert!(!group.default_enabled);
        assert!(group.listed);
        assert!(group.files.is_empty());
    }

    #[test]
    fn test_validate_key() {
        assert!(CategoryGroup::validate_key("support").is_ok());
        assert!(CategoryGroup::validate_key("fire-water-2").is_ok());

        assert!(CategoryGroup::validate_key("").is_err());
        assert!(CategoryGroup::validate_key("Support").is_err());
        assert!(CategoryGroup::validate_key("fire water").is_err());
        assert!(CategoryGroup::validate_key("-support").is_err());
        assert!(CategoryGroup::validate_key("support-").is_err());
    }

    #[test]
    fn test_builder_flags() {
        let group = CategoryGroup::new("shoubou", "Fire water")
            .unwrap()
            .with_zoom_gate(16)
            .unlisted()
            .with_file(FileSpec::new("防火水槽").with_icon("crop_square"));

        assert!(group.is_zoom_gated());
        assert_eq!(group.zoom_gate, Some(16));
        assert!(!group.listed);
        assert!(group.contains("防火水槽"));
        assert!(!group.contains("地上式"));
        assert_eq!(group.files[0].icon, "crop_square");
    }

    #[test]
    fn test_validate_rejects_duplicate_member() {
        let group = CategoryGroup::new("support", "Support")
            .unwrap()
            .with_file(FileSpec::new("a"))
            .with_file(FileSpec::new("a"));
        assert!(group.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let group: CategoryGroup = toml::from_str(
            r#"
            key = "support"
            title = "Support"
            files = [{ id = "医療機関" }]
            "#,
        )
        .unwrap();

        assert!(!group.default_enabled);
        assert!(group.listed);
        assert_eq!(group.zoom_gate, None);
        assert_eq!(group.files[0].icon, DEFAULT_ICON);
        assert_eq!(group.files[0].color, None);
    }
}
