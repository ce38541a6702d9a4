//! Serializable icon manifest.
//!
//! An [`IconManifest`] describes a batch of icons in JSON: where their
//! sources live, which sizes to produce, and which icons are combined into
//! strips. It also carries the [`CreatorOptions`] used to build the
//! [`IconsCreator`].
//!
//! # Example
//!
//! ```
//! use xcad_icons::{IconManifest, IconSettings, SizeSettings, MaskSettings};
//!
//! let manifest = IconManifest::new()
//!     .with_icon(IconSettings::new("open").with_size(SizeSettings::new("open.svg", 20, "open_20.bmp")))
//!     .with_icon(IconSettings::new("open-disabled").with_size(
//!         SizeSettings::new("open.svg", 20, "open_disabled_20.bmp").with_mask(MaskSettings::Grayscale),
//!     ))
//!     .with_group(vec![0, 1]);
//!
//! let json = manifest.to_json().unwrap();
//! let restored = IconManifest::from_json(&json).unwrap();
//! assert_eq!(restored.groups, vec![vec![0, 1]]);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::creator::IconsCreator;
use crate::error::{IconError, Result};
use crate::icon::{IconDefinition, IconSize, SizePx, TransparencyKey};
use crate::mask::ColorMask;
use crate::source::IconSource;

// ============================================================================
// Creator Options
// ============================================================================

/// Settings for building an [`IconsCreator`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CreatorOptions {
    /// Output directory. A unique temp directory is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons_dir: Option<PathBuf>,

    /// Keep produced files when the creator is released.
    #[serde(default)]
    pub keep_icons: bool,
}

// ============================================================================
// Icon Settings
// ============================================================================

/// Serializable version of a [`ColorMask`].
///
/// ```json
/// "grayscale"
/// // or
/// { "fade": 0.5 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum MaskSettings {
    Grayscale,
    Fade(f32),
}

impl From<MaskSettings> for ColorMask {
    fn from(settings: MaskSettings) -> Self {
        match settings {
            MaskSettings::Grayscale => ColorMask::grayscale(),
            MaskSettings::Fade(factor) => ColorMask::fade(factor),
        }
    }
}

/// Serializable settings for one size variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SizeSettings {
    /// Source image path, relative to the manifest directory.
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub offset: u32,
    /// Output file name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskSettings>,
}

impl SizeSettings {
    /// Creates square size settings with no offset or mask.
    pub fn new(source: impl Into<PathBuf>, side: u32, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            width: side,
            height: side,
            offset: 0,
            name: name.into(),
            mask: None,
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_mask(mut self, mask: MaskSettings) -> Self {
        self.mask = Some(mask);
        self
    }
}

/// Serializable settings for one icon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IconSettings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,

    /// `[r, g, b, a]`, defaults to opaque white.
    #[serde(default)]
    #[cfg_attr(feature = "jsonschema", schemars(with = "[u8; 4]"))]
    pub transparency_key: TransparencyKey,

    pub sizes: Vec<SizeSettings>,
}

impl IconSettings {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_transparency_key(mut self, key: TransparencyKey) -> Self {
        self.transparency_key = key;
        self
    }

    pub fn with_size(mut self, size: SizeSettings) -> Self {
        self.sizes.push(size);
        self
    }

    /// Reads the sources and builds the icon definition.
    fn load(&self, base_dir: &Path, index: usize) -> Result<IconDefinition> {
        let label = if self.label.is_empty() {
            format!("icon #{index}")
        } else {
            self.label.clone()
        };

        let mut icon = IconDefinition::new(label).with_transparency_key(self.transparency_key);

        for size in &self.sizes {
            let source = IconSource::from_file(base_dir.join(&size.source))?;
            let mut variant = IconSize::new(source, SizePx::new(size.width, size.height), &size.name)
                .with_offset(size.offset);
            if let Some(mask) = size.mask {
                variant = variant.with_mask(mask.into());
            }
            icon.add_size(variant);
        }

        Ok(icon)
    }
}

// ============================================================================
// IconManifest
// ============================================================================

/// A batch of icons to convert.
///
/// # JSON Format
///
/// ```json
/// {
///   "options": { "iconsDir": "out", "keepIcons": true },
///   "icons": [
///     {
///       "label": "open",
///       "transparencyKey": [255, 255, 255, 255],
///       "sizes": [
///         { "source": "open.png", "width": 20, "height": 20, "name": "open_20.bmp" }
///       ]
///     }
///   ],
///   "groups": [[0, 1]]
/// }
/// ```
///
/// Icons referenced by a group are rendered only as part of that strip;
/// every other icon is converted on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IconManifest {
    #[serde(default)]
    pub options: CreatorOptions,

    #[serde(default)]
    pub icons: Vec<IconSettings>,

    /// Indices into `icons`, one list per strip.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Vec<usize>>,
}

impl IconManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: CreatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_icon(mut self, icon: IconSettings) -> Self {
        self.icons.push(icon);
        self
    }

    pub fn with_group(mut self, indices: Vec<usize>) -> Self {
        self.groups.push(indices);
        self
    }

    /// Serializes the manifest to a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the manifest to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a manifest from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a manifest file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Loads every icon, resolving relative source paths against `base_dir`.
    pub fn load_icons(&self, base_dir: &Path) -> Result<Vec<IconDefinition>> {
        self.icons
            .iter()
            .enumerate()
            .map(|(index, icon)| icon.load(base_dir, index))
            .collect()
    }

    /// Converts all icons and groups with `creator`.
    ///
    /// Returns paths of the standalone icons in manifest order followed by the
    /// paths of each group.
    pub fn convert(&self, creator: &IconsCreator, base_dir: &Path) -> Result<Vec<PathBuf>> {
        let icons = self.load_icons(base_dir)?;
        let mut grouped = HashSet::new();

        for (group_index, group) in self.groups.iter().enumerate() {
            for &index in group {
                if index >= icons.len() {
                    return Err(IconError::InvalidArgument(format!(
                        "group {group_index} references icon {index}, manifest has {}",
                        icons.len()
                    )));
                }
                grouped.insert(index);
            }
        }

        let mut paths = Vec::new();

        for (index, icon) in icons.iter().enumerate() {
            if !grouped.contains(&index) {
                paths.extend(creator.convert_icon(icon)?);
            }
        }

        for group in &self.groups {
            let members: Vec<&IconDefinition> = group.iter().map(|&i| &icons[i]).collect();
            paths.extend(creator.convert_icons_group(&members)?);
        }

        debug!(files = paths.len(), "manifest converted");
        Ok(paths)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, color: [u8; 4]) {
        RgbaImage::from_pixel(4, 4, Rgba(color))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn manifest_json_format() {
        let manifest = IconManifest::new()
            .with_options(CreatorOptions {
                icons_dir: Some("out".into()),
                keep_icons: true,
            })
            .with_icon(
                IconSettings::new("open")
                    .with_size(SizeSettings::new("open.png", 20, "open_20.bmp").with_offset(1)),
            );

        let json = manifest.to_json_pretty().unwrap();

        assert!(json.contains("\"iconsDir\""));
        assert!(json.contains("\"keepIcons\""));
        assert!(json.contains("\"transparencyKey\": ["));
        assert!(!json.contains("\"groups\""));
        assert!(!json.contains("\"mask\""));
    }

    #[test]
    fn manifest_parses_defaults() {
        let json = r#"{
            "icons": [
                { "sizes": [ { "source": "a.png", "width": 16, "height": 18, "name": "a.bmp",
                               "mask": { "fade": 0.25 } } ] }
            ]
        }"#;

        let manifest = IconManifest::from_json(json).unwrap();

        assert_eq!(manifest.options, CreatorOptions::default());
        let icon = &manifest.icons[0];
        assert_eq!(icon.transparency_key, TransparencyKey::WHITE);
        assert_eq!(icon.sizes[0].offset, 0);
        assert_eq!(icon.sizes[0].mask, Some(MaskSettings::Fade(0.25)));
        assert!(manifest.groups.is_empty());
    }

    #[test]
    fn mask_settings_serialization() {
        assert_eq!(
            serde_json::to_string(&MaskSettings::Grayscale).unwrap(),
            "\"grayscale\""
        );
        assert_eq!(ColorMask::from(MaskSettings::Fade(0.5)).name(), "fade");
    }

    #[test]
    fn empty_manifest_deserializes() {
        let manifest = IconManifest::from_json("{}").unwrap();
        assert!(manifest.icons.is_empty());
        assert!(manifest.options.icons_dir.is_none());
    }

    #[test]
    fn convert_splits_standalone_and_grouped_icons() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "red.png", [255, 0, 0, 255]);
        write_png(tmp.path(), "blue.png", [0, 0, 255, 255]);

        let manifest = IconManifest::new()
            .with_icon(IconSettings::new("solo").with_size(SizeSettings::new("red.png", 16, "solo.bmp")))
            .with_icon(IconSettings::new("n").with_size(SizeSettings::new("red.png", 16, "strip.bmp")))
            .with_icon(IconSettings::new("d").with_size(
                SizeSettings::new("blue.png", 16, "unused.bmp").with_mask(MaskSettings::Grayscale),
            ))
            .with_group(vec![1, 2]);

        let creator = IconsCreator::with_dir(tmp.path().join("out")).unwrap();
        let paths = manifest.convert(&creator, tmp.path()).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("solo.bmp"));
        assert!(paths[1].ends_with("strip.bmp"));
        assert_eq!(image::open(&paths[1]).unwrap().width(), 32);
    }

    #[test]
    fn convert_rejects_unknown_group_index() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "red.png", [255, 0, 0, 255]);

        let manifest = IconManifest::new()
            .with_icon(IconSettings::new("a").with_size(SizeSettings::new("red.png", 8, "a.bmp")))
            .with_group(vec![0, 3]);

        let creator = IconsCreator::with_dir(tmp.path().join("out")).unwrap();
        let err = manifest.convert(&creator, tmp.path()).unwrap_err();
        assert!(matches!(err, IconError::InvalidArgument(_)));
    }

    #[test]
    fn missing_source_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let manifest = IconManifest::new()
            .with_icon(IconSettings::new("a").with_size(SizeSettings::new("nope.png", 8, "a.bmp")));

        let err = manifest.load_icons(tmp.path()).unwrap_err();
        assert!(matches!(err, IconError::Io(_)));
    }

    #[test]
    fn from_file_reads_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("icons.json");
        std::fs::write(&path, r#"{ "options": { "keepIcons": true } }"#).unwrap();

        let manifest = IconManifest::from_file(&path).unwrap();
        assert!(manifest.options.keep_icons);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            IconManifest::from_file(&path),
            Err(IconError::Manifest(_))
        ));
    }
}
