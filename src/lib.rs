//! xcad-icons: bitmap icon generation for CAD add-in toolbars
//!
//! This crate converts icon descriptors into the bitmap files a CAD host
//! expects for toolbar buttons, command groups, task panes and feature tree
//! nodes. Each size variant is scaled to fit its slot, centered, padded with
//! the transparency key color, and saved as a 24-bit BMP. Several icons can
//! be tiled into a single horizontal strip (e.g. normal/disabled states).
//!
//! # Example
//!
//! ```
//! use xcad_icons::{presets, IconSource, IconsCreator};
//!
//! let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16">
//!     <circle cx="8" cy="8" r="6" fill="#3070c0"/></svg>"##;
//!
//! let normal = presets::command_group_icon("open", IconSource::from_svg(svg));
//! let disabled = presets::disabled_variant(&normal);
//!
//! let creator = IconsCreator::new()?;
//! let strips = creator.convert_icons_group(&[normal, disabled])?;
//! assert_eq!(strips.len(), presets::HIGH_RES_SIZES.len());
//!
//! // The working directory and its bitmaps are removed here
//! drop(creator);
//! # Ok::<(), xcad_icons::IconError>(())
//! ```
//!
//! # Manifests
//!
//! Batches of icons can be described in JSON with [`IconManifest`] and
//! converted in one call:
//!
//! ```no_run
//! use std::path::Path;
//! use xcad_icons::{IconManifest, IconsCreator};
//!
//! let manifest = IconManifest::from_file("icons.json")?;
//! let creator = IconsCreator::from_options(&manifest.options)?;
//! let paths = manifest.convert(&creator, Path::new("."))?;
//! # Ok::<(), xcad_icons::IconError>(())
//! ```

mod creator;
mod error;
mod icon;
mod manifest;
mod mask;
pub mod presets;
mod source;

pub use creator::{placement, IconsCreator};
pub use error::{IconError, Result};
pub use icon::{Icon, IconDefinition, IconSize, RectPx, SizePx, TransparencyKey};
pub use manifest::{CreatorOptions, IconManifest, IconSettings, MaskSettings, SizeSettings};
pub use mask::{nudge_transparency_key, replace_color, ColorMask};
pub use source::{render_svg, IconSource};
