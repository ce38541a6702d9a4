//! Icon descriptors.
//!
//! An icon is described by a transparency key plus an ordered list of
//! [`IconSize`] variants. Each variant names the source image, the pixel
//! size of the slot it is drawn into, the padding from the slot border and
//! the file name of the produced bitmap.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::mask::ColorMask;
use crate::source::IconSource;

/// A rectangle defined in pixel coordinates.
///
/// Used for the destination area of a scaled source inside a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the image
    pub x: u32,
    /// Y offset from the top edge of the image
    pub y: u32,
    /// Width of the rectangle
    pub width: u32,
    /// Height of the rectangle
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Creates a square size.
    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Returns true if width equals height.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

// ============================================================================
// TransparencyKey
// ============================================================================

/// Color used as the background fill of produced bitmaps.
///
/// The host treats pixels of this color as transparent. Serialized as an
/// `[r, g, b, a]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct TransparencyKey {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl TransparencyKey {
    /// Opaque white, the host's default.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba(self.to_array())
    }
}

impl Default for TransparencyKey {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 4]> for TransparencyKey {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<TransparencyKey> for [u8; 4] {
    fn from(key: TransparencyKey) -> Self {
        key.to_array()
    }
}

// ============================================================================
// IconSize
// ============================================================================

/// One size variant of an icon.
#[derive(Debug, Clone)]
pub struct IconSize {
    /// The image drawn into the slot.
    pub source: IconSource,

    /// Pixel size of the slot in the produced bitmap.
    pub target_size: SizePx,

    /// Padding between the slot border and the scaled source, on every side.
    pub offset: u32,

    /// File name of the produced bitmap, relative to the creator's directory.
    pub name: String,

    /// Optional transform applied to the source before compositing.
    pub mask: Option<ColorMask>,
}

impl IconSize {
    pub fn new(source: IconSource, target_size: SizePx, name: impl Into<String>) -> Self {
        Self {
            source,
            target_size,
            offset: 0,
            name: name.into(),
            mask: None,
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_mask(mut self, mask: ColorMask) -> Self {
        self.mask = Some(mask);
        self
    }
}

// ============================================================================
// Icon
// ============================================================================

/// A logical icon that can be converted to bitmaps.
///
/// Implement this for custom descriptors; [`IconDefinition`] is the stock
/// implementation.
pub trait Icon {
    /// Color treated as transparent in the produced bitmaps.
    fn transparency_key(&self) -> TransparencyKey;

    /// The size variants to produce, in output order.
    fn sizes(&self) -> &[IconSize];

    /// Human readable name used in error messages.
    fn label(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

impl<T: Icon + ?Sized> Icon for &T {
    fn transparency_key(&self) -> TransparencyKey {
        (**self).transparency_key()
    }

    fn sizes(&self) -> &[IconSize] {
        (**self).sizes()
    }

    fn label(&self) -> String {
        (**self).label()
    }
}

/// An icon defined by an explicit list of size variants.
#[derive(Debug, Clone, Default)]
pub struct IconDefinition {
    pub label: String,
    pub transparency_key: TransparencyKey,
    pub sizes: Vec<IconSize>,
}

impl IconDefinition {
    /// Creates an empty definition with the default (white) transparency key.
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

    pub fn with_size(mut self, size: IconSize) -> Self {
        self.sizes.push(size);
        self
    }

    /// Adds a size variant.
    pub fn add_size(&mut self, size: IconSize) {
        self.sizes.push(size);
    }

    /// Returns the number of size variants.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns true if no size variants are defined.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl Icon for IconDefinition {
    fn transparency_key(&self) -> TransparencyKey {
        self.transparency_key
    }

    fn sizes(&self) -> &[IconSize] {
        &self.sizes
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}
