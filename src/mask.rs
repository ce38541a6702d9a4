//! Per-pixel color masks.
//!
//! A [`ColorMask`] is applied to every pixel of a source image before it is
//! composited. Size variants can carry their own mask (e.g. to render a
//! disabled state), and the creator always runs [`nudge_transparency_key`]
//! so that source pixels equal to the transparency key survive the fill.

use std::fmt;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use palette::{Hsl, IntoColor, Srgb};

use crate::icon::TransparencyKey;

// ============================================================================
// ColorMask
// ============================================================================

/// A shared per-pixel color transform.
#[derive(Clone)]
pub struct ColorMask {
    name: &'static str,
    apply: Arc<dyn Fn(&mut Rgba<u8>) + Send + Sync>,
}

impl ColorMask {
    /// Wraps an arbitrary per-pixel transform.
    pub fn new(f: impl Fn(&mut Rgba<u8>) + Send + Sync + 'static) -> Self {
        Self::named("custom", f)
    }

    fn named(name: &'static str, f: impl Fn(&mut Rgba<u8>) + Send + Sync + 'static) -> Self {
        Self {
            name,
            apply: Arc::new(f),
        }
    }

    /// Removes saturation, keeping lightness and alpha.
    ///
    /// Used for disabled button states.
    pub fn grayscale() -> Self {
        Self::named("grayscale", |pixel| {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                return;
            }

            let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
            let mut hsl: Hsl = rgb.into_color();
            hsl.saturation = 0.0;
            let gray: Srgb = hsl.into_color();

            pixel.0 = [
                (gray.red * 255.0).round() as u8,
                (gray.green * 255.0).round() as u8,
                (gray.blue * 255.0).round() as u8,
                a,
            ];
        })
    }

    /// Blends every channel towards white by `factor` (0.0-1.0).
    pub fn fade(factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        Self::named("fade", move |pixel| {
            let lift = |c: u8| -> u8 { (c as f32 + (255.0 - c as f32) * factor).round() as u8 };
            let [r, g, b, a] = pixel.0;
            pixel.0 = [lift(r), lift(g), lift(b), a];
        })
    }

    /// Replaces every pixel exactly equal to `from` with `to`.
    pub fn replace(from: Rgba<u8>, to: Rgba<u8>) -> Self {
        Self::named("replace", move |pixel| {
            if *pixel == from {
                *pixel = to;
            }
        })
    }

    /// Returns a mask running `self` and then `next` on every pixel.
    pub fn then(self, next: ColorMask) -> Self {
        Self::named("chained", move |pixel| {
            self.apply(pixel);
            next.apply(pixel);
        })
    }

    /// Short name of the mask, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies the mask to a single pixel.
    pub fn apply(&self, pixel: &mut Rgba<u8>) {
        (self.apply)(pixel)
    }
}

impl fmt::Debug for ColorMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ColorMask").field(&self.name).finish()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Returns a copy of `image` with `mask` applied to every pixel.
pub fn replace_color(image: &RgbaImage, mask: &ColorMask) -> RgbaImage {
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        mask.apply(pixel);
    }
    result
}

/// Moves the blue channel of every pixel equal to `key` by one unit.
///
/// After the canvas is filled with the key color, source pixels that had
/// exactly that color would otherwise become indistinguishable from the
/// background once the bitmap is saved without alpha.
pub fn nudge_transparency_key(image: &RgbaImage, key: TransparencyKey) -> RgbaImage {
    let mut result = image.clone();
    let key = key.to_array();

    for rgba in result.chunks_exact_mut(4) {
        if *rgba == key {
            rgba[2] = if rgba[2] == 0 { 1 } else { rgba[2] - 1 };
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
