//! Conversion of icon descriptors into bitmap files.
//!
//! [`IconsCreator`] owns a working directory. Every converted size variant
//! is drawn onto an opaque canvas filled with the icon's transparency key
//! and saved as a 24-bit BMP inside that directory. The directory is removed
//! when the creator is dropped unless [`IconsCreator::set_keep_icons`] was
//! called.
//!
//! # Example
//!
//! ```no_run
//! use xcad_icons::{IconDefinition, IconSize, IconSource, IconsCreator, SizePx};
//!
//! let source = IconSource::from_file("open.png")?;
//! let icon = IconDefinition::new("open")
//!     .with_size(IconSize::new(source.clone(), SizePx::square(20), "open_20.bmp"))
//!     .with_size(IconSize::new(source, SizePx::square(40), "open_40.bmp").with_offset(2));
//!
//! let mut creator = IconsCreator::new()?;
//! creator.set_keep_icons(true);
//! let paths = creator.convert_icon(&icon)?;
//! assert_eq!(paths.len(), 2);
//! # Ok::<(), xcad_icons::IconError>(())
//! ```

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, Rgba32FImage, RgbaImage};
use tracing::debug;
use uuid::Uuid;

use crate::error::{IconError, Result};
use crate::icon::{Icon, IconSize, RectPx, SizePx, TransparencyKey};
use crate::manifest::CreatorOptions;
use crate::mask::{nudge_transparency_key, replace_color};

/// A size variant resolved to a loaded image and an output path.
struct IconData {
    /// Source image with the variant's mask applied, not yet scaled.
    source: RgbaImage,
    target_path: PathBuf,
    target_size: SizePx,
    offset: u32,
    /// Drawable area left inside `target_size` after `offset`.
    fit: SizePx,
}

// ============================================================================
// IconsCreator
// ============================================================================

/// Converts [`Icon`] descriptors into bitmap files.
#[derive(Debug)]
pub struct IconsCreator {
    icons_dir: PathBuf,
    keep_icons: bool,
}

impl IconsCreator {
    /// Creates a creator writing into a new unique directory under the
    /// system temp directory.
    pub fn new() -> Result<Self> {
        Self::with_dir(std::env::temp_dir().join(Uuid::new_v4().to_string()))
    }

    /// Creates a creator writing into `icons_dir`, creating it if missing.
    pub fn with_dir(icons_dir: impl Into<PathBuf>) -> Result<Self> {
        let icons_dir = icons_dir.into();
        std::fs::create_dir_all(&icons_dir)?;
        debug!(dir = %icons_dir.display(), "icons directory ready");

        Ok(Self {
            icons_dir,
            keep_icons: false,
        })
    }

    /// Creates a creator from manifest options.
    pub fn from_options(options: &CreatorOptions) -> Result<Self> {
        let mut creator = match &options.icons_dir {
            Some(dir) => Self::with_dir(dir)?,
            None => Self::new()?,
        };
        creator.keep_icons = options.keep_icons;
        Ok(creator)
    }

    /// The directory bitmaps are written to.
    pub fn icons_dir(&self) -> &Path {
        &self.icons_dir
    }

    /// Whether produced files survive the creator being dropped.
    pub fn keep_icons(&self) -> bool {
        self.keep_icons
    }

    pub fn set_keep_icons(&mut self, keep: bool) {
        self.keep_icons = keep;
    }

    /// Produces one bitmap per size variant of `icon`.
    ///
    /// Returns the written paths in the order of [`Icon::sizes`].
    pub fn convert_icon<I: Icon + ?Sized>(&self, icon: &I) -> Result<Vec<PathBuf>> {
        let icons_data = self.create_icon_data(icon)?;
        let key = icon.transparency_key();

        for data in &icons_data {
            create_bitmap(
                &[&data.source],
                &data.target_path,
                data.target_size,
                data.offset,
                key,
            )?;
        }

        Ok(icons_data.into_iter().map(|d| d.target_path).collect())
    }

    /// Produces one horizontal strip per size variant, with slot `i` holding
    /// `icons[i]`.
    ///
    /// All icons must share the transparency key and the number of size
    /// variants of the first icon. The output name, target size and offset of
    /// each strip come from the first icon.
    pub fn convert_icons_group<I: Icon>(&self, icons: &[I]) -> Result<Vec<PathBuf>> {
        let Some(first) = icons.first() else {
            return Err(IconError::InvalidArgument(
                "icons group must contain at least one icon".into(),
            ));
        };

        let key = first.transparency_key();
        let lead = self.create_icon_data(first)?;
        let mut members: Vec<Vec<RgbaImage>> = Vec::with_capacity(icons.len() - 1);

        for (index, icon) in icons.iter().enumerate().skip(1) {
            if icon.transparency_key() != key {
                return Err(IconError::TransparencyMismatch { index });
            }

            let sizes = icon.sizes();

            if sizes.is_empty() {
                return Err(IconError::NoSizesDefined { icon: icon.label() });
            }

            if sizes.len() != lead.len() {
                return Err(IconError::SizeCountMismatch {
                    index,
                    expected: lead.len(),
                    actual: sizes.len(),
                });
            }

            // Only the lead variant's size and offset are drawn
            let sources = sizes
                .iter()
                .zip(&lead)
                .map(|(size, lead)| load_source(size, lead.fit))
                .collect::<Result<Vec<_>>>()?;
            members.push(sources);
        }

        let mut paths = Vec::with_capacity(lead.len());

        for (j, data) in lead.iter().enumerate() {
            let sources: Vec<&RgbaImage> = std::iter::once(&data.source)
                .chain(members.iter().map(|m| &m[j]))
                .collect();

            create_bitmap(&sources, &data.target_path, data.target_size, data.offset, key)?;
            paths.push(data.target_path.clone());
        }

        Ok(paths)
    }

    /// Releases the creator, removing the directory unless icons are kept.
    pub fn dispose(self) {}

    /// Loads every size variant of `icon`, validating it before any file is written.
    fn create_icon_data<I: Icon + ?Sized>(&self, icon: &I) -> Result<Vec<IconData>> {
        let sizes = icon.sizes();

        if sizes.is_empty() {
            return Err(IconError::NoSizesDefined { icon: icon.label() });
        }

        sizes
            .iter()
            .map(|size| {
                let fit = inner_size(&size.name, size.target_size, size.offset)?;

                Ok(IconData {
                    source: load_source(size, fit)?,
                    target_path: self.icons_dir.join(&size.name),
                    target_size: size.target_size,
                    offset: size.offset,
                    fit,
                })
            })
            .collect()
    }
}

/// Loads a variant's source for a slot whose drawable area is `fit`, applying its mask.
fn load_source(size: &IconSize, fit: SizePx) -> Result<RgbaImage> {
    let source = size.source.load(fit)?;

    Ok(match &size.mask {
        Some(mask) => replace_color(&source, mask),
        None => source,
    })
}

impl Drop for IconsCreator {
    fn drop(&mut self) {
        if self.keep_icons {
            return;
        }

        match std::fs::remove_dir_all(&self.icons_dir) {
            Ok(()) => debug!(dir = %self.icons_dir.display(), "removed icons directory"),
            Err(e) => debug!(dir = %self.icons_dir.display(), error = %e, "failed to remove icons directory"),
        }
    }
}

// ============================================================================
// Drawing
// ============================================================================

/// Area left for the source once `offset` is taken from every side.
fn inner_size(name: &str, size: SizePx, offset: u32) -> Result<SizePx> {
    let pad = offset as u64 * 2;
    let width = (size.width as u64).checked_sub(pad).filter(|w| *w > 0);
    let height = (size.height as u64).checked_sub(pad).filter(|h| *h > 0);

    match (width, height) {
        (Some(w), Some(h)) => Ok(SizePx::new(w as u32, h as u32)),
        _ => Err(IconError::ScaleComputationFailed {
            name: name.to_string(),
            width: size.width,
            height: size.height,
            offset,
        }),
    }
}

/// Destination of a `source`-sized image in slot `slot` of a strip.
///
/// The source is scaled by `min(inner_w / src_w, inner_h / src_h)` and
/// centered in its slot. Computed with integers so the constrained axis
/// always spans the inner size exactly; the other axis and the margins are
/// truncated.
pub fn placement(source: (u32, u32), size: SizePx, offset: u32, slot: u32) -> Result<RectPx> {
    let inner = inner_size("", size, offset)?;
    let (sw, sh) = (source.0 as u64, source.1 as u64);

    if sw == 0 || sh == 0 {
        return Err(IconError::ScaleComputationFailed {
            name: String::new(),
            width: size.width,
            height: size.height,
            offset,
        });
    }

    let (iw, ih) = (inner.width as u64, inner.height as u64);
    let (tw, th) = (size.width as u64, size.height as u64);

    let (x, y, width, height) = if iw * sh <= ih * sw {
        // Width bound
        let height = sh * iw / sw;
        let y = (th * sw - sh * iw) / sw / 2;
        ((tw - iw) / 2, y, iw, height)
    } else {
        // Height bound
        let width = sw * ih / sh;
        let x = (tw * sh - sw * ih) / sh / 2;
        (x, (th - ih) / 2, width, ih)
    };

    let x = (slot as u64)
        .checked_mul(tw)
        .and_then(|slot_x| u32::try_from(x + slot_x).ok())
        .ok_or_else(|| IconError::InvalidArgument(format!("slot {slot} is outside the strip")))?;

    Ok(RectPx::new(x, y as u32, width as u32, height as u32))
}

/// Draws `sources` side by side onto a key-filled canvas and saves it as BMP.
fn create_bitmap(
    sources: &[&RgbaImage],
    target: &Path,
    size: SizePx,
    offset: u32,
    key: TransparencyKey,
) -> Result<()> {
    let width = u32::try_from(sources.len())
        .ok()
        .and_then(|slots| size.width.checked_mul(slots))
        .ok_or_else(|| {
            IconError::InvalidArgument(format!(
                "strip of {} icons {}px wide exceeds the bitmap width limit",
                sources.len(),
                size.width
            ))
        })?;

    let mut fill = key.to_rgba();
    fill[3] = 255;
    let mut canvas = RgbaImage::from_pixel(width, size.height, fill);

    for (slot, source) in sources.iter().enumerate() {
        let source = nudge_transparency_key(source, key);
        let dest = placement(source.dimensions(), size, offset, slot as u32)?;

        if dest.width == 0 || dest.height == 0 {
            continue;
        }

        if source.dimensions() == (dest.width, dest.height) {
            composite_over(&mut canvas, &source, dest.x, dest.y);
        } else {
            let scaled = resize_premultiplied(&source, dest.width, dest.height);
            composite_over(&mut canvas, &scaled, dest.x, dest.y);
        }
    }

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir)?;
    }

    DynamicImage::ImageRgba8(canvas)
        .to_rgb8()
        .save_with_format(target, ImageFormat::Bmp)?;

    debug!(
        path = %target.display(),
        width,
        height = size.height,
        slots = sources.len(),
        "wrote icon bitmap"
    );

    Ok(())
}

/// Bicubic resize in premultiplied alpha, so fully transparent pixels don't
/// bleed their color into opaque edges.
fn resize_premultiplied(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let premultiplied = Rgba32FImage::from_fn(source.width(), source.height(), |x, y| {
        let [r, g, b, a] = source.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        Rgba([r * a, g * a, b * a, a])
    });

    let scaled = imageops::resize(&premultiplied, width, height, FilterType::CatmullRom);

    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = scaled.get_pixel(x, y).0;
        if a <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }

        let a = a.min(1.0);
        let straight = |c: f32| ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([straight(r), straight(g), straight(b), (a * 255.0).round() as u8])
    })
}

/// Composites `src` onto `dest` at (`x`, `y`) with source-over blending.
fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let (dx, dy) = (x + sx, y + sy);
        if dx >= dest.width() || dy >= dest.height() {
            continue;
        }

        let dst_pixel = dest.get_pixel_mut(dx, dy);
        *dst_pixel = alpha_blend(*src_pixel, *dst_pixel);
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let out = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        out.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================
