//! Source images for icon size variants.
//!
//! Raster sources are decoded with the `image` crate. SVG sources are
//! rasterized with resvg directly at the size of the slot they are drawn
//! into, so vector icons stay sharp at every target size.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{IconError, Result};
use crate::icon::SizePx;

/// The image drawn into an icon slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// Encoded raster bytes in any format `image` can decode (PNG, BMP, ICO, ...).
    Raster(Arc<[u8]>),

    /// SVG markup.
    Svg(String),
}

impl IconSource {
    /// Creates a source from encoded raster bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Raster(bytes.into())
    }

    /// Creates a source from SVG markup.
    pub fn from_svg(svg: impl Into<String>) -> Self {
        Self::Svg(svg.into())
    }

    /// Encodes an in-memory image as PNG and wraps it as a raster source.
    pub fn from_image(image: &RgbaImage) -> Result<Self> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageFormat::Png)?;
        Ok(Self::from_bytes(buf.into_inner()))
    }

    /// Reads a source from disk. Files with an `.svg` extension are treated
    /// as SVG markup, everything else as raster data.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_svg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        if is_svg {
            Ok(Self::Svg(std::fs::read_to_string(path)?))
        } else {
            Ok(Self::from_bytes(std::fs::read(path)?))
        }
    }

    /// Returns `true` if this is an SVG source.
    pub fn is_svg(&self) -> bool {
        matches!(self, Self::Svg(_))
    }

    /// Loads the source into an RGBA image.
    ///
    /// `fit` is only used by SVG sources, which are rendered to fit within it
    /// while preserving aspect ratio. Raster sources keep their native size.
    pub fn load(&self, fit: SizePx) -> Result<RgbaImage> {
        match self {
            Self::Raster(bytes) => Ok(image::load_from_memory(bytes)?.to_rgba8()),
            Self::Svg(svg) => render_svg(svg, fit),
        }
    }
}

// ============================================================================
// SVG Rendering
// ============================================================================

/// Renders SVG markup to fit within `fit` pixels, preserving aspect ratio.
///
/// The constrained axis spans `fit` exactly and the other axis is truncated,
/// matching [`placement`](crate::placement), so the result is drawn without
/// resampling.
pub fn render_svg(svg_data: &str, fit: SizePx) -> Result<RgbaImage> {
    if fit.width == 0 || fit.height == 0 {
        return Err(IconError::Svg(format!(
            "cannot render into {}x{} pixels",
            fit.width, fit.height
        )));
    }

    let tree = Tree::from_str(svg_data, &Options::default())
        .map_err(|e| IconError::Svg(e.to_string()))?;

    let svg_size = tree.size();
    let (sw, sh) = (svg_size.width() as f64, svg_size.height() as f64);
    let (fw, fh) = (fit.width as f64, fit.height as f64);

    let (width, height, scale) = if fw * sh <= fh * sw {
        let scale = fw / sw;
        let height = ((sh * scale).floor() as u32).clamp(1, fit.height);
        (fit.width, height, scale)
    } else {
        let scale = fh / sh;
        let width = ((sw * scale).floor() as u32).clamp(1, fit.width);
        (width, fit.height, scale)
    };
    let scale = scale as f32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| IconError::Svg(format!("cannot allocate {width}x{height} pixmap")))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a premultiplied tiny_skia pixmap to a straight-alpha RGBA image.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    // Buffer length is exactly width * height * 4
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const WIDE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100"><rect width="200" height="100" fill="#0000ff"/></svg>"##;

    #[test]
    fn svg_renders_to_fit() {
        let img = IconSource::from_svg(WIDE_SVG)
            .load(SizePx::square(40))
            .unwrap();
        assert_eq!(img.width(), 40);
        assert_eq!(img.height(), 20);
        assert_eq!(img.get_pixel(20, 10).0, [0, 0, 255, 255]);
    }

    #[test]
    fn svg_size_truncates_like_placement() {
        // 3:2 into 10x10 is 10x6.67, which must truncate to 6
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="3" height="2"><rect width="3" height="2" fill="#ff0000"/></svg>"##;
        let img = render_svg(svg, SizePx::square(10)).unwrap();
        assert_eq!(img.dimensions(), (10, 6));

        let dest = crate::placement(img.dimensions(), SizePx::square(14), 2, 0).unwrap();
        assert_eq!((dest.width, dest.height), img.dimensions());
    }

    #[test]
    fn svg_into_empty_fit_is_an_error() {
        let err = render_svg(WIDE_SVG, SizePx::new(0, 16));
        assert!(matches!(err, Err(IconError::Svg(_))));
    }

    #[test]
    fn invalid_svg_is_reported() {
        let err = IconSource::from_svg("not svg").load(SizePx::square(16));
        assert!(matches!(err, Err(IconError::Svg(_))));
    }

    #[test]
    fn raster_round_trips_through_png() {
        let img = RgbaImage::from_pixel(3, 5, Rgba([10, 20, 30, 255]));
        let source = IconSource::from_image(&img).unwrap();
        assert!(!source.is_svg());

        let loaded = source.load(SizePx::square(64)).unwrap();
        assert_eq!(loaded.dimensions(), (3, 5));
        assert_eq!(loaded.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn garbage_raster_is_an_image_error() {
        let err = IconSource::from_bytes(vec![1u8, 2, 3]).load(SizePx::square(16));
        assert!(matches!(err, Err(IconError::Image(_))));
    }

    #[test]
    fn from_file_detects_svg_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let svg_path = dir.path().join("icon.SVG");
        std::fs::write(&svg_path, WIDE_SVG).unwrap();

        let source = IconSource::from_file(&svg_path).unwrap();
        assert!(source.is_svg());

        let png_path = dir.path().join("icon.png");
        RgbaImage::new(2, 2).save(&png_path).unwrap();
        assert!(!IconSource::from_file(&png_path).unwrap().is_svg());
    }
}
