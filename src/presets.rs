//! Stock icon definitions for the host's UI surfaces.

use std::path::Path;

use crate::icon::{IconDefinition, IconSize, SizePx};
use crate::mask::ColorMask;
use crate::source::IconSource;

/// Square sizes used by high resolution toolbars, command groups and task panes.
pub const HIGH_RES_SIZES: [u32; 6] = [20, 32, 40, 64, 96, 128];

/// Size of a FeatureManager tree icon.
pub const FEATURE_MANAGER_SIZE: SizePx = SizePx {
    width: 16,
    height: 18,
};

fn high_res(label: String, source: IconSource, name_of: impl Fn(u32) -> String) -> IconDefinition {
    HIGH_RES_SIZES
        .iter()
        .fold(IconDefinition::new(label), |icon, &side| {
            icon.with_size(IconSize::new(source.clone(), SizePx::square(side), name_of(side)))
        })
}

/// Toolbar/command group button icon, named `<name>_<size>.bmp`.
pub fn command_group_icon(name: &str, source: IconSource) -> IconDefinition {
    high_res(name.to_string(), source, |side| format!("{name}_{side}.bmp"))
}

/// Add-in icon, named `<name>_main_<size>.bmp`.
pub fn master_icon(name: &str, source: IconSource) -> IconDefinition {
    high_res(format!("{name} (main)"), source, |side| format!("{name}_main_{side}.bmp"))
}

/// Task pane tab icon, named `<name>_taskpane_<size>.bmp`.
pub fn task_pane_icon(name: &str, source: IconSource) -> IconDefinition {
    high_res(format!("{name} (task pane)"), source, |side| {
        format!("{name}_taskpane_{side}.bmp")
    })
}

/// FeatureManager tree icon, named `<name>_fm.bmp`.
pub fn feature_manager_icon(name: &str, source: IconSource) -> IconDefinition {
    IconDefinition::new(format!("{name} (feature)")).with_size(IconSize::new(
        source,
        FEATURE_MANAGER_SIZE,
        format!("{name}_fm.bmp"),
    ))
}

/// Copy of `icon` rendered grayscale, with `_disabled` appended to every file stem.
///
/// Pair with the original in a group to get a normal/disabled strip.
pub fn disabled_variant(icon: &IconDefinition) -> IconDefinition {
    let mut disabled = icon.clone();
    disabled.label = format!("{} (disabled)", icon.label);

    for size in &mut disabled.sizes {
        size.mask = Some(match size.mask.take() {
            Some(mask) => mask.then(ColorMask::grayscale()),
            None => ColorMask::grayscale(),
        });
        size.name = suffixed_name(&size.name, "_disabled");
    }

    disabled
}

fn suffixed_name(name: &str, suffix: &str) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let file = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(file).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::IconsCreator;
    use crate::icon::Icon;

    fn source() -> IconSource {
        IconSource::from_svg(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8" fill="#ff0000"/></svg>"##,
        )
    }

    #[test]
    fn command_group_has_all_high_res_sizes() {
        let icon = command_group_icon("open", source());

        let names: Vec<_> = icon.sizes().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["open_20.bmp", "open_32.bmp", "open_40.bmp", "open_64.bmp", "open_96.bmp", "open_128.bmp"]
        );
        assert!(icon.sizes().iter().all(|s| s.target_size.is_square() && s.offset == 0));
    }

    #[test]
    fn preset_names_are_distinct() {
        assert_eq!(master_icon("a", source()).sizes()[0].name, "a_main_20.bmp");
        assert_eq!(task_pane_icon("a", source()).sizes()[5].name, "a_taskpane_128.bmp");

        let fm = feature_manager_icon("a", source());
        assert_eq!(fm.len(), 1);
        assert_eq!(fm.sizes()[0].target_size, SizePx::new(16, 18));
        assert_eq!(fm.sizes()[0].name, "a_fm.bmp");
    }

    #[test]
    fn disabled_variant_renames_and_masks() {
        let icon = command_group_icon("open", source());
        let disabled = disabled_variant(&icon);

        assert_eq!(disabled.sizes()[0].name, "open_20_disabled.bmp");
        assert_eq!(disabled.sizes()[0].mask.as_ref().unwrap().name(), "grayscale");
        assert_eq!(disabled.label, "open (disabled)");
        assert!(icon.sizes()[0].mask.is_none());
    }

    #[test]
    fn suffix_keeps_directories() {
        let name = suffixed_name("sub/icon.bmp", "_x");
        assert_eq!(Path::new(&name), Path::new("sub/icon_x.bmp"));
        assert_eq!(suffixed_name("plain", "_x"), "plain_x");
    }

    #[test]
    fn normal_and_disabled_form_a_strip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let creator = IconsCreator::with_dir(tmp.path()).unwrap();

        let normal = command_group_icon("btn", source());
        let disabled = disabled_variant(&normal);
        let paths = creator.convert_icons_group(&[normal, disabled]).unwrap();

        assert_eq!(paths.len(), HIGH_RES_SIZES.len());
        let strip = image::open(&paths[1]).unwrap().to_rgb8();
        assert_eq!(strip.dimensions(), (64, 32));

        let [r, g, b] = strip.get_pixel(48, 16).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}
