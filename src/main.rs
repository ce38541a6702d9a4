use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use xcad_icons::{presets, IconManifest, IconSource, IconsCreator};

#[derive(Parser)]
#[command(name = "xcad-icons")]
#[command(about = "Generate toolbar bitmaps for CAD add-ins")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every icon and group described in a JSON manifest
    Convert {
        /// Path to the manifest
        manifest: PathBuf,
        /// Output directory, overrides the manifest's iconsDir
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Keep the generated files even if the manifest's keepIcons is false
        #[arg(long)]
        keep: bool,
    },
    /// Convert a single source image with a stock size preset
    Preset {
        kind: PresetKind,
        /// Source image (PNG, BMP, ICO, SVG, ...)
        source: PathBuf,
        /// Base name of the output files, defaults to the source file stem
        #[arg(short, long)]
        name: Option<String>,
        /// Output directory, defaults to a temp directory
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also render a grayscale disabled state next to each icon
        #[arg(long)]
        disabled: bool,
        /// Keep the generated files, otherwise they are removed on exit
        #[arg(long)]
        keep: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetKind {
    CommandGroup,
    Master,
    TaskPane,
    FeatureManager,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let converted = match cli.command {
        Commands::Convert {
            manifest,
            out,
            keep,
        } => cmd_convert(&manifest, out, keep)?,
        Commands::Preset {
            kind,
            source,
            name,
            out,
            disabled,
            keep,
        } => cmd_preset(kind, &source, name, out, disabled, keep)?,
    };

    report(&converted);

    Ok(())
}

/// Bitmaps written by a command, and whether they outlive the process.
struct Converted {
    paths: Vec<PathBuf>,
    kept: bool,
}

fn report(converted: &Converted) {
    if converted.kept {
        for path in &converted.paths {
            println!("{}", path.display());
        }
    } else {
        eprintln!(
            "converted {} bitmaps and removed them, pass --keep to retain",
            converted.paths.len()
        );
    }
}

fn cmd_convert(manifest_path: &Path, out: Option<PathBuf>, keep: bool) -> Result<Converted> {
    let mut manifest = IconManifest::from_file(manifest_path)
        .with_context(|| format!("failed to read manifest {}", manifest_path.display()))?;

    if out.is_some() {
        manifest.options.icons_dir = out;
    }
    manifest.options.keep_icons |= keep;

    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let creator = IconsCreator::from_options(&manifest.options)
        .context("failed to prepare output directory")?;

    tracing::info!(icons = manifest.icons.len(), groups = manifest.groups.len(), "converting manifest");
    let paths = manifest
        .convert(&creator, base_dir)
        .context("failed to convert icons")?;

    Ok(Converted {
        paths,
        kept: creator.keep_icons(),
    })
}

fn cmd_preset(
    kind: PresetKind,
    source_path: &Path,
    name: Option<String>,
    out: Option<PathBuf>,
    disabled: bool,
    keep: bool,
) -> Result<Converted> {
    let source = IconSource::from_file(source_path)
        .with_context(|| format!("failed to read {}", source_path.display()))?;

    let name = match name {
        Some(name) => name,
        None => source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("cannot derive a name from the source path, pass --name")?
            .to_string(),
    };

    let icon = match kind {
        PresetKind::CommandGroup => presets::command_group_icon(&name, source),
        PresetKind::Master => presets::master_icon(&name, source),
        PresetKind::TaskPane => presets::task_pane_icon(&name, source),
        PresetKind::FeatureManager => presets::feature_manager_icon(&name, source),
    };

    let mut creator = match out {
        Some(dir) => IconsCreator::with_dir(dir),
        None => IconsCreator::new(),
    }
    .context("failed to prepare output directory")?;
    creator.set_keep_icons(keep);

    let paths = if disabled {
        let disabled = presets::disabled_variant(&icon);
        creator.convert_icons_group(&[icon, disabled])
    } else {
        creator.convert_icon(&icon)
    }
    .context("failed to convert icon")?;

    Ok(Converted {
        paths,
        kept: creator.keep_icons(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, keep_icons: bool) -> PathBuf {
        RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))
            .save(dir.join("open.png"))
            .unwrap();

        let json = format!(
            r#"{{
                "options": {{ "iconsDir": "{}", "keepIcons": {keep_icons} }},
                "icons": [ {{ "sizes": [
                    {{ "source": "open.png", "width": 16, "height": 16, "name": "open_16.bmp" }}
                ] }} ]
            }}"#,
            dir.join("out").display().to_string().replace('\\', "/")
        );
        let path = dir.join("icons.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn keep_flag_parses_on_both_commands() {
        let cli = Cli::try_parse_from(["xcad-icons", "convert", "icons.json", "--keep"]).unwrap();
        assert!(matches!(cli.command, Commands::Convert { keep: true, .. }));

        let cli = Cli::try_parse_from(["xcad-icons", "preset", "master", "open.png"]).unwrap();
        assert!(matches!(cli.command, Commands::Preset { keep: false, .. }));

        assert!(Cli::try_parse_from(["xcad-icons", "convert", "icons.json", "--dry-run"]).is_err());
    }

    #[test]
    fn convert_honors_manifest_keep_icons() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_manifest(tmp.path(), true);

        let converted = cmd_convert(&manifest, None, false).unwrap();

        assert!(converted.kept);
        assert_eq!(converted.paths.len(), 1);
        assert!(converted.paths[0].exists());
    }

    #[test]
    fn convert_keep_flag_overrides_manifest() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_manifest(tmp.path(), false);

        let converted = cmd_convert(&manifest, None, true).unwrap();
        assert!(converted.kept);
        assert!(converted.paths[0].exists());

        let out = tmp.path().join("scratch");
        let converted = cmd_convert(&manifest, Some(out.clone()), false).unwrap();
        assert!(!converted.kept);
        assert!(!out.exists());
    }
}
