//! Standalone tile map editor binary
//!
//! Run with: tilemap_editor [WORKSPACE] [--manifest maps.tilemap]
//! or: tilemap_editor [WORKSPACE] --resource tiles.json5 --map level.json5

use bevy::asset::{AssetPlugin, UnapprovedPathMode};
use bevy::image::{ImageFilterMode, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::window::WindowResolution;
use clap::Parser;
use std::path::PathBuf;
use tilemap_editor::tilemap_core::MapSources;
use tilemap_editor::EditorPlugin;

#[derive(Parser, Debug)]
#[command(
    name = "tilemap_editor",
    about = "Pan/zoom editor for unbounded quadrant tile maps"
)]
struct Args {
    /// Workspace folder all map paths are relative to. Defaults to the
    /// current directory.
    workspace: Option<PathBuf>,

    /// Manifest to open on startup, relative to the workspace
    #[arg(short, long, value_name = "FILE.tilemap", conflicts_with = "resource")]
    manifest: Option<String>,

    /// Resource descriptor of the map to open on startup
    #[arg(short, long, value_name = "FILE")]
    resource: Option<String>,

    /// Map file to open with --resource
    #[arg(long, value_name = "FILE", requires = "resource")]
    map: Option<String>,

    /// Read-only background map shown under the edited one
    #[arg(long, value_name = "FILE", requires = "resource")]
    background: Option<String>,

    /// Resource descriptor for the background map
    #[arg(long, value_name = "FILE", requires = "background")]
    background_resource: Option<String>,
}

impl Args {
    fn editor_plugin(self) -> EditorPlugin {
        let mut plugin = EditorPlugin::new();
        if let Some(workspace) = self.workspace {
            plugin = plugin.with_workspace(workspace);
        }
        if let Some(manifest) = self.manifest {
            plugin = plugin.with_manifest(manifest);
        } else if let Some(resource) = self.resource {
            plugin = plugin.with_map(MapSources {
                resource,
                tilemap: self.map,
                background: self.background,
                background_resource: self.background_resource,
            });
        }
        plugin
    }
}

fn main() {
    let args = Args::parse();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Tilemap Editor".to_string(),
                        // High DPI support: prevent OS-level scaling that causes blurriness
                        resolution: WindowResolution::new(1920, 1080)
                            .with_scale_factor_override(1.0),
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin {
                    // Pixel-perfect rendering: use Nearest (point) sampling for crisp pixel art
                    default_sampler: ImageSamplerDescriptor {
                        mag_filter: ImageFilterMode::Nearest,
                        min_filter: ImageFilterMode::Nearest,
                        mipmap_filter: ImageFilterMode::Nearest,
                        ..default()
                    },
                })
                .set(AssetPlugin {
                    // Palette images are loaded by absolute path from the workspace
                    unapproved_path_mode: UnapprovedPathMode::Allow,
                    ..default()
                }),
        )
        .add_plugins(args.editor_plugin())
        .run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_arguments() {
        let args = Args::try_parse_from([
            "tilemap_editor",
            "world",
            "--resource",
            "tiles.json5",
            "--map",
            "level.json5",
        ])
        .unwrap();
        assert_eq!(args.workspace, Some(PathBuf::from("world")));
        assert_eq!(args.resource.as_deref(), Some("tiles.json5"));
        assert_eq!(args.map.as_deref(), Some("level.json5"));
        assert!(args.manifest.is_none());
    }

    #[test]
    fn test_map_requires_resource() {
        assert!(Args::try_parse_from(["tilemap_editor", "--map", "level.json5"]).is_err());
        assert!(Args::try_parse_from([
            "tilemap_editor",
            "--manifest",
            "maps.tilemap",
            "--resource",
            "tiles.json5"
        ])
        .is_err());
    }
}
