//! User preferences persisted between editor sessions

mod file;

pub use file::*;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::view::ZoomSettings;
use crate::BackgroundMode;

/// Most manifests remembered in the recent list
pub const MAX_RECENT_MANIFESTS: usize = 10;

/// A manifest opened in an earlier session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentManifest {
    /// Workspace directory the manifest was opened in
    pub workspace: String,
    /// Manifest path relative to the workspace
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct EditorPreferences {
    pub zoom: ZoomSettings,
    /// Tile edge in pixels when a map is first shown
    pub initial_tile_size: f32,
    pub show_grid: bool,
    /// Grid lines are drawn for tile indices -extent..=extent on both axes
    pub grid_extent: i32,
    pub background_mode: BackgroundMode,
    /// File written at the workspace root when the map has no path of its own
    pub export_file_name: String,
    /// Newest first
    pub recent_manifests: Vec<RecentManifest>,
    /// Reopen the workspace's last manifest on startup
    pub auto_open_last_manifest: bool,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            zoom: ZoomSettings::default(),
            initial_tile_size: 48.0,
            show_grid: true,
            grid_extent: 100,
            background_mode: BackgroundMode::Visible,
            export_file_name: "tiles.json5".to_string(),
            recent_manifests: Vec::new(),
            auto_open_last_manifest: true,
        }
    }
}

impl EditorPreferences {
    /// Move a manifest to the front of the recent list
    pub fn add_recent(&mut self, workspace: &str, path: &str) {
        self.remove_recent(workspace, path);
        self.recent_manifests.insert(
            0,
            RecentManifest {
                workspace: workspace.to_string(),
                path: path.to_string(),
            },
        );
        self.recent_manifests.truncate(MAX_RECENT_MANIFESTS);
    }

    pub fn remove_recent(&mut self, workspace: &str, path: &str) {
        self.recent_manifests
            .retain(|r| !(r.workspace == workspace && r.path == path));
    }

    /// Most recently opened manifest in the given workspace
    pub fn last_manifest(&self, workspace: &str) -> Option<&str> {
        self.recent_manifests
            .iter()
            .find(|r| r.workspace == workspace)
            .map(|r| r.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_manifests_order_and_limit() {
        let mut prefs = EditorPreferences::default();
        for i in 0..12 {
            prefs.add_recent("/ws", &format!("map{}.tilemap", i));
        }
        assert_eq!(prefs.recent_manifests.len(), MAX_RECENT_MANIFESTS);
        assert_eq!(prefs.last_manifest("/ws"), Some("map11.tilemap"));

        // Re-adding moves to the front without duplicating
        prefs.add_recent("/ws", "map5.tilemap");
        assert_eq!(prefs.recent_manifests.len(), MAX_RECENT_MANIFESTS);
        assert_eq!(prefs.last_manifest("/ws"), Some("map5.tilemap"));

        prefs.add_recent("/other", "a.tilemap");
        assert_eq!(prefs.last_manifest("/ws"), Some("map5.tilemap"));
        assert_eq!(prefs.last_manifest("/other"), Some("a.tilemap"));

        prefs.remove_recent("/other", "a.tilemap");
        assert_eq!(prefs.last_manifest("/other"), None);
    }

    #[test]
    fn test_partial_preferences_use_defaults() {
        let prefs: EditorPreferences =
            serde_json::from_str(r#"{ "show_grid": false, "grid_extent": 20 }"#).unwrap();
        assert!(!prefs.show_grid);
        assert_eq!(prefs.grid_extent, 20);
        assert_eq!(prefs.export_file_name, "tiles.json5");
        assert_eq!(prefs.zoom, ZoomSettings::default());
    }
}
