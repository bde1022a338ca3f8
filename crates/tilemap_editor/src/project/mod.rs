//! Editing session for one map
//!
//! The `Session` resource owns the edited plane, the optional background
//! layer, the palette descriptors and where the map is saved to. File
//! contents arrive from the host bridge and are applied in `file.rs`.

mod file;

pub use file::*;

use bevy::prelude::Resource;
use std::collections::HashMap;
use tilemap_core::{CoordinatePlane, Manifest, ResourceDescriptor};
use uuid::Uuid;

/// Error text shown next to each opener input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputErrors {
    pub resource: Option<String>,
    pub map: Option<String>,
    /// Background problems never block opening; the layer is left out
    pub background: Option<String>,
    pub manifest: Option<String>,
}

impl InputErrors {
    /// Clear the errors of the map inputs, keeping the manifest error
    pub fn clear_map_inputs(&mut self) {
        self.resource = None;
        self.map = None;
        self.background = None;
    }
}

/// Read-only layer drawn beneath the edited map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundLayer {
    pub path: String,
    pub plane: CoordinatePlane,
    /// Own palette, when the map entry names one
    pub resource: Option<ResourceDescriptor>,
}

/// A manifest that has been opened
#[derive(Debug, Clone, PartialEq)]
pub struct OpenManifest {
    pub path: String,
    pub manifest: Manifest,
}

#[derive(Debug, Default, Resource)]
pub struct Session {
    pub plane: CoordinatePlane,
    pub background: Option<BackgroundLayer>,
    pub resource: Option<ResourceDescriptor>,
    pub resource_path: Option<String>,
    /// Loadable image per main palette index, `None` while unknown or missing
    pub palette_uris: Vec<Option<String>>,
    pub background_palette_uris: Vec<Option<String>>,
    /// Save target; `None` saves to the export file at the workspace root
    pub map_path: Option<String>,
    pub manifest: Option<OpenManifest>,
    pub dirty: bool,
    /// Bumped on every change the renderer has to pick up
    pub revision: u64,
    /// Bumped only when the plane's content changes
    edit_revision: u64,
    pub input_errors: InputErrors,
    /// Save requests in flight and the edit revision each one wrote
    pending_saves: HashMap<Uuid, u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a resource descriptor has been accepted and the map can be edited
    pub fn is_ready(&self) -> bool {
        self.resource.is_some()
    }

    /// Record a plane edit made by the tools
    pub fn mark_edited(&mut self) {
        self.dirty = true;
        self.revision += 1;
        self.edit_revision += 1;
    }

    /// Number of selectable palette entries
    pub fn palette_len(&self) -> usize {
        self.resource.as_ref().map_or(0, ResourceDescriptor::len)
    }

    /// Image URIs to draw the background with: its own palette when loaded,
    /// otherwise the main one
    pub fn background_palette(&self) -> &[Option<String>] {
        let has_own = self
            .background
            .as_ref()
            .is_some_and(|layer| layer.resource.is_some());
        if has_own {
            &self.background_palette_uris
        } else {
            &self.palette_uris
        }
    }

    /// Short name for the window title
    pub fn display_name(&self) -> String {
        let name = self.map_path.as_deref().unwrap_or("untitled");
        if self.dirty {
            format!("{}*", name)
        } else {
            name.to_string()
        }
    }
}
