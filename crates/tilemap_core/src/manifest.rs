//! `.tilemap` manifest: the list of maps in a workspace
//!
//! Each entry names a map and points at its resource descriptor, its map
//! file and optionally a read-only background map with its own resources.
//!
//! ```json5
//! [
//!   { name: "Town", resource: "res/town.json5", tilemap: "maps/town.json5" },
//!   {
//!     name: "Cave",
//!     resource: "res/cave.json5",
//!     tilemap: "maps/cave.json5",
//!     background: "maps/cave_bg.json5",
//!     backgroundResource: "res/cave_bg.json5",
//!   },
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::format::parse_json5;
use crate::FormatError;

/// One map listed in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    /// Resource descriptor path
    pub resource: String,
    /// Map file path, also the save target
    pub tilemap: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_resource: Option<String>,
}

impl ManifestEntry {
    /// Files to read when opening this entry
    pub fn sources(&self) -> MapSources {
        MapSources {
            resource: self.resource.clone(),
            tilemap: Some(self.tilemap.clone()),
            background: self.background.clone(),
            background_resource: self.background_resource.clone(),
        }
    }
}

/// Paths of everything needed to open one map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSources {
    pub resource: String,
    pub tilemap: Option<String>,
    pub background: Option<String>,
    pub background_resource: Option<String>,
}

impl MapSources {
    /// Paths in read order. Absent optional files are skipped.
    pub fn paths(&self) -> Vec<String> {
        std::iter::once(Some(self.resource.clone()))
            .chain([
                self.tilemap.clone(),
                self.background.clone(),
                self.background_resource.clone(),
            ])
            .flatten()
            .collect()
    }
}

/// A parsed `.tilemap` manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let value = parse_json5(text)?;
        let entries = serde_json::from_value(value)
            .map_err(|e| FormatError::MalformedManifest(e.to_string()))?;
        Ok(Self { entries })
    }

    /// Find an entry by its display name
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
