//! Core data structures for quadrant tile maps
//!
//! This crate provides the types for storing and persisting unbounded tile maps:
//! - `CoordinatePlane` - Sparse map from signed tile coordinates to palette indices
//! - `QuadrantSet` - The four non-negative quadrant arrays a map is saved as
//! - `encode` / `decode` - Lossless conversion between the two
//! - `format_map` / `parse_map` - Map file text (JSON5 in, aligned rows out)
//! - `ResourceDescriptor` - Palette image list for a map
//! - `Manifest` - The `.tilemap` list of maps in a workspace

mod error;
pub mod format;
mod manifest;
mod plane;
pub mod quadrant;
mod resource;

pub use error::FormatError;
pub use format::{format_map, load_plane, parse_json5, parse_map, save_plane};
pub use manifest::{Manifest, ManifestEntry, MapSources};
pub use plane::CoordinatePlane;
pub use quadrant::{
    decode, encode, from_quadrant, to_quadrant, Quadrant, QuadrantCell, QuadrantRows,
    QuadrantSet, QUADRANT_COUNT,
};
pub use resource::{ResourceDescriptor, PALETTE_ENTRY};
