//! Sparse tile plane keyed by signed tile coordinates

use std::collections::HashMap;

/// A sparse map from signed tile coordinates to palette indices.
///
/// Only painted cells are stored. Writing `None` removes the entry, so memory
/// follows the painted area rather than the visible extent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatePlane {
    tiles: HashMap<(i32, i32), u32>,
}

impl CoordinatePlane {
    /// Create an empty plane
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the tile at a coordinate
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.tiles.get(&(x, y)).copied()
    }

    /// Write a tile value. `None` clears the cell.
    ///
    /// Returns the previous value of the cell.
    pub fn set(&mut self, x: i32, y: i32, tile: Option<u32>) -> Option<u32> {
        match tile {
            Some(value) => self.tiles.insert((x, y), value),
            None => self.tiles.remove(&(x, y)),
        }
    }

    /// Number of painted cells
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate painted cells as `((x, y), tile)` in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), u32)> + '_ {
        self.tiles.iter().map(|(&pos, &tile)| (pos, tile))
    }

    /// Collect the tiles inside an inclusive region
    pub fn tiles_in_region(
        &self,
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
    ) -> Vec<((i32, i32), u32)> {
        self.iter()
            .filter(|((x, y), _)| *x >= min_x && *x <= max_x && *y >= min_y && *y <= max_y)
            .collect()
    }
}

impl FromIterator<((i32, i32), u32)> for CoordinatePlane {
    fn from_iter<I: IntoIterator<Item = ((i32, i32), u32)>>(iter: I) -> Self {
        Self {
            tiles: iter.into_iter().collect(),
        }
    }
}
