//! Pan/zoom state and screen <-> tile coordinate conversion
//!
//! Screen space has its origin at the canvas top-left with y growing down.
//! Tile space grows up: the plane origin sits `offset_x` pixels right of the
//! left edge and `offset_y` pixels above the bottom edge.

use serde::{Deserialize, Serialize};

/// Zoom limits and wheel step factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomSettings {
    /// Smallest tile edge in pixels
    pub min_tile_size: f32,
    /// Largest tile edge in pixels
    pub max_tile_size: f32,
    /// Multiplier applied when zooming in (> 1)
    pub zoom_in_step: f32,
    /// Multiplier applied when zooming out (< 1)
    pub zoom_out_step: f32,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min_tile_size: 8.0,
            max_tile_size: 64.0,
            zoom_in_step: 1.1,
            zoom_out_step: 0.9,
        }
    }
}

impl ZoomSettings {
    pub fn clamp(&self, tile_size: f32) -> f32 {
        tile_size.clamp(self.min_tile_size, self.max_tile_size)
    }
}

/// Direction of a zoom gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Viewport over the tile plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    tile_size: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub zoom: ZoomSettings,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::centered(800.0, 600.0, 48.0, ZoomSettings::default())
    }
}

impl ViewTransform {
    /// Create a view with the plane origin at the given offsets
    pub fn new(
        offset_x: f32,
        offset_y: f32,
        tile_size: f32,
        canvas_width: f32,
        canvas_height: f32,
        zoom: ZoomSettings,
    ) -> Self {
        Self {
            offset_x,
            offset_y,
            tile_size: zoom.clamp(tile_size),
            canvas_width,
            canvas_height,
            zoom,
        }
    }

    /// Create a view with the plane origin in the middle of the canvas
    pub fn centered(canvas_width: f32, canvas_height: f32, tile_size: f32, zoom: ZoomSettings) -> Self {
        Self::new(
            canvas_width / 2.0,
            canvas_height / 2.0,
            tile_size,
            canvas_width,
            canvas_height,
            zoom,
        )
    }

    /// Pixels per tile edge
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Set the tile size, clamped to the zoom limits
    pub fn set_tile_size(&mut self, tile_size: f32) {
        self.tile_size = self.zoom.clamp(tile_size);
    }

    /// Update the canvas size. Offsets are kept, so the origin stays put
    /// relative to the bottom-left corner.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.canvas_width = width;
        self.canvas_height = height;
    }

    /// Tile containing a screen pixel
    pub fn screen_to_tile(&self, px: f32, py: f32) -> (i32, i32) {
        let relative_x = px - self.offset_x;
        let relative_y = self.canvas_height - py - self.offset_y;
        (
            (relative_x / self.tile_size).floor() as i32,
            (relative_y / self.tile_size).floor() as i32,
        )
    }

    /// Screen pixel of a tile's top-left corner
    pub fn tile_to_screen(&self, tile_x: i32, tile_y: i32) -> (f32, f32) {
        let px = self.offset_x + tile_x as f32 * self.tile_size;
        let py = self.canvas_height - self.offset_y - (tile_y as f32 + 1.0) * self.tile_size;
        (px, py)
    }

    /// Drag the plane by a screen delta
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        // Screen y grows down, tile y grows up
        self.offset_y -= dy;
    }

    /// Scale the tile size by `factor` keeping the tile under `(px, py)` fixed
    pub fn zoom_at(&mut self, px: f32, py: f32, factor: f32) {
        let (before_x, before_y) = self.screen_to_tile(px, py);
        self.set_tile_size(self.tile_size * factor);
        let (after_x, after_y) = self.screen_to_tile(px, py);
        self.offset_x += (after_x - before_x) as f32 * self.tile_size;
        self.offset_y += (after_y - before_y) as f32 * self.tile_size;
    }

    /// One wheel step in the given direction
    pub fn zoom_step(&mut self, px: f32, py: f32, direction: ZoomDirection) {
        let factor = match direction {
            ZoomDirection::In => self.zoom.zoom_in_step,
            ZoomDirection::Out => self.zoom.zoom_out_step,
        };
        self.zoom_at(px, py, factor);
    }

    /// Inclusive tile range covering the canvas as `(min_x, min_y, max_x, max_y)`
    pub fn visible_tiles(&self) -> (i32, i32, i32, i32) {
        let (min_x, max_y) = self.screen_to_tile(0.0, 0.0);
        let (max_x, min_y) = self.screen_to_tile(self.canvas_width, self.canvas_height);
        (min_x, min_y, max_x, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn view() -> ViewTransform {
        ViewTransform::new(100.0, 50.0, 32.0, 640.0, 480.0, ZoomSettings::default())
    }

    #[test]
    fn test_screen_to_tile() {
        let view = view();
        // Origin tile's bottom-left corner sits at (100, 430) on screen
        assert_eq!(view.screen_to_tile(100.0, 429.5), (0, 0));
        assert_eq!(view.screen_to_tile(131.9, 398.1), (0, 0));
        assert_eq!(view.screen_to_tile(99.0, 429.5), (-1, 0));
        assert_eq!(view.screen_to_tile(100.0, 430.5), (0, -1));
        assert_eq!(view.screen_to_tile(164.0, 367.0), (2, 1));
    }

    #[test]
    fn test_tile_to_screen_is_top_left() {
        let view = view();
        assert_eq!(view.tile_to_screen(0, 0), (100.0, 398.0));
        assert_eq!(view.tile_to_screen(-1, -1), (68.0, 430.0));

        for &(px, py) in &[(3.0, 7.0), (100.0, 430.0), (639.0, 1.0), (250.5, 250.5)] {
            let (tx, ty) = view.screen_to_tile(px, py);
            let (sx, sy) = view.tile_to_screen(tx, ty);
            let size = view.tile_size();
            assert!(sx <= px && px < sx + size, "x {} not in [{}, {})", px, sx, sx + size);
            assert!(sy <= py && py <= sy + size, "y {} not in [{}, {}]", py, sy, sy + size);
        }
    }

    #[test]
    fn test_pan_inverts_vertical() {
        let mut view = view();
        let before = view.screen_to_tile(200.0, 200.0);
        view.pan_by(32.0, 32.0);
        assert_eq!(view.offset_x, 132.0);
        assert_eq!(view.offset_y, 18.0);
        // Content moved right and down with the drag
        let after = view.screen_to_tile(200.0, 200.0);
        assert_eq!(after, (before.0 - 1, before.1 + 1));
    }

    #[test]
    fn test_tile_size_clamped() {
        let mut view = view();
        view.set_tile_size(1000.0);
        assert_eq!(view.tile_size(), 64.0);
        view.set_tile_size(1.0);
        assert_eq!(view.tile_size(), 8.0);

        for _ in 0..50 {
            view.zoom_step(10.0, 10.0, ZoomDirection::In);
        }
        assert_eq!(view.tile_size(), 64.0);
    }

    #[test]
    fn test_zoom_keeps_focal_tile() {
        let mut view = view();
        for &(px, py) in &[(320.0, 240.0), (12.0, 470.0), (600.0, 30.0)] {
            for direction in [ZoomDirection::In, ZoomDirection::Out, ZoomDirection::In] {
                let before = view.screen_to_tile(px, py);
                view.zoom_step(px, py, direction);
                let after = view.screen_to_tile(px, py);
                assert!((before.0 - after.0).abs() <= 1, "{:?} -> {:?}", before, after);
                assert!((before.1 - after.1).abs() <= 1, "{:?} -> {:?}", before, after);
            }
        }
    }

    #[test]
    fn test_visible_tiles() {
        let view = ViewTransform::new(0.0, 0.0, 32.0, 320.0, 320.0, ZoomSettings::default());
        assert_eq!(view.visible_tiles(), (0, 0, 10, 10));
    }

    proptest! {
        #[test]
        fn test_zoom_focal_point_is_stable(
            offset_x in -5000.0f32..5000.0,
            offset_y in -5000.0f32..5000.0,
            tile_size in 8.0f32..64.0,
            px in 0.0f32..640.0,
            py in 0.0f32..480.0,
            zoom_in in any::<bool>(),
        ) {
            let mut view = ViewTransform::new(
                offset_x, offset_y, tile_size, 640.0, 480.0, ZoomSettings::default(),
            );
            let direction = if zoom_in { ZoomDirection::In } else { ZoomDirection::Out };
            let before = view.screen_to_tile(px, py);
            view.zoom_step(px, py, direction);
            let after = view.screen_to_tile(px, py);
            prop_assert!((before.0 - after.0).abs() <= 1);
            prop_assert!((before.1 - after.1).abs() <= 1);
        }
    }
}
