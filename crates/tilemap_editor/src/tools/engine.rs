//! Pointer-driven editing state machine
//!
//! `ToolEngine` turns canvas pointer events into view changes (pan, zoom) and
//! plane writes (freehand, rectangle, line). It has no Bevy dependency so the
//! transitions can be driven directly from tests.

use serde::{Deserialize, Serialize};
use tilemap_core::CoordinatePlane;

use super::raster::{line_tiles, rect_tiles};
use crate::view::{ViewTransform, ZoomDirection};

/// Drawing tool selected in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeTool {
    #[default]
    Freehand,
    Rectangle,
    Line,
}

impl ShapeTool {
    pub const ALL: [ShapeTool; 3] = [ShapeTool::Freehand, ShapeTool::Rectangle, ShapeTool::Line];

    pub fn label(&self) -> &'static str {
        match self {
            ShapeTool::Freehand => "Freehand",
            ShapeTool::Rectangle => "Rectangle",
            ShapeTool::Line => "Line",
        }
    }
}

/// Mouse button class. Right and middle buttons both pan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Canvas pointer event in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        button: PointerButton,
        x: f32,
        y: f32,
    },
    Move {
        x: f32,
        y: f32,
        primary_held: bool,
    },
    /// `at` is `None` when the pointer was released outside the canvas
    Up {
        button: PointerButton,
        at: Option<(f32, f32)>,
    },
    Zoom {
        x: f32,
        y: f32,
        direction: ZoomDirection,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    PanDragging {
        last_x: f32,
        last_y: f32,
    },
    ShapeDragging {
        tool: ShapeTool,
        anchor: (i32, i32),
    },
}

/// What an event changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOutcome {
    pub plane_changed: bool,
    pub view_changed: bool,
}

#[derive(Debug, Clone)]
pub struct ToolEngine {
    pub tool: ShapeTool,
    /// Palette index to write, `None` for the eraser
    pub selected: Option<u32>,
    state: ToolState,
    last_tile: Option<(i32, i32)>,
}

impl Default for ToolEngine {
    fn default() -> Self {
        Self {
            tool: ShapeTool::Freehand,
            selected: Some(1),
            state: ToolState::Idle,
            last_tile: None,
        }
    }
}

impl ToolEngine {
    pub fn new(tool: ShapeTool) -> Self {
        Self {
            tool,
            ..Default::default()
        }
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Tile under the pointer at the last event that had a position
    pub fn last_tile(&self) -> Option<(i32, i32)> {
        self.last_tile
    }

    /// Drop any drag in progress without writing
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    /// Apply one pointer event
    pub fn handle(
        &mut self,
        event: PointerEvent,
        view: &mut ViewTransform,
        plane: &mut CoordinatePlane,
    ) -> EngineOutcome {
        let mut outcome = EngineOutcome::default();

        match event {
            PointerEvent::Down { button, x, y } => {
                let tile = view.screen_to_tile(x, y);
                self.last_tile = Some(tile);

                match (self.state, button) {
                    (ToolState::Idle, PointerButton::Secondary) => {
                        self.state = ToolState::PanDragging { last_x: x, last_y: y };
                    }
                    (ToolState::Idle, PointerButton::Primary) => match self.tool {
                        ShapeTool::Freehand => {
                            outcome.plane_changed = self.write(plane, tile);
                        }
                        tool => {
                            self.state = ToolState::ShapeDragging { tool, anchor: tile };
                        }
                    },
                    // A second button during a drag does not start anything
                    _ => {}
                }
            }
            PointerEvent::Move { x, y, primary_held } => {
                let tile = view.screen_to_tile(x, y);
                self.last_tile = Some(tile);

                match self.state {
                    ToolState::PanDragging { last_x, last_y } => {
                        view.pan_by(x - last_x, y - last_y);
                        self.state = ToolState::PanDragging { last_x: x, last_y: y };
                        outcome.view_changed = true;
                    }
                    ToolState::Idle if primary_held && self.tool == ShapeTool::Freehand => {
                        outcome.plane_changed = self.write(plane, tile);
                    }
                    ToolState::Idle | ToolState::ShapeDragging { .. } => {}
                }
            }
            PointerEvent::Up { button, at } => {
                if let Some((x, y)) = at {
                    self.last_tile = Some(view.screen_to_tile(x, y));
                }

                match (self.state, button) {
                    (ToolState::PanDragging { .. }, PointerButton::Secondary) => {
                        self.state = ToolState::Idle;
                    }
                    (ToolState::ShapeDragging { tool, anchor }, PointerButton::Primary) => {
                        self.state = ToolState::Idle;
                        let end = self.last_tile.unwrap_or(anchor);
                        for tile in shape_tiles(tool, anchor, end) {
                            outcome.plane_changed |= self.write(plane, tile);
                        }
                    }
                    _ => {}
                }
            }
            PointerEvent::Zoom { x, y, direction } => {
                let before = view.tile_size();
                let (offset_x, offset_y) = (view.offset_x, view.offset_y);
                view.zoom_step(x, y, direction);
                outcome.view_changed = view.tile_size() != before
                    || view.offset_x != offset_x
                    || view.offset_y != offset_y;
            }
        }

        outcome
    }

    /// Tiles the current shape drag would write if released now
    pub fn preview(&self) -> Option<Vec<(i32, i32)>> {
        match self.state {
            ToolState::ShapeDragging { tool, anchor } => {
                Some(shape_tiles(tool, anchor, self.last_tile.unwrap_or(anchor)))
            }
            _ => None,
        }
    }

    /// Write the selected value; returns whether the plane changed
    fn write(&self, plane: &mut CoordinatePlane, (x, y): (i32, i32)) -> bool {
        let previous = plane.set(x, y, self.selected);
        previous != self.selected
    }
}

fn shape_tiles(tool: ShapeTool, anchor: (i32, i32), end: (i32, i32)) -> Vec<(i32, i32)> {
    match tool {
        ShapeTool::Rectangle => rect_tiles(anchor, end),
        ShapeTool::Line => line_tiles(anchor, end),
        ShapeTool::Freehand => vec![end],
    }
}
