//! Editor tools - drawing, pan/zoom
//!
//! Translates Bevy mouse input into `PointerEvent`s for the `ToolEngine`.

mod engine;
pub mod raster;

pub use engine::{
    EngineOutcome, PointerButton, PointerEvent, ShapeTool, ToolEngine, ToolState,
};

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::project::Session;
use crate::view::ZoomDirection;
use crate::EditorState;

/// Plugin for editor tools and viewport input
pub struct EditorToolsPlugin;

impl Plugin for EditorToolsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewportInputState>()
            .add_systems(Update, (handle_viewport_input, handle_zoom_input));
    }
}

/// State for viewport input handling
#[derive(Resource, Default)]
pub struct ViewportInputState {
    /// Cursor position at the previous frame, in window pixels
    pub last_cursor: Option<Vec2>,
}

/// Mouse state sampled for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerFrame {
    pub cursor: Option<Vec2>,
    pub primary_pressed: bool,
    pub primary_just_pressed: bool,
    pub primary_just_released: bool,
    pub secondary_just_pressed: bool,
    pub secondary_just_released: bool,
    /// The UI owns the pointer; no new drags start and freehand does not paint
    pub blocked: bool,
}

impl PointerFrame {
    fn sample(buttons: &ButtonInput<MouseButton>, cursor: Option<Vec2>, blocked: bool) -> Self {
        let secondary = [MouseButton::Right, MouseButton::Middle];
        Self {
            cursor,
            primary_pressed: buttons.pressed(MouseButton::Left),
            primary_just_pressed: buttons.just_pressed(MouseButton::Left),
            primary_just_released: buttons.just_released(MouseButton::Left),
            secondary_just_pressed: buttons.any_just_pressed(secondary),
            secondary_just_released: buttons.any_just_released(secondary),
            blocked,
        }
    }
}

/// Pointer events for one frame: movement first, then presses, then releases
pub fn frame_events(frame: PointerFrame, last_cursor: Option<Vec2>) -> Vec<PointerEvent> {
    let mut events = Vec::new();

    if let Some(cursor) = frame.cursor {
        if Some(cursor) != last_cursor {
            events.push(PointerEvent::Move {
                x: cursor.x,
                y: cursor.y,
                primary_held: frame.primary_pressed && !frame.blocked,
            });
        }

        if !frame.blocked {
            if frame.primary_just_pressed {
                events.push(PointerEvent::Down {
                    button: PointerButton::Primary,
                    x: cursor.x,
                    y: cursor.y,
                });
            }
            if frame.secondary_just_pressed {
                events.push(PointerEvent::Down {
                    button: PointerButton::Secondary,
                    x: cursor.x,
                    y: cursor.y,
                });
            }
        }
    }

    let at = frame.cursor.map(|c| (c.x, c.y));
    if frame.primary_just_released {
        events.push(PointerEvent::Up {
            button: PointerButton::Primary,
            at,
        });
    }
    if frame.secondary_just_released {
        events.push(PointerEvent::Up {
            button: PointerButton::Secondary,
            at,
        });
    }

    events
}

fn handle_viewport_input(
    mut contexts: EguiContexts,
    mut editor_state: ResMut<EditorState>,
    mut session: ResMut<Session>,
    mut input_state: ResMut<ViewportInputState>,
    windows: Query<&Window>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Ok(window) = windows.single() else { return };

    if !session.is_ready() {
        editor_state.tools.cancel();
        return;
    }

    // wants_pointer_input() would also be true over the bare canvas
    let blocked = ctx.is_using_pointer() || ctx.is_pointer_over_area();
    let cursor = window.cursor_position();
    let frame = PointerFrame::sample(&mouse_buttons, cursor, blocked);

    let state = &mut *editor_state;
    for event in frame_events(frame, input_state.last_cursor) {
        let outcome = state.tools.handle(event, &mut state.view, &mut session.plane);
        if outcome.plane_changed {
            session.mark_edited();
        }
    }

    input_state.last_cursor = cursor;
}

#[allow(deprecated)] // EventReader is deprecated but still works in Bevy 0.17
fn handle_zoom_input(
    mut contexts: EguiContexts,
    mut editor_state: ResMut<EditorState>,
    mut session: ResMut<Session>,
    mut scroll_events: bevy::ecs::event::EventReader<MouseWheel>,
    windows: Query<&Window>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Ok(window) = windows.single() else { return };

    // Only block zoom if egui is actively using the pointer or hovering a panel
    let blocked = ctx.is_using_pointer() || ctx.is_pointer_over_area();
    let cursor = window.cursor_position();

    for event in scroll_events.read() {
        let Some(cursor) = cursor else { continue };
        if blocked || !session.is_ready() || event.y == 0.0 {
            continue;
        }
        let direction = if event.y > 0.0 {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        };

        let state = &mut *editor_state;
        state.tools.handle(
            PointerEvent::Zoom {
                x: cursor.x,
                y: cursor.y,
                direction,
            },
            &mut state.view,
            &mut session.plane,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_move() {
        let frame = PointerFrame {
            cursor: Some(Vec2::new(10.0, 20.0)),
            primary_pressed: true,
            primary_just_pressed: true,
            ..Default::default()
        };
        let events = frame_events(frame, None);
        assert_eq!(
            events,
            vec![
                PointerEvent::Move {
                    x: 10.0,
                    y: 20.0,
                    primary_held: true
                },
                PointerEvent::Down {
                    button: PointerButton::Primary,
                    x: 10.0,
                    y: 20.0
                },
            ]
        );

        // Same position next frame: nothing new
        let held = PointerFrame {
            primary_just_pressed: false,
            ..frame
        };
        assert!(frame_events(held, Some(Vec2::new(10.0, 20.0))).is_empty());
    }

    #[test]
    fn test_release_outside_window() {
        let frame = PointerFrame {
            cursor: None,
            primary_just_released: true,
            secondary_just_released: true,
            ..Default::default()
        };
        assert_eq!(
            frame_events(frame, Some(Vec2::ZERO)),
            vec![
                PointerEvent::Up {
                    button: PointerButton::Primary,
                    at: None
                },
                PointerEvent::Up {
                    button: PointerButton::Secondary,
                    at: None
                },
            ]
        );
    }

    #[test]
    fn test_blocked_frames_do_not_paint() {
        let frame = PointerFrame {
            cursor: Some(Vec2::new(5.0, 5.0)),
            primary_pressed: true,
            primary_just_pressed: true,
            secondary_just_pressed: true,
            blocked: true,
            ..Default::default()
        };
        assert_eq!(
            frame_events(frame, None),
            vec![PointerEvent::Move {
                x: 5.0,
                y: 5.0,
                primary_held: false
            }]
        );
    }
}
