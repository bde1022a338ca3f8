//! Keyboard shortcut handling

use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::tools::ShapeTool;
use crate::ui::PendingAction;
use crate::EditorState;

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Save,
    SelectTool(ShapeTool),
    Eraser,
    ToggleGrid,
    CycleBackground,
}

/// Map a key pressed this frame to a shortcut
pub fn shortcut_for(key: KeyCode, ctrl: bool) -> Option<Shortcut> {
    if ctrl {
        return (key == KeyCode::KeyS).then_some(Shortcut::Save);
    }
    match key {
        KeyCode::KeyD => Some(Shortcut::SelectTool(ShapeTool::Freehand)),
        KeyCode::KeyR => Some(Shortcut::SelectTool(ShapeTool::Rectangle)),
        KeyCode::KeyL => Some(Shortcut::SelectTool(ShapeTool::Line)),
        KeyCode::KeyE => Some(Shortcut::Eraser),
        KeyCode::KeyG => Some(Shortcut::ToggleGrid),
        KeyCode::KeyB => Some(Shortcut::CycleBackground),
        _ => None,
    }
}

/// Apply a shortcut to the editor state
pub fn apply_shortcut(editor_state: &mut EditorState, shortcut: Shortcut) {
    match shortcut {
        Shortcut::Save => editor_state.pending_action = Some(PendingAction::Save),
        Shortcut::SelectTool(tool) => {
            editor_state.tools.cancel();
            editor_state.tools.tool = tool;
        }
        Shortcut::Eraser => editor_state.tools.selected = None,
        Shortcut::ToggleGrid => editor_state.show_grid = !editor_state.show_grid,
        Shortcut::CycleBackground => {
            editor_state.background_mode = editor_state.background_mode.next();
        }
    }
}

/// Handle keyboard shortcuts
pub fn handle_keyboard_shortcuts(
    mut contexts: EguiContexts,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut editor_state: ResMut<EditorState>,
) {
    // Typing into a path field must not trigger tools
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_keyboard_input() {
            return;
        }
    }

    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);

    for key in keyboard.get_just_pressed() {
        if let Some(shortcut) = shortcut_for(*key, ctrl) {
            apply_shortcut(&mut editor_state, shortcut);
        }
    }
}
