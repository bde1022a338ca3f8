//! Toolbar UI for tool, palette and view selection

use bevy_egui::egui;

use super::{ImageLoadState, PaletteSlot, PaletteTextureCache, PendingAction};
use crate::project::Session;
use crate::tools::ShapeTool;
use crate::{BackgroundMode, EditorState};

const PALETTE_BUTTON_SIZE: f32 = 32.0;
const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(70, 140, 230);

/// Render the toolbar
pub fn render_toolbar(
    ctx: &egui::Context,
    editor_state: &mut EditorState,
    session: &Session,
    cache: &PaletteTextureCache,
) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label("Tool:");
            let current = editor_state.tools.tool;
            egui::ComboBox::from_id_salt("shape_tool")
                .selected_text(current.label())
                .width(100.0)
                .show_ui(ui, |ui| {
                    for tool in ShapeTool::ALL {
                        if ui.selectable_label(current == tool, tool.label()).clicked() {
                            editor_state.tools.cancel();
                            editor_state.tools.tool = tool;
                        }
                    }
                });

            ui.separator();

            if ui
                .button("Save")
                .on_hover_text("Save map (Ctrl+S)")
                .clicked()
            {
                editor_state.pending_action = Some(PendingAction::Save);
            }
            let name = ui.label(session.display_name());
            if let Some(resource_path) = &session.resource_path {
                name.on_hover_text(format!("Resource: {}", resource_path));
            }
            if session.has_pending_saves() {
                ui.weak("Saving...");
            }

            ui.separator();

            // Grid toggle
            ui.checkbox(&mut editor_state.show_grid, "Grid")
                .on_hover_text("Toggle grid (G)");

            if session.background.is_some() {
                ui.separator();
                ui.label("Background:");
                egui::ComboBox::from_id_salt("background_mode")
                    .selected_text(editor_state.background_mode.label())
                    .width(80.0)
                    .show_ui(ui, |ui| {
                        for mode in BackgroundMode::ALL {
                            ui.selectable_value(&mut editor_state.background_mode, mode, mode.label());
                        }
                    });
            }

            ui.separator();

            if ui.button("Open...").clicked() {
                editor_state.show_opener = true;
            }
            if session.manifest.is_some() && ui.button("Maps").clicked() {
                editor_state.show_manifest = true;
            }

            ui.separator();
            ui.label(format!("{:.0}px", editor_state.view.tile_size()));
        });

        ui.separator();
        render_palette(ui, editor_state, session, cache);
    });
}

/// Palette buttons for each tile value, plus the eraser
fn render_palette(
    ui: &mut egui::Ui,
    editor_state: &mut EditorState,
    session: &Session,
    cache: &PaletteTextureCache,
) {
    egui::ScrollArea::horizontal().show(ui, |ui| {
        ui.horizontal(|ui| {
            let eraser_selected = editor_state.tools.selected.is_none();
            if ui
                .selectable_label(eraser_selected, "Eraser")
                .on_hover_text("Erase tiles (E)")
                .clicked()
            {
                editor_state.tools.selected = None;
            }

            let size = egui::vec2(PALETTE_BUTTON_SIZE, PALETTE_BUTTON_SIZE);
            // The texture cache catches up with a newly opened palette a frame later
            for index in 0..session.palette_len() {
                let value = index as u32;
                let selected = editor_state.tools.selected == Some(value);
                let slot = cache.main.get(index);

                let response = match slot.and_then(|s| s.texture_id) {
                    Some(texture_id) => {
                        #[allow(deprecated)]
                        let response = ui.add(
                            egui::ImageButton::new(egui::load::SizedTexture::new(texture_id, size))
                                .frame(false)
                                .rounding(0.0),
                        );
                        response
                    }
                    None => ui.add_sized(size, egui::Button::new(value.to_string())),
                };

                let hover = match slot {
                    Some(PaletteSlot {
                        state: ImageLoadState::Failed(e),
                        ..
                    }) => e.clone(),
                    Some(PaletteSlot { uri: Some(uri), .. }) => uri.clone(),
                    _ => "Image not found".to_string(),
                };
                let response = response.on_hover_text(format!("{}: {}", value, hover));

                // Draw selection border manually (doesn't obscure content)
                if selected {
                    ui.painter().rect_stroke(
                        response.rect,
                        0.0,
                        egui::Stroke::new(2.0, SELECTION_COLOR),
                        egui::StrokeKind::Inside,
                    );
                }

                if response.clicked() {
                    editor_state.tools.selected = Some(value);
                }
            }
        });
    });
}
