//! Opener, manifest and error dialogs

use bevy_egui::egui;

use super::PendingAction;
use crate::host::WorkspaceHost;
use crate::project::Session;
use crate::EditorState;

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 90, 90);

fn error_label(ui: &mut egui::Ui, error: Option<&String>) {
    if let Some(error) = error {
        ui.colored_label(ERROR_COLOR, error);
    }
}

/// Text field with an optional file browse button that stores a
/// workspace-relative path
fn path_field(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut String,
    host: &WorkspaceHost,
    extensions: &[&str],
    error_message: &mut Option<String>,
) {
    ui.label(label);
    ui.horizontal(|ui| {
        ui.text_edit_singleline(value);
        #[cfg(feature = "native")]
        if ui.button("Browse...").clicked() {
            let mut dialog = rfd::FileDialog::new().add_filter("Files", extensions);
            if let Some(root) = host.root() {
                dialog = dialog.set_directory(root);
            }
            if let Some(path) = dialog.pick_file() {
                match host.to_relative(&path) {
                    Some(relative) => *value = relative,
                    None => {
                        *error_message = Some(format!(
                            "{} is outside the workspace folder",
                            path.display()
                        ));
                    }
                }
            }
        }
        #[cfg(not(feature = "native"))]
        let _ = (host, extensions, &error_message);
    });
    ui.end_row();
}

/// Window for choosing a resource descriptor and map, or a manifest
pub fn render_opener(
    ctx: &egui::Context,
    editor_state: &mut EditorState,
    session: &Session,
    host: &WorkspaceHost,
) {
    let mut open = true;
    let mut close_requested = false;
    let state = editor_state;

    let mut window = egui::Window::new("Open Map")
        .collapsible(false)
        .resizable(false)
        .default_width(420.0);
    // The opener can only be dismissed once a map is open
    if session.is_ready() {
        window = window.open(&mut open);
    }

    window.show(ctx, |ui| {
        if host.root().is_none() {
            ui.colored_label(ERROR_COLOR, "No workspace folder is open");
            ui.separator();
        }

        egui::Grid::new("opener_paths")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                path_field(
                    ui,
                    "Resource:",
                    &mut state.opener.resource,
                    host,
                    &["json5", "json"],
                    &mut state.error_message,
                );
                path_field(
                    ui,
                    "Map:",
                    &mut state.opener.map,
                    host,
                    &["json5", "json"],
                    &mut state.error_message,
                );
                path_field(
                    ui,
                    "Background:",
                    &mut state.opener.background,
                    host,
                    &["json5", "json"],
                    &mut state.error_message,
                );
                path_field(
                    ui,
                    "Background resource:",
                    &mut state.opener.background_resource,
                    host,
                    &["json5", "json"],
                    &mut state.error_message,
                );
            });

        error_label(ui, session.input_errors.resource.as_ref());
        error_label(ui, session.input_errors.map.as_ref());
        error_label(ui, session.input_errors.background.as_ref());

        ui.horizontal(|ui| {
            let sources = state.opener.sources();
            if ui
                .add_enabled(sources.is_some(), egui::Button::new("Open"))
                .on_disabled_hover_text("A resource file is required")
                .clicked()
            {
                state.pending_action = sources.map(PendingAction::OpenMap);
            }
            if session.is_ready() && ui.button("Cancel").clicked() {
                close_requested = true;
            }
        });

        ui.separator();

        egui::Grid::new("opener_manifest")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                path_field(
                    ui,
                    "Manifest:",
                    &mut state.opener.manifest,
                    host,
                    &["tilemap"],
                    &mut state.error_message,
                );
            });
        error_label(ui, session.input_errors.manifest.as_ref());

        let manifest = state.opener.manifest.trim().to_string();
        if ui
            .add_enabled(!manifest.is_empty(), egui::Button::new("Open manifest"))
            .clicked()
        {
            state.pending_action = Some(PendingAction::OpenManifest(manifest));
        }
    });

    if !open || close_requested {
        state.show_opener = false;
    }
}

/// List of the maps in the open manifest
pub fn render_manifest_window(ctx: &egui::Context, editor_state: &mut EditorState, session: &Session) {
    if !editor_state.show_manifest {
        return;
    }
    let Some(open_manifest) = &session.manifest else {
        return;
    };

    let mut open = true;
    egui::Window::new(format!("Maps - {}", open_manifest.path))
        .id(egui::Id::new("manifest_window"))
        .collapsible(false)
        .open(&mut open)
        .show(ctx, |ui| {
            if open_manifest.manifest.entries.is_empty() {
                ui.label("(no maps)");
            }
            egui::Grid::new("manifest_entries")
                .num_columns(3)
                .striped(true)
                .show(ui, |ui| {
                    for entry in &open_manifest.manifest.entries {
                        ui.label(&entry.name);
                        ui.label(&entry.tilemap);
                        if ui.button("Start").clicked() {
                            editor_state.pending_action =
                                Some(PendingAction::StartEntry(entry.name.clone()));
                        }
                        ui.end_row();
                    }
                });
        });

    if !open {
        editor_state.show_manifest = false;
    }
}

pub fn render_error_dialog(ctx: &egui::Context, editor_state: &mut EditorState) {
    let Some(error_msg) = editor_state.error_message.clone() else {
        return;
    };

    egui::Window::new("Error")
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(&error_msg);
            ui.separator();
            if ui.button("OK").clicked() {
                editor_state.error_message = None;
            }
        });
}
