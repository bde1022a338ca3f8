//! UI module for the editor
//!
//! Uses bevy_egui for the toolbar, the palette and the opener dialogs.

mod dialogs;
mod toolbar;

pub use dialogs::{render_error_dialog, render_manifest_window, render_opener};
pub use toolbar::render_toolbar;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass, EguiTextureHandle};
use tilemap_core::MapSources;

use crate::host::WorkspaceHost;
use crate::project::Session;
use crate::EditorState;

/// Work queued by the UI or a shortcut, carried out by the editor systems
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Save,
    OpenMap(MapSources),
    OpenManifest(String),
    /// Open the manifest entry with this name
    StartEntry(String),
}

/// State of an image load operation
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageLoadState {
    /// No image location known yet
    #[default]
    Pending,
    /// Currently loading
    Loading,
    /// Successfully loaded
    Loaded,
    /// Failed to load
    Failed(String),
}

/// One palette image
#[derive(Debug, Clone, Default)]
pub struct PaletteSlot {
    pub uri: Option<String>,
    pub handle: Option<Handle<Image>>,
    pub texture_id: Option<egui::TextureId>,
    pub state: ImageLoadState,
}

impl PaletteSlot {
    /// Handle to draw with, once the image has loaded
    pub fn loaded_handle(&self) -> Option<Handle<Image>> {
        match self.state {
            ImageLoadState::Loaded => self.handle.clone(),
            _ => None,
        }
    }
}

/// Resource to track palette texture loading
#[derive(Resource, Default)]
pub struct PaletteTextureCache {
    pub main: Vec<PaletteSlot>,
    /// Slots for `Session::background_palette`, which may be the main palette
    pub background: Vec<PaletteSlot>,
    /// Bumped whenever a slot starts or stops being drawable
    pub generation: u64,
}

/// Resize `slots` to match `uris` and reset every slot whose URI changed.
/// Returns the indices that need a new load.
pub fn sync_slots(slots: &mut Vec<PaletteSlot>, uris: &[Option<String>]) -> Vec<usize> {
    slots.truncate(uris.len());
    slots.resize_with(uris.len(), PaletteSlot::default);

    let mut changed = Vec::new();
    for (index, (slot, uri)) in slots.iter_mut().zip(uris).enumerate() {
        if slot.uri != *uri || (uri.is_some() && slot.handle.is_none()) {
            *slot = PaletteSlot {
                uri: uri.clone(),
                ..Default::default()
            };
            if uri.is_some() {
                changed.push(index);
            }
        }
    }
    changed
}

/// Main UI plugin
pub struct EditorUiPlugin;

impl Plugin for EditorUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PaletteTextureCache>()
            .add_systems(Update, load_palette_textures)
            .add_systems(EguiPrimaryContextPass, render_ui);
    }
}

/// System to load palette images and register them with egui
fn load_palette_textures(
    mut cache: ResMut<PaletteTextureCache>,
    mut contexts: EguiContexts,
    asset_server: Res<AssetServer>,
    session: Res<Session>,
) {
    use bevy::asset::LoadState;

    let cache = &mut *cache;
    let mut changed = false;

    for (slots, uris) in [
        (&mut cache.main, session.palette_uris.as_slice()),
        (&mut cache.background, session.background_palette()),
    ] {
        let before = slots.len();
        for index in sync_slots(slots, uris) {
            let slot = &mut slots[index];
            if let Some(uri) = &slot.uri {
                slot.handle = Some(asset_server.load(uri.clone()));
                slot.state = ImageLoadState::Loading;
            }
            changed = true;
        }
        changed |= before != slots.len();

        for slot in slots.iter_mut() {
            if slot.state != ImageLoadState::Loading {
                continue;
            }
            let Some(handle) = slot.handle.clone() else {
                continue;
            };
            match asset_server.load_state(&handle) {
                LoadState::Loaded => {
                    slot.texture_id = Some(contexts.add_image(EguiTextureHandle::Strong(handle)));
                    slot.state = ImageLoadState::Loaded;
                    changed = true;
                }
                LoadState::Failed(_) => {
                    let uri = slot.uri.as_deref().unwrap_or_default();
                    warn!("Failed to load palette image: {}", uri);
                    slot.state = ImageLoadState::Failed(format!("Failed to load: {}", uri));
                    changed = true;
                }
                LoadState::Loading | LoadState::NotLoaded => {}
            }
        }
    }

    if changed {
        cache.generation += 1;
    }
}

/// Main UI rendering system
fn render_ui(
    mut contexts: EguiContexts,
    mut editor_state: ResMut<EditorState>,
    session: Res<Session>,
    cache: Res<PaletteTextureCache>,
    host: Res<WorkspaceHost>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    if session.is_ready() {
        render_toolbar(ctx, &mut editor_state, &session, &cache);
    }

    if editor_state.show_opener || !session.is_ready() {
        render_opener(ctx, &mut editor_state, &session, &host);
    }

    render_manifest_window(ctx, &mut editor_state, &session);
    render_error_dialog(ctx, &mut editor_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(items: &[Option<&str>]) -> Vec<Option<String>> {
        items.iter().map(|u| u.map(str::to_string)).collect()
    }

    #[test]
    fn test_sync_slots_grows_and_shrinks() {
        let mut slots = Vec::new();
        let changed = sync_slots(&mut slots, &uris(&[Some("a.png"), None, Some("c.png")]));
        assert_eq!(changed, vec![0, 2]);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[1].state, ImageLoadState::Pending);

        sync_slots(&mut slots, &uris(&[Some("a.png")]));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_sync_slots_keeps_loaded() {
        let mut slots = vec![PaletteSlot {
            uri: Some("a.png".to_string()),
            handle: Some(Handle::default()),
            texture_id: None,
            state: ImageLoadState::Loaded,
        }];

        let changed = sync_slots(&mut slots, &uris(&[Some("a.png"), Some("b.png")]));
        assert_eq!(changed, vec![1]);
        assert_eq!(slots[0].state, ImageLoadState::Loaded);
        assert!(slots[0].loaded_handle().is_some());

        let changed = sync_slots(&mut slots, &uris(&[Some("z.png"), Some("b.png")]));
        assert_eq!(changed, vec![0, 1], "replaced and still unloaded");
        assert!(slots[0].loaded_handle().is_none());
    }
}
