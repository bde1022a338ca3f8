//! tilemap_editor - Pan/zoom editor for unbounded quadrant tile maps
//!
//! This crate provides an interactive editor for maps stored in the quadrant
//! format of `tilemap_core`:
//! - Freehand, rectangle and line drawing with a palette and eraser
//! - Pan (right/middle drag) and zoom around the cursor
//! - Optional read-only background map, shown, hidden or fogged
//! - `.tilemap` manifests listing the maps of a workspace
//! - Saving back to the map file, or `tiles.json5` at the workspace root
//!
//! # Usage
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use tilemap_editor::EditorPlugin;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(EditorPlugin::new().with_workspace("my_world"))
//!         .run();
//! }
//! ```

pub mod commands;
pub mod host;
pub mod preferences;
pub mod project;
pub mod render;
pub mod tools;
pub mod ui;
pub mod view;

pub use tilemap_core;

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tilemap_core::MapSources;

use commands::handle_keyboard_shortcuts;
use host::{HostBridge, HostReply, HostRequest, HostResponse, ReadPurpose, WorkspaceHost};
use preferences::EditorPreferences;
use project::Session;
use render::MapRenderPlugin;
use tools::{EditorToolsPlugin, ShapeTool, ToolEngine};
use ui::{EditorUiPlugin, PendingAction};
use view::ViewTransform;

/// How the background map is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackgroundMode {
    #[default]
    Visible,
    Hidden,
    /// Drawn under a translucent black veil
    Fog,
}

impl BackgroundMode {
    pub const ALL: [BackgroundMode; 3] = [
        BackgroundMode::Visible,
        BackgroundMode::Hidden,
        BackgroundMode::Fog,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BackgroundMode::Visible => "Visible",
            BackgroundMode::Hidden => "Hidden",
            BackgroundMode::Fog => "Fog",
        }
    }

    /// Next mode in toolbar order, wrapping around
    pub fn next(&self) -> Self {
        match self {
            BackgroundMode::Visible => BackgroundMode::Hidden,
            BackgroundMode::Hidden => BackgroundMode::Fog,
            BackgroundMode::Fog => BackgroundMode::Visible,
        }
    }
}

/// What to open once the editor has started
#[derive(Debug, Clone, Default, PartialEq, Eq, Resource)]
pub enum StartupOpen {
    /// Show the opener, or reopen the last manifest if preferences allow
    #[default]
    Nothing,
    Manifest(String),
    Map(MapSources),
}

/// Initial editor state configuration.
///
/// Fields left as `None` fall back to the saved preferences.
#[derive(Debug, Clone, Default)]
pub struct EditorStateConfig {
    pub show_grid: Option<bool>,
    pub initial_tile_size: Option<f32>,
    pub background_mode: Option<BackgroundMode>,
    /// Initial tool selection. Default: Freehand
    pub initial_tool: ShapeTool,
}

/// Main editor plugin with configurable workspace and initial state
///
/// # Example
///
/// ```rust,ignore
/// use bevy::prelude::*;
/// use tilemap_editor::{EditorPlugin, tools::ShapeTool};
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(
///         EditorPlugin::new()
///             .with_workspace("my_world")
///             .with_initial_grid(false)
///             .with_initial_tile_size(32.0)
///             .with_initial_tool(ShapeTool::Line)
///     )
///     .run();
/// ```
#[derive(Default)]
pub struct EditorPlugin {
    /// Workspace root. If None, the current working directory is used.
    pub workspace: Option<PathBuf>,
    pub initial_state: EditorStateConfig,
    pub startup: StartupOpen,
}

impl EditorPlugin {
    /// Create an editor plugin with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the workspace directory all map paths are relative to
    pub fn with_workspace(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace = Some(path.into());
        self
    }

    /// Set whether to show the grid on startup
    pub fn with_initial_grid(mut self, show: bool) -> Self {
        self.initial_state.show_grid = Some(show);
        self
    }

    /// Set the tile edge in pixels a map is first shown with
    pub fn with_initial_tile_size(mut self, tile_size: f32) -> Self {
        self.initial_state.initial_tile_size = Some(tile_size);
        self
    }

    pub fn with_initial_background_mode(mut self, mode: BackgroundMode) -> Self {
        self.initial_state.background_mode = Some(mode);
        self
    }

    /// Set the initial tool selection (default: Freehand)
    pub fn with_initial_tool(mut self, tool: ShapeTool) -> Self {
        self.initial_state.initial_tool = tool;
        self
    }

    /// Open a manifest as soon as the editor starts
    pub fn with_manifest(mut self, path: impl Into<String>) -> Self {
        self.startup = StartupOpen::Manifest(path.into());
        self
    }

    /// Open a map as soon as the editor starts
    pub fn with_map(mut self, sources: MapSources) -> Self {
        self.startup = StartupOpen::Map(sources);
        self
    }

    fn detect_workspace(&self) -> Option<PathBuf> {
        if let Some(path) = &self.workspace {
            return Some(path.clone());
        }
        std::env::current_dir().ok()
    }
}

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        let workspace = self.detect_workspace();
        match &workspace {
            Some(path) => bevy::log::info!("EditorPlugin: Using workspace: {:?}", path),
            None => bevy::log::warn!("EditorPlugin: No workspace folder available"),
        }

        let preferences = EditorPreferences::load();
        bevy::log::info!("Loaded editor preferences");

        // Plugin config takes precedence over saved preferences
        let editor_state = EditorState::from_config(&self.initial_state, &preferences);

        let host = WorkspaceHost::new(workspace);
        let bridge = HostBridge::new(Arc::new(host.clone()));

        app.add_plugins(EguiPlugin::default())
            .add_plugins(EditorUiPlugin)
            .add_plugins(MapRenderPlugin)
            .add_plugins(EditorToolsPlugin)
            .insert_resource(editor_state)
            .insert_resource(preferences)
            .insert_resource(Session::new())
            .insert_resource(host)
            .insert_resource(bridge)
            .insert_resource(self.startup.clone())
            .add_systems(Startup, (setup_editor_camera, queue_startup_open))
            .add_systems(
                Update,
                (
                    handle_keyboard_shortcuts,
                    process_pending_actions,
                    handle_host_responses,
                )
                    .chain(),
            );
    }
}

/// Spawns the editor camera if one doesn't exist
fn setup_editor_camera(mut commands: Commands, camera_query: Query<&Camera2d>) {
    if camera_query.is_empty() {
        commands.spawn(Camera2d);
    }
}

fn queue_startup_open(
    startup: Res<StartupOpen>,
    preferences: Res<EditorPreferences>,
    host: Res<WorkspaceHost>,
    mut editor_state: ResMut<EditorState>,
) {
    editor_state.pending_action = match &*startup {
        StartupOpen::Manifest(path) => Some(PendingAction::OpenManifest(path.clone())),
        StartupOpen::Map(sources) => Some(PendingAction::OpenMap(sources.clone())),
        StartupOpen::Nothing => {
            let workspace = host.root().map(|p| p.to_string_lossy().to_string());
            workspace
                .filter(|_| preferences.auto_open_last_manifest)
                .and_then(|ws| preferences.last_manifest(&ws).map(str::to_string))
                .map(|path| {
                    info!("Reopening last manifest: {}", path);
                    PendingAction::OpenManifest(path)
                })
        }
    };
}

/// Turn queued UI and shortcut actions into host requests
fn process_pending_actions(
    mut editor_state: ResMut<EditorState>,
    mut session: ResMut<Session>,
    preferences: Res<EditorPreferences>,
    bridge: Res<HostBridge>,
) {
    let Some(action) = editor_state.pending_action.take() else {
        return;
    };

    match action {
        PendingAction::Save => {
            if !session.is_ready() {
                return;
            }
            let request = session.save_request(&preferences.export_file_name);
            let id = bridge.submit(request);
            session.begin_save(id);
            info!("Saving map to {}", session.save_path(&preferences.export_file_name));
        }
        PendingAction::OpenMap(sources) => {
            info!("Opening map with resource {}", sources.resource);
            bridge.submit(HostRequest::ReadTexts {
                paths: sources.paths(),
                purpose: ReadPurpose::OpenMap(sources),
            });
        }
        PendingAction::OpenManifest(path) => {
            info!("Opening manifest {}", path);
            bridge.submit(HostRequest::ReadTexts {
                paths: vec![path.clone()],
                purpose: ReadPurpose::OpenManifest(path),
            });
        }
        PendingAction::StartEntry(name) => {
            let entry = session
                .manifest
                .as_ref()
                .and_then(|open| open.manifest.entry(&name));
            match entry {
                Some(entry) => {
                    editor_state.pending_action = Some(PendingAction::OpenMap(entry.sources()));
                }
                None => {
                    warn!("No manifest entry named {}", name);
                }
            }
        }
    }
}

/// Apply finished host requests to the session
fn handle_host_responses(
    mut editor_state: ResMut<EditorState>,
    mut session: ResMut<Session>,
    mut preferences: ResMut<EditorPreferences>,
    bridge: Res<HostBridge>,
    host: Res<WorkspaceHost>,
) {
    while let Some(response) = bridge.try_recv() {
        apply_host_response(
            response,
            &mut editor_state,
            &mut session,
            &mut preferences,
            &bridge,
            &host,
        );
    }
}

fn apply_host_response(
    response: HostResponse,
    editor_state: &mut EditorState,
    session: &mut Session,
    preferences: &mut EditorPreferences,
    bridge: &HostBridge,
    host: &WorkspaceHost,
) {
    let HostResponse { id, reply } = response;

    match reply {
        HostReply::Texts {
            purpose: ReadPurpose::OpenMap(sources),
            contents,
        } => {
            let result = contents
                .map_err(project::SessionError::from)
                .and_then(|contents| session.apply_open(&sources, contents));
            match result {
                Ok(()) => {
                    info!(
                        "Opened {} ({} tiles)",
                        sources.tilemap.as_deref().unwrap_or("new map"),
                        session.plane.len()
                    );
                    editor_state.reset_view();
                    editor_state.show_opener = false;
                    editor_state.show_manifest = false;
                    for request in session.image_requests() {
                        bridge.submit(request);
                    }
                    // The opener has closed, so the background note goes to the error window
                    if let Some(background_error) = &session.input_errors.background {
                        editor_state.error_message =
                            Some(format!("Background not loaded: {}", background_error));
                    }
                }
                Err(e) => {
                    warn!("Failed to open map: {}", e);
                    editor_state.error_message = Some(format!("Failed to open map: {}", e));
                }
            }
        }
        HostReply::Texts {
            purpose: ReadPurpose::OpenManifest(path),
            contents,
        } => {
            let result = contents
                .map_err(project::SessionError::from)
                .and_then(|mut texts| session.apply_manifest(&path, texts.pop().flatten()));
            let workspace = host.root().map(|p| p.to_string_lossy().to_string());
            match result {
                Ok(()) => {
                    info!("Opened manifest {}", path);
                    editor_state.show_manifest = true;
                    if let Some(ws) = workspace {
                        preferences.add_recent(&ws, &path);
                    }
                }
                Err(e) => {
                    warn!("Failed to open manifest {}: {}", path, e);
                    editor_state.error_message = Some(format!("Failed to open manifest: {}", e));
                    if let Some(ws) = workspace {
                        preferences.remove_recent(&ws, &path);
                    }
                }
            }
            if let Err(e) = preferences.save() {
                error!("Failed to save preferences: {}", e);
            }
        }
        HostReply::Images { target, uris } => match uris {
            Ok(uris) => {
                let missing = uris.iter().filter(|u| u.is_none()).count();
                if missing > 0 {
                    warn!("{} palette images not found", missing);
                }
                session.apply_images(target, uris);
            }
            Err(e) => {
                error!("Failed to resolve palette images: {}", e);
                editor_state.error_message = Some(format!("Failed to load images: {}", e));
            }
        },
        HostReply::Written { path, result } => match session.finish_save(id, result) {
            Ok(()) => info!("Saved map to {}", path),
            Err(e) => {
                error!("Failed to save {}: {}", path, e);
                editor_state.error_message = Some(format!("Failed to save: {}", e));
            }
        },
    }
}

/// Text typed into the opener window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenerForm {
    pub resource: String,
    pub map: String,
    pub background: String,
    pub background_resource: String,
    pub manifest: String,
}

impl OpenerForm {
    /// Sources for the typed paths. `None` until a resource path is given.
    pub fn sources(&self) -> Option<MapSources> {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Some(MapSources {
            resource: non_empty(&self.resource)?,
            tilemap: non_empty(&self.map),
            background: non_empty(&self.background),
            background_resource: non_empty(&self.background_resource),
        })
    }
}

/// Global editor state
#[derive(Resource)]
pub struct EditorState {
    pub view: ViewTransform,
    pub tools: ToolEngine,
    /// Tile size a newly opened map is shown with
    pub initial_tile_size: f32,
    pub show_grid: bool,
    pub background_mode: BackgroundMode,

    // Dialogs
    pub show_opener: bool,
    pub show_manifest: bool,
    pub opener: OpenerForm,
    pub error_message: Option<String>,

    pub pending_action: Option<PendingAction>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            view: ViewTransform::default(),
            tools: ToolEngine::default(),
            initial_tile_size: 48.0,
            show_grid: true,
            background_mode: BackgroundMode::Visible,
            show_opener: true,
            show_manifest: false,
            opener: OpenerForm::default(),
            error_message: None,
            pending_action: None,
        }
    }
}

impl EditorState {
    /// Build the initial state from preferences with plugin overrides applied
    pub fn from_config(config: &EditorStateConfig, preferences: &EditorPreferences) -> Self {
        let initial_tile_size = config
            .initial_tile_size
            .unwrap_or(preferences.initial_tile_size);
        let view = ViewTransform::centered(800.0, 600.0, initial_tile_size, preferences.zoom);

        Self {
            view,
            tools: ToolEngine::new(config.initial_tool),
            initial_tile_size,
            show_grid: config.show_grid.unwrap_or(preferences.show_grid),
            background_mode: config
                .background_mode
                .unwrap_or(preferences.background_mode),
            ..Default::default()
        }
    }

    /// Center the plane origin and restore the initial tile size
    pub fn reset_view(&mut self) {
        let view = &self.view;
        self.view = ViewTransform::centered(
            view.canvas_width,
            view.canvas_height,
            self.initial_tile_size,
            view.zoom,
        );
        self.tools.cancel();
    }
}
