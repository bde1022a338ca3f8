//! Map rendering for the editor viewport
//!
//! The camera stays at the world origin with scale 1, so one world unit is one
//! logical pixel. Pan and zoom live in `EditorState::view`; every sprite is
//! placed by converting its tile's screen rectangle to world space. Sprites
//! are rebuilt only when the plane, the view or the loaded textures change.

use bevy::prelude::*;
use tilemap_core::CoordinatePlane;

use crate::preferences::EditorPreferences;
use crate::project::Session;
use crate::ui::PaletteTextureCache;
use crate::view::ViewTransform;
use crate::{BackgroundMode, EditorState};

const BACKGROUND_Z: f32 = 0.0;
const FOG_Z: f32 = 5.0;
const TILE_Z: f32 = 10.0;
const PREVIEW_Z: f32 = 20.0;
const GRID_Z: f32 = 100.0;

/// Opacity of the veil drawn over the background in fog mode
const FOG_ALPHA: f32 = 0.1;

/// Plugin for map rendering
pub struct MapRenderPlugin;

impl Plugin for MapRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RenderState>()
            .add_systems(Update, sync_canvas_size)
            .add_systems(
                Update,
                (sync_map_rendering, sync_shape_preview, sync_grid_rendering)
                    .after(sync_canvas_size),
            );
    }
}

/// What is currently on screen, for change detection
#[derive(Resource, Default)]
pub struct RenderState {
    /// Session revision, view, background mode and texture generation last drawn
    pub last_map: Option<(u64, ViewTransform, BackgroundMode, u64)>,
    pub map_entities: Vec<Entity>,
    pub last_preview: Option<(Vec<(i32, i32)>, ViewTransform)>,
    pub preview_entities: Vec<Entity>,
    pub last_grid: Option<(ViewTransform, i32)>,
    pub grid_entities: Vec<Entity>,
}

/// Marker component for tile and background sprites
#[derive(Component)]
pub struct MapTileSprite;

/// Marker component for the shape preview
#[derive(Component)]
pub struct ShapePreview;

/// Marker component for the grid overlay
#[derive(Component)]
pub struct GridLine;

/// World position of a screen point, with the camera centered on the window
pub fn screen_to_world(sx: f32, sy: f32, canvas_width: f32, canvas_height: f32) -> Vec2 {
    Vec2::new(sx - canvas_width / 2.0, canvas_height / 2.0 - sy)
}

/// World-space center of a tile
pub fn tile_center_world(view: &ViewTransform, tile_x: i32, tile_y: i32) -> Vec2 {
    let (sx, sy) = view.tile_to_screen(tile_x, tile_y);
    let half = view.tile_size() / 2.0;
    screen_to_world(sx + half, sy + half, view.canvas_width, view.canvas_height)
}

/// Tiles of a sparse layer that fall inside the view
pub fn visible_tiles(view: &ViewTransform, plane: &CoordinatePlane) -> Vec<((i32, i32), u32)> {
    let (min_x, min_y, max_x, max_y) = view.visible_tiles();
    plane.tiles_in_region(min_x, min_y, max_x, max_y)
}

/// Reference grid lines in screen pixels
#[derive(Debug, Clone, PartialEq)]
pub struct GridLines {
    /// Screen x of each vertical line
    pub vertical: Vec<f32>,
    /// Screen y of each horizontal line
    pub horizontal: Vec<f32>,
    /// Screen y range the vertical lines cover
    pub vertical_span: (f32, f32),
    /// Screen x range the horizontal lines cover
    pub horizontal_span: (f32, f32),
}

/// Grid lines on tile boundaries `-extent..=extent`, clipped to the canvas.
/// Both outer boundaries are drawn so the grid area is closed on every side.
/// `None` when the grid area is entirely off screen.
pub fn grid_lines(view: &ViewTransform, extent: i32) -> Option<GridLines> {
    let ts = view.tile_size();
    let (w, h) = (view.canvas_width, view.canvas_height);
    let extent = extent.max(0);

    // Boundary i sits at x = offset_x + i * ts, boundary j at y = h - offset_y - j * ts
    let first_x = ((-view.offset_x / ts).ceil() as i64).max(-extent as i64);
    let last_x = (((w - view.offset_x) / ts).floor() as i64).min(extent as i64);
    let first_y = ((-view.offset_y / ts).ceil() as i64).max(-extent as i64);
    let last_y = (((h - view.offset_y) / ts).floor() as i64).min(extent as i64);

    if first_x > last_x || first_y > last_y {
        return None;
    }

    let vertical = (first_x..=last_x)
        .map(|i| view.offset_x + i as f32 * ts)
        .collect();
    let horizontal = (first_y..=last_y)
        .map(|j| h - view.offset_y - j as f32 * ts)
        .collect();

    let extent = extent as f32;
    let horizontal_span = (
        (view.offset_x - extent * ts).max(0.0),
        (view.offset_x + extent * ts).min(w),
    );
    let vertical_span = (
        (h - view.offset_y - extent * ts).max(0.0),
        (h - view.offset_y + extent * ts).min(h),
    );

    Some(GridLines {
        vertical,
        horizontal,
        vertical_span,
        horizontal_span,
    })
}

/// Keep the view's canvas size in step with the window
fn sync_canvas_size(mut editor_state: ResMut<EditorState>, windows: Query<&Window>) {
    let Ok(window) = windows.single() else { return };
    let (width, height) = (window.width(), window.height());
    if editor_state.view.canvas_width != width || editor_state.view.canvas_height != height {
        editor_state.view.resize(width, height);
    }
}

fn despawn_all(commands: &mut Commands, entities: &mut Vec<Entity>) {
    for entity in entities.drain(..) {
        let _ = commands.get_entity(entity).map(|mut e| e.despawn());
    }
}

fn spawn_tile(
    commands: &mut Commands,
    view: &ViewTransform,
    (x, y): (i32, i32),
    image: Handle<Image>,
    z: f32,
) -> Entity {
    let center = tile_center_world(view, x, y);
    commands
        .spawn((
            Sprite {
                image,
                custom_size: Some(Vec2::splat(view.tile_size())),
                ..default()
            },
            Transform::from_xyz(center.x, center.y, z),
            MapTileSprite,
        ))
        .id()
}

/// Rebuild background, fog and tile sprites when anything they depend on changes
fn sync_map_rendering(
    mut commands: Commands,
    mut render_state: ResMut<RenderState>,
    editor_state: Res<EditorState>,
    session: Res<Session>,
    textures: Res<PaletteTextureCache>,
) {
    let key = (
        session.revision,
        editor_state.view,
        editor_state.background_mode,
        textures.generation,
    );
    if render_state.last_map.as_ref() == Some(&key) {
        return;
    }
    render_state.last_map = Some(key);

    let mut entities = std::mem::take(&mut render_state.map_entities);
    despawn_all(&mut commands, &mut entities);

    if !session.is_ready() {
        return;
    }

    let view = &editor_state.view;

    if let Some(background) = &session.background {
        if editor_state.background_mode != BackgroundMode::Hidden {
            for (pos, tile) in visible_tiles(view, &background.plane) {
                if let Some(image) = textures.background.get(tile as usize).and_then(|s| s.loaded_handle()) {
                    entities.push(spawn_tile(&mut commands, view, pos, image, BACKGROUND_Z));
                }
            }
        }

        if editor_state.background_mode == BackgroundMode::Fog {
            let fog = commands
                .spawn((
                    Sprite {
                        color: Color::srgba(0.0, 0.0, 0.0, FOG_ALPHA),
                        custom_size: Some(Vec2::new(view.canvas_width, view.canvas_height)),
                        ..default()
                    },
                    Transform::from_xyz(0.0, 0.0, FOG_Z),
                    MapTileSprite,
                ))
                .id();
            entities.push(fog);
        }
    }

    for (pos, tile) in visible_tiles(view, &session.plane) {
        // Unloaded or failed images do not draw
        if let Some(image) = textures.main.get(tile as usize).and_then(|s| s.loaded_handle()) {
            entities.push(spawn_tile(&mut commands, view, pos, image, TILE_Z));
        }
    }

    render_state.map_entities = entities;
}

/// Draw the tiles a shape drag would write
fn sync_shape_preview(
    mut commands: Commands,
    mut render_state: ResMut<RenderState>,
    editor_state: Res<EditorState>,
) {
    let view = editor_state.view;
    let preview = editor_state.tools.preview();

    let current = preview.clone().map(|tiles| (tiles, view));
    if render_state.last_preview == current {
        return;
    }
    render_state.last_preview = current;

    let mut entities = std::mem::take(&mut render_state.preview_entities);
    despawn_all(&mut commands, &mut entities);

    let Some(tiles) = preview else {
        return;
    };

    let color = if editor_state.tools.selected.is_some() {
        Color::srgba(0.2, 0.4, 0.8, 0.4) // Blue for fill
    } else {
        Color::srgba(0.8, 0.2, 0.2, 0.4) // Red for erase
    };

    let (min_x, min_y, max_x, max_y) = view.visible_tiles();
    for (x, y) in tiles {
        if x < min_x || x > max_x || y < min_y || y > max_y {
            continue;
        }
        let center = tile_center_world(&view, x, y);
        let entity = commands
            .spawn((
                Sprite {
                    color,
                    custom_size: Some(Vec2::splat(view.tile_size())),
                    ..default()
                },
                Transform::from_xyz(center.x, center.y, PREVIEW_Z),
                ShapePreview,
            ))
            .id();
        entities.push(entity);
    }

    render_state.preview_entities = entities;
}

fn sync_grid_rendering(
    mut commands: Commands,
    mut render_state: ResMut<RenderState>,
    editor_state: Res<EditorState>,
    preferences: Res<EditorPreferences>,
    session: Res<Session>,
) {
    let show_grid = editor_state.show_grid && session.is_ready();
    let current = show_grid.then_some((editor_state.view, preferences.grid_extent));
    if render_state.last_grid == current {
        return;
    }
    render_state.last_grid = current;

    let mut entities = std::mem::take(&mut render_state.grid_entities);
    despawn_all(&mut commands, &mut entities);

    let view = &editor_state.view;
    let Some(lines) = current.and_then(|_| grid_lines(view, preferences.grid_extent)) else {
        return;
    };

    let grid_color = Color::srgba(0.5, 0.5, 0.5, 0.5);
    let line_thickness = 1.0;
    let (w, h) = (view.canvas_width, view.canvas_height);

    let (top, bottom) = lines.vertical_span;
    for x in lines.vertical {
        let center = screen_to_world(x, (top + bottom) / 2.0, w, h);
        let entity = commands
            .spawn((
                Sprite {
                    color: grid_color,
                    custom_size: Some(Vec2::new(line_thickness, bottom - top)),
                    ..default()
                },
                Transform::from_xyz(center.x, center.y, GRID_Z),
                GridLine,
            ))
            .id();
        entities.push(entity);
    }

    let (left, right) = lines.horizontal_span;
    for y in lines.horizontal {
        let center = screen_to_world((left + right) / 2.0, y, w, h);
        let entity = commands
            .spawn((
                Sprite {
                    color: grid_color,
                    custom_size: Some(Vec2::new(right - left, line_thickness)),
                    ..default()
                },
                Transform::from_xyz(center.x, center.y, GRID_Z),
                GridLine,
            ))
            .id();
        entities.push(entity);
    }

    render_state.grid_entities = entities;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ZoomSettings;

    fn view() -> ViewTransform {
        ViewTransform::new(0.0, 0.0, 32.0, 320.0, 320.0, ZoomSettings::default())
    }

    #[test]
    fn test_screen_to_world() {
        assert_eq!(screen_to_world(160.0, 160.0, 320.0, 320.0), Vec2::ZERO);
        assert_eq!(screen_to_world(0.0, 0.0, 320.0, 320.0), Vec2::new(-160.0, 160.0));
        assert_eq!(screen_to_world(320.0, 320.0, 320.0, 320.0), Vec2::new(160.0, -160.0));
    }

    #[test]
    fn test_tile_center_world() {
        // Tile (0, 0) occupies the bottom-left 32px square
        assert_eq!(tile_center_world(&view(), 0, 0), Vec2::new(-144.0, -144.0));
        assert_eq!(tile_center_world(&view(), 9, 9), Vec2::new(144.0, 144.0));
    }

    #[test]
    fn test_visible_tiles_filter() {
        let plane: CoordinatePlane = [((0, 0), 1), ((-1, 0), 2), ((10, 10), 3), ((11, 0), 4)]
            .into_iter()
            .collect();
        let mut visible = visible_tiles(&view(), &plane);
        visible.sort();
        assert_eq!(visible, vec![((0, 0), 1), ((10, 10), 3)]);
    }

    #[test]
    fn test_grid_lines_clipped_to_canvas() {
        let lines = grid_lines(&view(), 100).unwrap();
        assert_eq!(lines.vertical.len(), 11);
        assert_eq!(lines.vertical.first(), Some(&0.0));
        assert_eq!(lines.vertical.last(), Some(&320.0));
        assert_eq!(lines.horizontal.len(), 11);
        assert_eq!(lines.vertical_span, (0.0, 320.0));
    }

    #[test]
    fn test_grid_lines_clipped_to_extent() {
        let lines = grid_lines(&view(), 5).unwrap();
        assert_eq!(lines.vertical, vec![0.0, 32.0, 64.0, 96.0, 128.0, 160.0]);
        assert_eq!(lines.horizontal_span, (0.0, 160.0));
        assert_eq!(lines.vertical_span, (160.0, 320.0));

        let mut far = view();
        far.pan_by(-10_000.0, 0.0);
        assert_eq!(grid_lines(&far, 5), None);
    }
}
