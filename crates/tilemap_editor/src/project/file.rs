//! Applying host file contents to the session, and building save requests

use bevy::log::warn;

use super::{BackgroundLayer, OpenManifest, Session};
use crate::host::{normalize_relative, HostError, HostRequest, PaletteTarget};
use tilemap_core::{load_plane, save_plane, FormatError, Manifest, MapSources, ResourceDescriptor};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Host(HostError),
    Format(FormatError),
    /// The resource descriptor at this path could not be read
    ResourceUnavailable(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Host(e) => write!(f, "{}", e),
            SessionError::Format(e) => write!(f, "{}", e),
            SessionError::ResourceUnavailable(path) => {
                write!(f, "Resource file not found: {}", path)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<HostError> for SessionError {
    fn from(e: HostError) -> Self {
        SessionError::Host(e)
    }
}

impl From<FormatError> for SessionError {
    fn from(e: FormatError) -> Self {
        SessionError::Format(e)
    }
}

/// Everything parsed for one map before it is committed
struct ParsedMap {
    resource: ResourceDescriptor,
    plane: tilemap_core::CoordinatePlane,
    background: Option<BackgroundLayer>,
}

impl Session {
    /// Apply the texts read for `sources`, in `MapSources::paths` order.
    ///
    /// Every file is parsed before anything is replaced, so a failure leaves
    /// the session as it was. A map path that does not exist yet opens an
    /// empty map that will be saved there. A background that cannot be used
    /// is left out and reported in `input_errors.background`.
    pub fn apply_open(
        &mut self,
        sources: &MapSources,
        contents: Vec<Option<String>>,
    ) -> Result<(), SessionError> {
        self.input_errors.clear_map_inputs();
        let parsed = self.parse_open(sources, contents)?;

        self.background_palette_uris = parsed
            .background
            .as_ref()
            .and_then(|layer| layer.resource.as_ref())
            .map_or_else(Vec::new, |res| vec![None; res.len()]);
        self.palette_uris = vec![None; parsed.resource.len()];
        self.plane = parsed.plane;
        self.background = parsed.background;
        self.resource = Some(parsed.resource);
        self.resource_path = Some(sources.resource.clone());
        self.map_path = sources.tilemap.clone();
        self.dirty = false;
        self.revision += 1;
        self.edit_revision += 1;
        Ok(())
    }

    fn parse_open(
        &mut self,
        sources: &MapSources,
        contents: Vec<Option<String>>,
    ) -> Result<ParsedMap, SessionError> {
        // Absent optional paths were not requested and have no slot
        let mut texts = contents.into_iter();
        let resource_text = texts.next().flatten();
        let mut next_if = |requested: bool| {
            if requested {
                texts.next().flatten()
            } else {
                None
            }
        };
        let map_text = next_if(sources.tilemap.is_some());
        let background_text = next_if(sources.background.is_some());
        let background_resource_text = next_if(sources.background_resource.is_some());

        let Some(resource_text) = resource_text else {
            let error = SessionError::ResourceUnavailable(sources.resource.clone());
            self.input_errors.resource = Some(error.to_string());
            return Err(error);
        };
        let resource = ResourceDescriptor::parse(&resource_text).map_err(|e| {
            self.input_errors.resource = Some(e.to_string());
            SessionError::from(e)
        })?;

        let plane = match map_text {
            Some(text) => load_plane(&text).map_err(|e| {
                self.input_errors.map = Some(e.to_string());
                SessionError::from(e)
            })?,
            None => tilemap_core::CoordinatePlane::new(),
        };

        // Without its own descriptor the background draws with the main palette
        let background_resource = match (&sources.background_resource, background_resource_text) {
            (Some(path), Some(text)) => match ResourceDescriptor::parse(&text) {
                Ok(resource) => Some(resource),
                Err(e) => {
                    self.note_background_error(path, &e);
                    None
                }
            },
            _ => None,
        };

        let background = match (&sources.background, background_text) {
            (Some(path), Some(text)) => match load_plane(&text) {
                Ok(plane) => Some(BackgroundLayer {
                    path: path.clone(),
                    plane,
                    resource: background_resource,
                }),
                Err(e) => {
                    self.note_background_error(path, &e);
                    None
                }
            },
            (Some(path), None) => {
                self.note_background_error(path, &"file not found");
                None
            }
            (None, _) => None,
        };

        Ok(ParsedMap {
            resource,
            plane,
            background,
        })
    }

    fn note_background_error(&mut self, path: &str, error: &dyn std::fmt::Display) {
        warn!("Background {} not loaded: {}", path, error);
        self.input_errors.background = Some(format!("{}: {}", path, error));
    }

    /// Accept a manifest's text. A parse failure keeps any open manifest.
    pub fn apply_manifest(&mut self, path: &str, text: Option<String>) -> Result<(), SessionError> {
        self.input_errors.manifest = None;
        let result = match text {
            Some(text) => Manifest::parse(&text).map_err(SessionError::from),
            None => Err(SessionError::Host(HostError::Io(format!(
                "{} not found",
                path
            )))),
        };

        match result {
            Ok(manifest) => {
                self.manifest = Some(OpenManifest {
                    path: path.to_string(),
                    manifest,
                });
                Ok(())
            }
            Err(e) => {
                self.input_errors.manifest = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Requests resolving the palette image paths of the open map
    pub fn image_requests(&self) -> Vec<HostRequest> {
        let mut requests = Vec::new();
        if let Some(resource) = &self.resource {
            requests.push(HostRequest::ReadImages {
                paths: resource.palette.clone(),
                target: PaletteTarget::Main,
            });
        }
        if let Some(resource) = self
            .background
            .as_ref()
            .and_then(|layer| layer.resource.as_ref())
        {
            requests.push(HostRequest::ReadImages {
                paths: resource.palette.clone(),
                target: PaletteTarget::Background,
            });
        }
        requests
    }

    /// Store resolved image URIs. Lists shorter than the palette leave the
    /// remaining entries unresolved.
    pub fn apply_images(&mut self, target: PaletteTarget, uris: Vec<Option<String>>) {
        let slots = match target {
            PaletteTarget::Main => &mut self.palette_uris,
            PaletteTarget::Background => &mut self.background_palette_uris,
        };
        for (slot, uri) in slots.iter_mut().zip(uris) {
            *slot = uri;
        }
        self.revision += 1;
    }

    /// Where a save goes: the opened map path, else the export file at the root
    pub fn save_path(&self, export_file_name: &str) -> String {
        normalize_relative(self.map_path.as_deref().unwrap_or(export_file_name))
    }

    /// Encode the plane into a write request
    pub fn save_request(&self, export_file_name: &str) -> HostRequest {
        HostRequest::Write {
            path: self.save_path(export_file_name),
            content: save_plane(&self.plane),
        }
    }

    /// Remember which edit a submitted save wrote
    pub fn begin_save(&mut self, id: Uuid) {
        self.pending_saves.insert(id, self.edit_revision);
    }

    /// Settle a save. The dirty flag clears only if nothing was edited since
    /// the save was requested. Returns the request's error, if any.
    pub fn finish_save(&mut self, id: Uuid, result: Result<(), HostError>) -> Result<(), SessionError> {
        let saved_revision = self.pending_saves.remove(&id);
        result?;
        if saved_revision == Some(self.edit_revision) {
            self.dirty = false;
        }
        Ok(())
    }

    pub fn has_pending_saves(&self) -> bool {
        !self.pending_saves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilemap_core::CoordinatePlane;

    const RESOURCE: &str = r#"["town", {}, ["a.png", "b.png", "c.png"]]"#;
    const MAP: &str = "[[[   5,null,   2]],[[null]],[[null]],[[null]]]";

    fn sources(map: Option<&str>) -> MapSources {
        MapSources {
            resource: "res.json5".to_string(),
            tilemap: map.map(str::to_string),
            background: None,
            background_resource: None,
        }
    }

    fn opened() -> Session {
        let mut session = Session::new();
        session
            .apply_open(
                &sources(Some("maps/town.json5")),
                vec![Some(RESOURCE.to_string()), Some(MAP.to_string())],
            )
            .unwrap();
        session
    }

    #[test]
    fn test_open_map() {
        let session = opened();
        assert!(session.is_ready());
        assert_eq!(session.palette_len(), 3);
        assert_eq!(session.palette_uris, vec![None, None, None]);
        assert_eq!(session.plane.get(0, 0), Some(5));
        assert_eq!(session.plane.get(1, 0), None);
        assert_eq!(session.plane.get(2, 0), Some(2));
        assert_eq!(session.map_path.as_deref(), Some("maps/town.json5"));
        assert!(!session.dirty);
    }

    #[test]
    fn test_missing_map_opens_empty() {
        let mut session = Session::new();
        session
            .apply_open(
                &sources(Some("maps/new.json5")),
                vec![Some(RESOURCE.to_string()), None],
            )
            .unwrap();
        assert!(session.plane.is_empty());
        assert_eq!(session.save_path("tiles.json5"), "maps/new.json5");
    }

    #[test]
    fn test_missing_resource() {
        let mut session = Session::new();
        let err = session
            .apply_open(&sources(None), vec![None])
            .unwrap_err();
        assert_eq!(err, SessionError::ResourceUnavailable("res.json5".to_string()));
        assert!(!session.is_ready());
        assert!(session.input_errors.resource.is_some());
    }

    #[test]
    fn test_failed_open_keeps_state() {
        let mut session = opened();
        session.plane.set(9, 9, Some(1));
        session.mark_edited();
        let revision = session.revision;

        let err = session
            .apply_open(
                &sources(Some("maps/other.json5")),
                vec![Some(RESOURCE.to_string()), Some("[[[1,".to_string())],
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::Format(FormatError::Syntax(_))));
        assert!(session.input_errors.map.is_some());
        assert!(session.input_errors.resource.is_none());

        assert_eq!(session.plane.get(9, 9), Some(1));
        assert_eq!(session.map_path.as_deref(), Some("maps/town.json5"));
        assert_eq!(session.revision, revision);
        assert!(session.dirty);
    }

    #[test]
    fn test_open_with_background() {
        let mut session = Session::new();
        let sources = MapSources {
            resource: "res.json5".to_string(),
            tilemap: Some("map.json5".to_string()),
            background: Some("bg.json5".to_string()),
            background_resource: Some("bg_res.json5".to_string()),
        };
        session
            .apply_open(
                &sources,
                vec![
                    Some(RESOURCE.to_string()),
                    Some(MAP.to_string()),
                    Some("[[[null]],[[   3]],[[null]],[[null]]]".to_string()),
                    Some(r#"[0, 0, ["bg.png"]]"#.to_string()),
                ],
            )
            .unwrap();

        let background = session.background.as_ref().unwrap();
        assert_eq!(background.plane.get(-1, 0), Some(3));
        assert_eq!(session.background_palette_uris.len(), 1);
        assert_eq!(session.image_requests().len(), 2);

        session.apply_images(PaletteTarget::Background, vec![Some("uri/bg.png".to_string())]);
        assert_eq!(session.background_palette(), &[Some("uri/bg.png".to_string())]);
    }

    #[test]
    fn test_background_resource_without_background() {
        let mut session = Session::new();
        let sources = MapSources {
            resource: "res.json5".to_string(),
            tilemap: Some("map.json5".to_string()),
            background: None,
            background_resource: Some("bg_res.json5".to_string()),
        };
        session
            .apply_open(
                &sources,
                vec![
                    Some(RESOURCE.to_string()),
                    Some(MAP.to_string()),
                    Some(r#"[0, 0, ["bg.png"]]"#.to_string()),
                ],
            )
            .unwrap();
        assert!(session.background.is_none());
        assert_eq!(session.plane.get(0, 0), Some(5));
    }

    #[test]
    fn test_apply_images_partial() {
        let mut session = opened();
        session.apply_images(PaletteTarget::Main, vec![Some("x".to_string()), None]);
        assert_eq!(session.palette_uris, vec![Some("x".to_string()), None, None]);
    }

    #[test]
    fn test_save_request_and_fallback() {
        let mut session = Session::new();
        session.plane = [((0, 0), 5), ((2, 0), 2)].into_iter().collect::<CoordinatePlane>();
        let HostRequest::Write { path, content } = session.save_request("tiles.json5") else {
            panic!("expected a write request");
        };
        assert_eq!(path, "tiles.json5");
        assert_eq!(load_plane(&content).unwrap(), session.plane);

        session.map_path = Some("./maps\\a.json5".to_string());
        assert_eq!(session.save_path("tiles.json5"), "maps/a.json5");
    }

    #[test]
    fn test_save_clears_dirty_only_when_current() {
        let mut session = opened();
        session.mark_edited();

        let id = Uuid::new_v4();
        session.begin_save(id);
        assert!(session.has_pending_saves());
        session.finish_save(id, Ok(())).unwrap();
        assert!(!session.dirty);

        session.mark_edited();
        let id = Uuid::new_v4();
        session.begin_save(id);
        session.mark_edited();
        session.finish_save(id, Ok(())).unwrap();
        assert!(session.dirty, "edited after the save was requested");

        let id = Uuid::new_v4();
        session.begin_save(id);
        let err = session
            .finish_save(id, Err(HostError::WorkspaceUnavailable))
            .unwrap_err();
        assert_eq!(err, SessionError::Host(HostError::WorkspaceUnavailable));
        assert!(!session.has_pending_saves());
    }

    fn background_sources() -> MapSources {
        MapSources {
            resource: "res.json5".to_string(),
            tilemap: Some("map.json5".to_string()),
            background: Some("bg.json5".to_string()),
            background_resource: Some("bg_res.json5".to_string()),
        }
    }

    #[test]
    fn test_broken_background_still_opens_map() {
        let mut session = Session::new();
        session.input_errors.manifest = Some("bad manifest".to_string());
        session
            .apply_open(
                &background_sources(),
                vec![
                    Some(RESOURCE.to_string()),
                    Some(MAP.to_string()),
                    Some("[[[1,".to_string()),
                    Some(r#"[0, 0, ["bg.png"]]"#.to_string()),
                ],
            )
            .unwrap();

        assert!(session.is_ready());
        assert_eq!(session.plane.get(0, 0), Some(5));
        assert!(session.background.is_none());
        assert!(session
            .input_errors
            .background
            .as_deref()
            .is_some_and(|e| e.starts_with("bg.json5")));
        assert_eq!(session.input_errors.manifest.as_deref(), Some("bad manifest"));
    }

    #[test]
    fn test_broken_background_resource_uses_main_palette() {
        let mut session = Session::new();
        session
            .apply_open(
                &background_sources(),
                vec![
                    Some(RESOURCE.to_string()),
                    Some(MAP.to_string()),
                    Some("[[[null]],[[   3]],[[null]],[[null]]]".to_string()),
                    Some("{ not a resource".to_string()),
                ],
            )
            .unwrap();

        let background = session.background.as_ref().unwrap();
        assert_eq!(background.plane.get(-1, 0), Some(3));
        assert!(background.resource.is_none());
        assert!(session.background_palette_uris.is_empty());
        assert_eq!(session.image_requests().len(), 1);
        assert!(session
            .input_errors
            .background
            .as_deref()
            .is_some_and(|e| e.starts_with("bg_res.json5")));

        // A clean reopen clears the note
        session
            .apply_open(&sources(None), vec![Some(RESOURCE.to_string())])
            .unwrap();
        assert_eq!(session.input_errors.background, None);
    }

    #[test]
    fn test_image_reply_during_save_keeps_it_clean() {
        let mut session = opened();
        session.plane.set(4, 4, Some(1));
        session.mark_edited();

        let id = Uuid::new_v4();
        session.begin_save(id);
        session.apply_images(PaletteTarget::Main, vec![Some("a".to_string())]);
        session.finish_save(id, Ok(())).unwrap();
        assert!(!session.dirty);
    }

    #[test]
    fn test_save_of_previous_map_does_not_clean_new_one() {
        let mut session = opened();
        session.mark_edited();
        let id = Uuid::new_v4();
        session.begin_save(id);

        session
            .apply_open(
                &sources(Some("maps/other.json5")),
                vec![Some(RESOURCE.to_string()), None],
            )
            .unwrap();
        session.plane.set(1, 1, Some(2));
        session.mark_edited();
        session.finish_save(id, Ok(())).unwrap();
        assert!(session.dirty);
    }

    #[test]
    fn test_apply_manifest() {
        let mut session = Session::new();
        session
            .apply_manifest(
                "world.tilemap",
                Some(r#"[{ name: "A", resource: "r", tilemap: "m" }]"#.to_string()),
            )
            .unwrap();
        assert_eq!(session.manifest.as_ref().unwrap().manifest.entries.len(), 1);

        assert!(session.apply_manifest("bad.tilemap", Some("[{".to_string())).is_err());
        assert!(session.input_errors.manifest.is_some());
        assert_eq!(session.manifest.as_ref().unwrap().path, "world.tilemap");

        assert!(session.apply_manifest("gone.tilemap", None).is_err());
    }
}
