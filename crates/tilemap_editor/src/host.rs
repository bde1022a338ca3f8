//! Workspace file access and the background request bridge
//!
//! All reads and writes go through [`HostIo`], relative to a workspace root.
//! The editor never blocks on I/O: [`HostBridge::submit`] runs a request on a
//! worker thread and the reply comes back through a channel drained once per
//! frame.

use bevy::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use tilemap_core::MapSources;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No workspace folder is open
    WorkspaceUnavailable,
    Io(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::WorkspaceUnavailable => write!(f, "No workspace folder is open"),
            HostError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for HostError {}

/// File access relative to a workspace root.
///
/// Batch reads return one entry per requested path, `None` where the file
/// is missing or cannot be read. Only `WorkspaceUnavailable` fails a batch.
pub trait HostIo: Send + Sync + 'static {
    /// Loadable image locations for palette paths
    fn image_uris(&self, paths: &[String]) -> Result<Vec<Option<String>>, HostError>;

    fn read_texts(&self, paths: &[String]) -> Result<Vec<Option<String>>, HostError>;

    /// Write text, creating parent directories as needed
    fn write_text(&self, path: &str, text: &str) -> Result<(), HostError>;
}

/// Normalize a workspace-relative path to forward-slash form.
///
/// Backslashes become separators, `.` segments are dropped and `..` pops a
/// segment without ever climbing above the root.
pub fn normalize_relative(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// [`HostIo`] over the local file system
#[derive(Debug, Clone, Default, Resource)]
pub struct WorkspaceHost {
    root: Option<PathBuf>,
}

impl WorkspaceHost {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Absolute path of a workspace-relative path
    pub fn resolve(&self, path: &str) -> Result<PathBuf, HostError> {
        let root = self.root.as_ref().ok_or(HostError::WorkspaceUnavailable)?;
        Ok(root.join(normalize_relative(path)))
    }

    /// Convert an absolute path (e.g. from a file dialog) to a workspace-relative one.
    /// Returns `None` for paths outside the workspace.
    pub fn to_relative(&self, absolute_path: &Path) -> Option<String> {
        let root = self.root.as_ref()?;
        let root = root.canonicalize().unwrap_or_else(|_| root.clone());
        let file_path = absolute_path
            .canonicalize()
            .unwrap_or_else(|_| absolute_path.to_path_buf());

        let relative = file_path.strip_prefix(&root).ok()?;
        Some(relative.to_string_lossy().replace('\\', "/"))
    }

    /// Read one file of a batch. Only a missing workspace fails; any per-file
    /// error leaves that slot empty.
    fn read_existing(&self, path: &str) -> Result<Option<String>, HostError> {
        let full = self.resolve(path)?;
        match std::fs::read_to_string(&full) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                warn!("Failed to read {}: {}", full.display(), e);
                Ok(None)
            }
        }
    }
}

impl HostIo for WorkspaceHost {
    fn image_uris(&self, paths: &[String]) -> Result<Vec<Option<String>>, HostError> {
        paths
            .iter()
            .map(|path| {
                let full = self.resolve(path)?;
                Ok(full
                    .is_file()
                    .then(|| full.to_string_lossy().replace('\\', "/")))
            })
            .collect()
    }

    fn read_texts(&self, paths: &[String]) -> Result<Vec<Option<String>>, HostError> {
        paths.iter().map(|path| self.read_existing(path)).collect()
    }

    fn write_text(&self, path: &str, text: &str) -> Result<(), HostError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HostError::Io(e.to_string()))?;
        }
        std::fs::write(&full, text).map_err(|e| HostError::Io(e.to_string()))
    }
}

/// Which palette a batch of image URIs belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteTarget {
    Main,
    Background,
}

/// Why a batch of texts was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadPurpose {
    /// Resource, map and background files for one map
    OpenMap(MapSources),
    /// A `.tilemap` manifest
    OpenManifest(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    ReadImages {
        paths: Vec<String>,
        target: PaletteTarget,
    },
    ReadTexts {
        paths: Vec<String>,
        purpose: ReadPurpose,
    },
    Write {
        path: String,
        content: String,
    },
}

impl HostRequest {
    /// Perform the request against a host
    pub fn run(self, io: &dyn HostIo) -> HostReply {
        match self {
            HostRequest::ReadImages { paths, target } => HostReply::Images {
                target,
                uris: io.image_uris(&paths),
            },
            HostRequest::ReadTexts { paths, purpose } => HostReply::Texts {
                purpose,
                contents: io.read_texts(&paths),
            },
            HostRequest::Write { path, content } => {
                let result = io.write_text(&path, &content);
                HostReply::Written { path, result }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostReply {
    Images {
        target: PaletteTarget,
        uris: Result<Vec<Option<String>>, HostError>,
    },
    Texts {
        purpose: ReadPurpose,
        contents: Result<Vec<Option<String>>, HostError>,
    },
    Written {
        path: String,
        result: Result<(), HostError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResponse {
    pub id: Uuid,
    pub reply: HostReply,
}

/// Runs host requests off the main thread
#[derive(Resource)]
pub struct HostBridge {
    io: Arc<dyn HostIo>,
    sender: Sender<HostResponse>,
    /// Wrapped in Mutex for Sync
    receiver: Mutex<Receiver<HostResponse>>,
}

impl HostBridge {
    pub fn new(io: Arc<dyn HostIo>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            io,
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Start a request. Every call gets its own id and its own response.
    pub fn submit(&self, request: HostRequest) -> Uuid {
        let id = Uuid::new_v4();
        let io = Arc::clone(&self.io);
        let sender = self.sender.clone();

        thread::spawn(move || {
            let reply = request.run(io.as_ref());
            // The receiver only goes away with the app
            let _ = sender.send(HostResponse { id, reply });
        });

        id
    }

    /// Try to receive one finished request
    pub fn try_recv(&self) -> Option<HostResponse> {
        self.receiver.lock().ok()?.try_recv().ok()
    }

    /// Block until a response arrives or the timeout passes
    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<HostResponse> {
        self.receiver.lock().ok()?.recv_timeout(timeout).ok()
    }
}
