use log::warn;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::constants::GALLERY_REFRESH_SECS;

/// Result of a recognition attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub is_admin: bool,
    pub name: String,
}

impl Identity {
    /// Fallback identity when no known admin matches the frame
    pub fn guest() -> Self {
        Self {
            is_admin: false,
            name: "Guest".to_string(),
        }
    }
}

/// A known administrator loaded from the gallery directory
#[derive(Debug, Clone, PartialEq)]
pub struct KnownAdmin {
    /// Display name, taken from the reference image's file stem
    pub name: String,
    /// Reference image on disk
    pub image_path: PathBuf,
}

/// External face-matching engine.
///
/// Implementations compare the decoded frame against the gallery within
/// `MATCH_TOLERANCE` and return the index of the first matching admin.
/// When several gallery entries match, the lowest index wins; that is an
/// inherited tie-break, not a priority scheme.
pub trait FaceEngine: Send + Sync {
    fn match_frame(&self, frame: &[u8], gallery: &[KnownAdmin]) -> Option<usize>;
}

/// Engine that never matches. Wired by default until a real matcher is
/// integrated; every visitor is treated as a guest.
pub struct NullEngine;

impl FaceEngine for NullEngine {
    fn match_frame(&self, _frame: &[u8], _gallery: &[KnownAdmin]) -> Option<usize> {
        None
    }
}

struct GalleryState {
    admins: Vec<KnownAdmin>,
    last_reload: Instant,
}

/// Process-wide set of known administrators, backed by a directory of
/// reference images. Scanned at startup and rescanned lazily on access,
/// at most once per `GALLERY_REFRESH_SECS`.
pub struct AdminGallery {
    dir: PathBuf,
    state: Mutex<GalleryState>,
}

impl AdminGallery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let admins = scan_gallery(&dir);
        Self {
            dir,
            state: Mutex::new(GalleryState {
                admins,
                last_reload: Instant::now(),
            }),
        }
    }

    /// Current gallery contents, rescanning the directory first if stale
    pub fn admins(&self) -> Vec<KnownAdmin> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.last_reload.elapsed() >= Duration::from_secs(GALLERY_REFRESH_SECS) {
            state.admins = scan_gallery(&self.dir);
            state.last_reload = Instant::now();
        }
        state.admins.clone()
    }
}

fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("jpg") | Some("jpeg") | Some("png")
    )
}

fn scan_gallery(dir: &Path) -> Vec<KnownAdmin> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read admin gallery {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    let mut admins: Vec<KnownAdmin> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_image_file(path))
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_string();
            Some(KnownAdmin {
                name,
                image_path: path,
            })
        })
        .collect();
    admins.sort_by(|a, b| a.name.cmp(&b.name));
    admins
}

/// Recognition adapter: decoded frames are matched against the admin
/// gallery by the configured engine
pub struct Recognizer {
    gallery: AdminGallery,
    engine: Box<dyn FaceEngine>,
}

impl Recognizer {
    pub fn new(gallery: AdminGallery, engine: Box<dyn FaceEngine>) -> Self {
        Self { gallery, engine }
    }

    /// Identify the person in `frame`. No face or no match yields the
    /// guest identity.
    pub fn identify(&self, frame: &[u8]) -> Identity {
        let admins = self.gallery.admins();
        match self
            .engine
            .match_frame(frame, &admins)
            .and_then(|index| admins.get(index))
        {
            Some(admin) => Identity {
                is_admin: true,
                name: admin.name.clone(),
            },
            None => Identity::guest(),
        }
    }
}
