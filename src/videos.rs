use chrono::Local;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::constants::MAX_GUEST_NAME_LEN;

/// Typed result of parsing an HTTP Range header against a file size.
///
/// Only single ranges of the form `bytes=<start>-[<end>]` are supported;
/// an absent or past-EOF end is clamped to the last byte of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// No Range header: serve the whole file
    Full,
    /// A byte range with end already clamped to `size - 1`
    Satisfiable { start: u64, end: u64 },
    /// Syntactically valid but starts at or past end of file
    Unsatisfiable,
    /// Not a parsable single bytes=start-end range
    Malformed,
}

impl RangeSpec {
    /// Parse an optional `Range` header value against a file of `size` bytes
    pub fn parse(header: Option<&str>, size: u64) -> RangeSpec {
        let header = match header {
            Some(h) => h,
            None => return RangeSpec::Full,
        };
        let range = match header.strip_prefix("bytes=") {
            Some(r) => r,
            None => return RangeSpec::Malformed,
        };
        let parts: Vec<&str> = range.split('-').collect();
        if parts.len() != 2 {
            return RangeSpec::Malformed;
        }
        let start: u64 = match parts[0].trim().parse() {
            Ok(s) => s,
            Err(_) => return RangeSpec::Malformed,
        };
        let end: u64 = if parts[1].trim().is_empty() {
            size.saturating_sub(1)
        } else {
            match parts[1].trim().parse::<u64>() {
                Ok(e) => e.min(size.saturating_sub(1)),
                Err(_) => return RangeSpec::Malformed,
            }
        };
        if start >= size {
            return RangeSpec::Unsatisfiable;
        }
        if end < start {
            return RangeSpec::Malformed;
        }
        RangeSpec::Satisfiable { start, end }
    }
}

/// Keep only alphanumerics, spaces, underscores, and hyphens, capped at
/// `MAX_GUEST_NAME_LEN` characters. May produce an empty string for names
/// with no safe characters.
pub fn sanitize_guest_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .take(MAX_GUEST_NAME_LEN)
        .collect()
}

/// Flat-directory storage for recorded guest videos.
///
/// Filenames are the only identifier: `<sanitized guest name>_<timestamp>.mp4`.
pub struct VideoArchive {
    dir: PathBuf,
}

impl VideoArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an uploaded recording under a sanitized, timestamped filename
    /// and return that filename
    pub fn store(&self, guest_name: &str, data: &[u8]) -> Result<String, String> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}.mp4", sanitize_guest_name(guest_name), timestamp);
        let path = self.dir.join(&filename);
        fs::write(&path, data)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        Ok(filename)
    }

    /// Sorted list of stored `.mp4` files. An unreadable directory lists
    /// as empty.
    pub fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut videos: Vec<String> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.to_ascii_lowercase().ends_with(".mp4"))
            .collect();
        videos.sort();
        videos
    }

    /// Delete a stored video. Ok(false) when it does not exist.
    pub fn delete(&self, filename: &str) -> Result<bool, String> {
        let path = match self.resolve(filename) {
            Some(p) => p,
            None => return Ok(false),
        };
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .map_err(|e| format!("Failed to delete {}: {}", path.display(), e))?;
        Ok(true)
    }

    /// Size in bytes of a stored video, or None when missing or the name
    /// is unsafe
    pub fn size_of(&self, filename: &str) -> Option<u64> {
        let path = self.resolve(filename)?;
        let meta = fs::metadata(&path).ok()?;
        if meta.is_file() {
            Some(meta.len())
        } else {
            None
        }
    }

    /// Read a whole stored video
    pub fn read_all(&self, filename: &str) -> Result<Vec<u8>, String> {
        let path = self
            .resolve(filename)
            .ok_or_else(|| format!("Invalid filename: {}", filename))?;
        fs::read(&path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
    }

    /// Read exactly `end - start + 1` bytes starting at offset `start`.
    /// Callers must clamp the range to the file size first (RangeSpec::parse
    /// does).
    pub fn read_range(&self, filename: &str, start: u64, end: u64) -> Result<Vec<u8>, String> {
        let path = self
            .resolve(filename)
            .ok_or_else(|| format!("Invalid filename: {}", filename))?;
        let mut file = fs::File::open(&path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
        file.seek(SeekFrom::Start(start))
            .map_err(|e| format!("Failed to seek {}: {}", path.display(), e))?;
        let mut buf = vec![0u8; (end - start + 1) as usize];
        file.read_exact(&mut buf)
            .map_err(|e| format!("Short read on {}: {}", path.display(), e))?;
        Ok(buf)
    }

    // Filenames are untrusted input: anything that could escape the videos
    // directory resolves to None.
    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return None;
        }
        Some(self.dir.join(filename))
    }
}
