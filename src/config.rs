use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_port() -> u16 {
    5000
}

fn default_meetings_file() -> PathBuf {
    PathBuf::from("meetings.json")
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("videos")
}

fn default_admins_dir() -> PathBuf {
    PathBuf::from("known_admins")
}

/// Kiosk configuration file structure (TOML, all fields optional)
#[derive(Debug, Clone, Deserialize)]
pub struct KioskConfig {
    /// HTTP port to listen on (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path of the schedule store file (default: meetings.json)
    #[serde(default = "default_meetings_file")]
    pub meetings_file: PathBuf,
    /// Directory holding uploaded guest recordings (default: videos)
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
    /// Directory holding reference images of known admins (default: known_admins)
    #[serde(default = "default_admins_dir")]
    pub admins_dir: PathBuf,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            meetings_file: default_meetings_file(),
            videos_dir: default_videos_dir(),
            admins_dir: default_admins_dir(),
        }
    }
}

impl KioskConfig {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))
    }
}
