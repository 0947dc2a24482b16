use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// State directory under $HOME/.local/state/lectern, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("lectern"),
            )
        } else {
            ProjectDirs::from("", "", "lectern").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn storage_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("storage.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("lectern.log"))
    }

    pub fn export_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("lectern-export.json"))
    }

    /// Directory holding the cue sound files (`<id>.wav`)
    pub fn sounds_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lectern").map(|proj_dirs| proj_dirs.data_dir().join("sounds"))
    }
}
