//! Program directories

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Folder created under the user's documents directory
pub const PROGRAM_FOLDER: &str = "PLC Data Logger";

/// Where log files and data files are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDirs {
    /// Program folder
    pub root: PathBuf,
    /// Diagnostic log files
    pub logs: PathBuf,
    /// Recorded data files
    pub data: PathBuf,
}

impl ProgramDirs {
    /// Default location: `<Documents or home>/PLC Data Logger`
    pub fn default_location() -> io::Result<Self> {
        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find home directory")
            })?;
        Ok(Self::under(base.join(PROGRAM_FOLDER)))
    }

    /// Layout rooted at `root`
    pub fn under<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            logs: root.join("Logs"),
            data: root.join("Data"),
            root,
        }
    }

    /// Replace the log directory
    pub fn with_logs<P: Into<PathBuf>>(mut self, logs: P) -> Self {
        self.logs = logs.into();
        self
    }

    /// Replace the data directory
    pub fn with_data<P: Into<PathBuf>>(mut self, data: P) -> Self {
        self.data = data.into();
        self
    }

    /// Create the log and data directories if missing
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.logs)?;
        fs::create_dir_all(&self.data)?;
        Ok(())
    }
}
