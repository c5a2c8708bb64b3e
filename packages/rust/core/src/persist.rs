//! Result persistence.

use std::path::{Path, PathBuf};

use tracing::info;

use leafdex_shared::{LeafdexError, Result, RunResult};

/// Destination for the finished result document.
pub trait ResultWriter: Send + Sync {
    fn write(&self, result: &RunResult) -> Result<()>;
}

/// Writes the result as pretty-printed JSON, creating parent directories.
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    path: PathBuf,
}

impl JsonFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultWriter for JsonFileWriter {
    fn write(&self, result: &RunResult) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LeafdexError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(&self.path, json).map_err(|e| LeafdexError::io(&self.path, e))?;

        info!(path = %self.path.display(), items = result.items.len(), "result written");
        Ok(())
    }
}
