//! Per-request scratch files for the checker.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

const PREFIX: &str = "leanpad-";
const SUFFIX: &str = ".lean";

/// Hands out uniquely named source files. Names come from `tempfile`, which
/// creates them with `O_EXCL`, so concurrent callers never share a path.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceAllocator {
    dir: Option<PathBuf>,
}

impl WorkspaceAllocator {
    /// `dir = None` uses the system temp directory.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn acquire(&self, source: &str) -> io::Result<Workspace> {
        let mut builder = Builder::new();
        builder.prefix(PREFIX).suffix(SUFFIX);
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(source.as_bytes())?;
        file.flush()?;
        debug!(path = %file.path().display(), "workspace acquired");
        Ok(Workspace { file: Some(file) })
    }
}

/// A staged source file. Removed by `release` or, failing that, on drop.
#[derive(Debug)]
pub struct Workspace {
    file: Option<NamedTempFile>,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.file
            .as_ref()
            .map(|f| f.path())
            .unwrap_or_else(|| Path::new(""))
    }

    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(file) = self.file.take() else { return };
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => debug!(path = %path.display(), "workspace released"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove workspace"),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
