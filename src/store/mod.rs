//! Named source documents kept under one root directory.

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tokio::fs;

/// Extension of files shown by `list`.
pub const SOURCE_EXTENSION: &str = ".lean";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Reject anything that could resolve outside the store root.
pub fn validate_filename(name: &str) -> Result<(), StoreError> {
    let bad = name.trim().is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(StoreError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Open the store, creating the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_filename(name)?;
        Ok(self.root.join(name))
    }

    pub async fn save(&self, name: &str, code: &str) -> Result<(), StoreError> {
        let path = self.file_path(name)?;
        fs::write(path, code).await?;
        Ok(())
    }

    pub async fn load(&self, name: &str) -> Result<String, StoreError> {
        let path = self.file_path(name)?;
        match fs::read_to_string(&path).await {
            Ok(code) => Ok(code),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Names of stored source files, sorted.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut rd = fs::read_dir(&self.root).await?;
        let mut files = Vec::new();
        while let Some(entry) = rd.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(SOURCE_EXTENSION) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_rules() {
        for ok in ["main.lean", "Nat Lemmas.lean", "notes.txt", "証明.lean"] {
            assert!(validate_filename(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["", "  ", "../secret", "..", "a/b.lean", "/etc/passwd", "a\\b", "x\0.lean"] {
            assert!(
                matches!(validate_filename(bad), Err(StoreError::InvalidFilename(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = DocumentStore::open(dir.path().join("docs")).await?;
        let code = "theorem add_zero' (n : Nat) : n + 0 = n := by\n  simp\n-- ∀ ε > 0\n";
        store.save("a.lean", code).await?;
        assert_eq!(store.load("a.lean").await?, code);

        store.save("a.lean", "").await?;
        assert_eq!(store.load("a.lean").await?, "");
        Ok(())
    }

    #[tokio::test]
    async fn traversal_is_rejected_before_touching_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("secret"), "top secret")?;
        let store = DocumentStore::open(dir.path().join("docs")).await?;

        assert!(matches!(
            store.load("../secret").await,
            Err(StoreError::InvalidFilename(_))
        ));
        assert!(matches!(
            store.save("../secret", "pwned").await,
            Err(StoreError::InvalidFilename(_))
        ));
        assert_eq!(std::fs::read_to_string(dir.path().join("secret"))?, "top secret");
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_not_found() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = DocumentStore::open(dir.path()).await?;
        assert!(matches!(
            store.load("nope.lean").await,
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn list_shows_only_source_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = DocumentStore::open(dir.path()).await?;
        store.save("b.lean", "").await?;
        store.save("a.lean", "").await?;
        store.save("readme.txt", "").await?;
        std::fs::create_dir(dir.path().join("dir.lean"))?;
        assert_eq!(store.list().await?, vec!["a.lean", "b.lean"]);
        Ok(())
    }
}
