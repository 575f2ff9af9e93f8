//! Filesystem artifact store
//!
//! Layout: `<root>/<session_id>/<path>`. Session ids must be a single path
//! component and artifact paths must stay inside the session directory.

use async_trait::async_trait;
use mmagent_application::{ArtifactError, ArtifactStore};
use mmagent_domain::ArtifactEntry;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_dir(&self, session_id: &str) -> Result<PathBuf, ArtifactError> {
        let mut components = Path::new(session_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(session_id)),
            _ => Err(ArtifactError::InvalidPath(format!("session id {:?}", session_id))),
        }
    }
}

/// Reject absolute paths and any `..`; normalize away `.`.
fn relative_path(path: &str) -> Result<PathBuf, ArtifactError> {
    let mut clean = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArtifactError::InvalidPath(path.to_string()));
            }
        }
    }
    Ok(clean)
}

fn io_error(path: &str, err: std::io::Error) -> ArtifactError {
    if err.kind() == ErrorKind::NotFound {
        ArtifactError::NotFound(path.to_string())
    } else {
        ArtifactError::Io(format!("{}: {}", path, err))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write(&self, session_id: &str, path: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let target = self.resolve_path(session_id, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path, e))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| io_error(path, e))?;
        debug!(session_id, path, bytes = bytes.len(), "Wrote artifact");
        Ok(())
    }

    async fn read(&self, session_id: &str, path: &str) -> Result<Vec<u8>, ArtifactError> {
        let target = self.resolve_path(session_id, path)?;
        tokio::fs::read(&target).await.map_err(|e| io_error(path, e))
    }

    async fn list(&self, session_id: &str, dir: &str) -> Result<Vec<ArtifactEntry>, ArtifactError> {
        let target = self.resolve_path(session_id, dir)?;
        let mut reader = match tokio::fs::read_dir(&target).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(dir, e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(dir, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(if is_dir {
                ArtifactEntry::dir(name)
            } else {
                ArtifactEntry::file(name)
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn delete(&self, session_id: &str, path: &str) -> Result<(), ArtifactError> {
        let target = self.resolve_path(session_id, path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| io_error(path, e))?;
        debug!(session_id, path, "Deleted artifact");
        Ok(())
    }

    fn resolve_path(&self, session_id: &str, path: &str) -> Result<PathBuf, ArtifactError> {
        let relative = relative_path(path)?;
        Ok(self.session_dir(session_id)?.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_write_read_list_delete() {
        let (_dir, store) = store();
        store.write("s1", "images/a.png", b"png").await.unwrap();
        store.write("s1", "images/b.png", b"png2").await.unwrap();

        assert_eq!(store.read("s1", "images/a.png").await.unwrap(), b"png");
        let names: Vec<_> = store
            .list("s1", "images")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);

        store.delete("s1", "images/a.png").await.unwrap();
        assert_eq!(
            store.read("s1", "images/a.png").await.unwrap_err(),
            ArtifactError::NotFound("images/a.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_dir_lists_empty() {
        let (_dir, store) = store();
        assert!(store.list("s1", "audio").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_marks_directories() {
        let (_dir, store) = store();
        store.write("s1", "scripts/nested/x.json", b"{}").await.unwrap();
        let entries = store.list("s1", "scripts").await.unwrap();
        assert_eq!(entries, vec![ArtifactEntry::dir("nested")]);
    }

    #[test]
    fn test_traversal_is_rejected() {
        let (_dir, store) = store();
        for bad in ["../x", "images/../../x", "/etc/passwd"] {
            assert!(
                matches!(store.resolve_path("s1", bad), Err(ArtifactError::InvalidPath(_))),
                "{bad} should be rejected"
            );
        }
        for bad_session in ["", "..", "a/b"] {
            assert!(store.resolve_path(bad_session, "x").is_err());
        }
    }

    #[test]
    fn test_resolve_path_normalizes_cur_dir() {
        let (dir, store) = store();
        assert_eq!(
            store.resolve_path("s1", "./images/a.png").unwrap(),
            dir.path().join("s1").join("images").join("a.png")
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.delete("s1", "audio/none.wav").await,
            Err(ArtifactError::NotFound(_))
        ));
    }
}
