use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use wardbook_application::ArtifactStorage;
use wardbook_core::{AppError, AppResult};

/// Artifact storage rooted at a local directory.
///
/// Keys are relative paths. Writes go to a temporary sibling first and are
/// renamed into place, so readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct FilesystemArtifactStorage {
    root: PathBuf,
}

impl FilesystemArtifactStorage {
    /// Creates storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|error| {
            AppError::Storage(format!(
                "failed to create artifact root '{}': {error}",
                root.display()
            ))
        })?;

        Ok(Self { root })
    }

    /// Root directory of the storage.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let is_plain_relative = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain_relative {
            return Err(AppError::Storage(format!("invalid artifact key '{key}'")));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStorage for FilesystemArtifactStorage {
    async fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Storage(format!("failed to create directory for '{key}': {error}"))
            })?;
        }

        let staging = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|error| AppError::Storage(format!("failed to write '{key}': {error}")))?;

        if let Err(error) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(AppError::Storage(format!(
                "failed to move '{key}' into place: {error}"
            )));
        }

        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|error| AppError::Storage(format!("failed to read '{key}': {error}")))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(AppError::Storage(format!(
                "failed to probe '{key}': {error}"
            ))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Storage(format!(
                "failed to delete '{key}': {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use wardbook_application::ArtifactStorage;
    use wardbook_core::AppError;

    use super::FilesystemArtifactStorage;

    async fn storage() -> (tempfile::TempDir, FilesystemArtifactStorage) {
        let directory = match tempfile::tempdir() {
            Ok(directory) => directory,
            Err(error) => panic!("failed to create temp dir: {error}"),
        };
        let storage = match FilesystemArtifactStorage::new(directory.path().join("media")).await {
            Ok(storage) => storage,
            Err(error) => panic!("failed to create storage: {error}"),
        };
        (directory, storage)
    }

    #[tokio::test]
    async fn write_read_and_delete_under_nested_prefix() {
        let (_directory, storage) = storage().await;
        let key = "reports/Survey_Report_Ward_3_Property_42.pdf";

        assert_eq!(storage.exists(key).await.ok(), Some(false));
        assert!(storage.write(key, b"%PDF-1.7 body").await.is_ok());
        assert_eq!(storage.exists(key).await.ok(), Some(true));
        assert_eq!(storage.read(key).await.ok(), Some(b"%PDF-1.7 body".to_vec()));

        assert!(storage.delete(key).await.is_ok());
        assert_eq!(storage.exists(key).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn deleting_missing_key_succeeds() {
        let (_directory, storage) = storage().await;

        assert!(storage.delete("reports/never-written.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn overwrite_leaves_no_staging_files() {
        let (_directory, storage) = storage().await;
        let key = "reports/report.pdf";

        assert!(storage.write(key, b"first").await.is_ok());
        assert!(storage.write(key, b"second").await.is_ok());

        assert_eq!(storage.read(key).await.ok(), Some(b"second".to_vec()));
        let entries = std::fs::read_dir(storage.root().join("reports"))
            .map(|entries| entries.count())
            .ok();
        assert_eq!(entries, Some(1));
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let (_directory, storage) = storage().await;

        for key in ["../outside.pdf", "/etc/passwd", "reports/../../x.pdf", ""] {
            let result = storage.read(key).await;
            assert!(matches!(result, Err(AppError::Storage(_))), "key {key:?}");
        }
    }
}
