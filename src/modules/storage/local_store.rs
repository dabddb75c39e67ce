//! Filesystem attachment backend
//!
//! Payloads live as flat files in one directory. Writes go to a hidden
//! temporary file first and are renamed into place, so a reader never
//! sees a half-written payload.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::modules::storage::attachment_store::{
    extension_for_content_type, AttachmentRef, AttachmentStore,
};

pub struct LocalAttachmentStore {
    root: PathBuf,
}

impl LocalAttachmentStore {
    /// Open (and create if needed) the attachment directory
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create attachment directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        let root = fs::canonicalize(root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to resolve attachment directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &AttachmentRef) -> PathBuf {
        self.root.join(reference.as_str())
    }

    async fn write_atomically(
        &self,
        temp_path: &Path,
        final_path: &Path,
        payload: &[u8],
    ) -> std::io::Result<()> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(payload).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(temp_path, final_path).await
    }
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn store(&self, payload: Vec<u8>, content_type: &str) -> Result<AttachmentRef> {
        if payload.is_empty() {
            return Err(AppError::Validation(
                "Attachment payload must not be empty".to_string(),
            ));
        }

        let reference = AttachmentRef::generate(extension_for_content_type(content_type));
        let final_path = self.path_for(&reference);
        let temp_path = self.root.join(format!(".{}.partial", reference));

        if let Err(e) = self
            .write_atomically(&temp_path, &final_path, &payload)
            .await
        {
            // The temp file may or may not exist depending on where the write failed
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::Storage(format!(
                "Failed to write attachment '{}': {}",
                reference, e
            )));
        }

        debug!(
            "Stored attachment '{}' ({} bytes) in {}",
            reference,
            payload.len(),
            self.root.display()
        );
        Ok(reference)
    }

    async fn resolve(&self, reference: &AttachmentRef) -> Result<String> {
        let path = self.path_for(reference);
        match fs::try_exists(&path).await {
            Ok(true) => Ok(path.to_string_lossy().into_owned()),
            Ok(false) => Err(AppError::NotFound(format!(
                "Attachment '{}' not found",
                reference
            ))),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to check attachment '{}': {}",
                reference, e
            ))),
        }
    }

    async fn load(&self, reference: &AttachmentRef) -> Result<Vec<u8>> {
        fs::read(self.path_for(reference))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    AppError::NotFound(format!("Attachment '{}' not found", reference))
                }
                _ => AppError::Storage(format!(
                    "Failed to read attachment '{}': {}",
                    reference, e
                )),
            })
    }

    async fn release(&self, reference: &AttachmentRef) -> Result<()> {
        match fs::remove_file(self.path_for(reference)).await {
            Ok(()) => {
                debug!("Released attachment '{}'", reference);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete attachment '{}': {}",
                reference, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_in(dir: &tempfile::TempDir) -> LocalAttachmentStore {
        LocalAttachmentStore::new(dir.path()).await.unwrap()
    }

    #[tokio::test]
    async fn test_store_then_resolve_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let reference = store
            .store(b"jpeg bytes".to_vec(), "image/jpeg")
            .await
            .unwrap();
        assert!(reference.as_str().ends_with(".jpg"));

        let locator = store.resolve(&reference).await.unwrap();
        assert!(locator.starts_with(store.root().to_string_lossy().as_ref()));
        assert_eq!(store.load(&reference).await.unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.store(vec![1, 2, 3], "image/png").await.unwrap();
        store.store(vec![4, 5, 6], "image/png").await.unwrap();

        let mut entries = fs::read_dir(store.root()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.starts_with('.')));
    }

    #[tokio::test]
    async fn test_empty_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let result = store.store(Vec::new(), "image/png").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let reference = store.store(vec![9; 16], "image/webp").await.unwrap();
        store.release(&reference).await.unwrap();
        store.release(&reference).await.unwrap();

        assert!(matches!(
            store.resolve(&reference).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.load(&reference).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let reference = AttachmentRef::generate("jpg");
        assert!(matches!(
            store.resolve(&reference).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_stores_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(store_in(&dir).await);

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.store(vec![i; 32], "image/jpeg").await })
            })
            .collect();

        let mut references = std::collections::HashSet::new();
        for handle in handles {
            references.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(references.len(), 8);
    }
}
