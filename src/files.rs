//! File-service collaborator.
//!
//! Uploaded documents are owned by a business. Todos never embed file
//! content; they reference files only through task-file mappings.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::{tables, Storage};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub id: String,
    pub business_id: String,
    pub user_id: String,
    pub name: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait FileService: Send + Sync {
    async fn list(&self, user_id: &str, business_id: &str) -> Result<Vec<FileRecord>>;

    async fn upload(
        &self,
        user_id: &str,
        business_id: &str,
        name: &str,
        content: Vec<u8>,
    ) -> Result<FileRecord>;

    /// Returns whether a file was removed.
    async fn remove(&self, user_id: &str, file_id: &str) -> Result<bool>;

    async fn get(&self, user_id: &str, file_id: &str) -> Result<Option<FileRecord>>;

    async fn get_content(&self, user_id: &str, file_id: &str) -> Result<Vec<u8>>;
}

/// File service keeping records in `files.jsonl` and content under
/// `<data-dir>/files/<id>`.
#[derive(Debug, Clone)]
pub struct LocalFileService {
    storage: Arc<Storage>,
    max_upload_bytes: u64,
}

impl LocalFileService {
    pub fn new(storage: Arc<Storage>, max_upload_bytes: u64) -> Self {
        Self {
            storage,
            max_upload_bytes,
        }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|err| Error::RemoteFailure(format!("file task failed: {err}")))?
    }
}

#[async_trait]
impl FileService for LocalFileService {
    async fn list(&self, user_id: &str, business_id: &str) -> Result<Vec<FileRecord>> {
        let user_id = user_id.to_string();
        let business_id = business_id.to_string();
        self.blocking(move |storage| {
            let mut records: Vec<FileRecord> = storage.read_table(tables::FILES)?;
            records.retain(|r| r.user_id == user_id && r.business_id == business_id);
            records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
            Ok(records)
        })
        .await
    }

    async fn upload(
        &self,
        user_id: &str,
        business_id: &str,
        name: &str,
        content: Vec<u8>,
    ) -> Result<FileRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("file name cannot be empty".to_string()));
        }
        let size_bytes = content.len() as u64;
        if size_bytes > self.max_upload_bytes {
            return Err(Error::InvalidArgument(format!(
                "file '{name}' is {size_bytes} bytes; the limit is {}",
                self.max_upload_bytes
            )));
        }

        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            size_bytes,
            uploaded_at: Utc::now(),
        };
        let stored = record.clone();
        self.blocking(move |storage| {
            storage.write_atomic(&storage.file_blob(&stored.id), &content)?;
            storage.update_table(tables::FILES, |rows: &mut Vec<FileRecord>| {
                rows.push(stored);
                Ok(())
            })
        })
        .await?;
        tracing::info!(file_id = %record.id, business_id = %record.business_id, "file uploaded");
        Ok(record)
    }

    async fn remove(&self, user_id: &str, file_id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let file_id = file_id.to_string();
        self.blocking(move |storage| {
            let removed = storage.update_table(tables::FILES, |rows: &mut Vec<FileRecord>| {
                let before = rows.len();
                rows.retain(|r| !(r.id == file_id && r.user_id == user_id));
                Ok(rows.len() != before)
            })?;
            if removed {
                let blob = storage.file_blob(&file_id);
                if blob.exists() {
                    std::fs::remove_file(blob)?;
                }
            }
            Ok(removed)
        })
        .await
    }

    async fn get(&self, user_id: &str, file_id: &str) -> Result<Option<FileRecord>> {
        let user_id = user_id.to_string();
        let file_id = file_id.to_string();
        self.blocking(move |storage| {
            let records: Vec<FileRecord> = storage.read_table(tables::FILES)?;
            Ok(records
                .into_iter()
                .find(|r| r.id == file_id && r.user_id == user_id))
        })
        .await
    }

    async fn get_content(&self, user_id: &str, file_id: &str) -> Result<Vec<u8>> {
        if self.get(user_id, file_id).await?.is_none() {
            return Err(Error::FileNotFound(file_id.to_string()));
        }
        let file_id = file_id.to_string();
        self.blocking(move |storage| {
            let blob = storage.file_blob(&file_id);
            if !blob.exists() {
                return Err(Error::FileNotFound(file_id));
            }
            Ok(std::fs::read(blob)?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(dir: &tempfile::TempDir, limit: u64) -> LocalFileService {
        LocalFileService::new(Arc::new(Storage::new(dir.path().to_path_buf())), limit)
    }

    #[tokio::test]
    async fn upload_list_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let files = service(&dir, 1024);

        let record = files
            .upload("u-1", "b-1", "policy.md", b"# Ethics policy".to_vec())
            .await
            .unwrap();
        assert_eq!(record.size_bytes, 15);

        let listed = files.list("u-1", "b-1").await.unwrap();
        assert_eq!(listed, vec![record.clone()]);
        assert!(files.list("u-2", "b-1").await.unwrap().is_empty());

        let content = files.get_content("u-1", &record.id).await.unwrap();
        assert_eq!(content, b"# Ethics policy");

        assert!(files.remove("u-1", &record.id).await.unwrap());
        assert!(matches!(
            files.get_content("u-1", &record.id).await,
            Err(Error::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let files = service(&dir, 4);
        let err = files
            .upload("u-1", "b-1", "big.pdf", vec![0; 5])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn other_users_cannot_read_content() {
        let dir = tempfile::tempdir().unwrap();
        let files = service(&dir, 1024);
        let record = files
            .upload("u-1", "b-1", "notes.txt", b"private".to_vec())
            .await
            .unwrap();
        assert!(files.get_content("u-2", &record.id).await.is_err());
        assert!(!files.remove("u-2", &record.id).await.unwrap());
    }
}
