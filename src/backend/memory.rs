use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use super::{BackendError, UploadBackend, UploadRequest, UploadedFile};
use crate::file_type::{self, FileKind};

/// Process-local storage backend.
///
/// Keeps file records (not payloads) and the listing paths each upload
/// invalidated.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: RwLock<Vec<UploadedFile>>,
    invalidated: RwLock<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths whose listings were invalidated, in upload order.
    pub fn invalidated_paths(&self) -> Vec<String> {
        self.invalidated
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl UploadBackend for MemoryBackend {
    async fn upload_file(&self, request: UploadRequest) -> Result<Option<UploadedFile>, BackendError> {
        let (kind, extension) = file_type::classify(request.file.name());
        let bucket_file_id = Uuid::new_v4().to_string();

        let record = UploadedFile {
            id: Uuid::new_v4().to_string(),
            name: request.file.name().to_string(),
            url: format!("memory://{bucket_file_id}"),
            kind,
            extension,
            size: request.file.size(),
            owner: request.owner_id,
            account_id: request.account_id,
            bucket_file_id,
            created_at: chrono::Utc::now(),
        };

        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        self.invalidated
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.path);

        Ok(Some(record))
    }

    async fn list_files(
        &self,
        owner_id: &str,
        kinds: &[FileKind],
    ) -> Result<Vec<UploadedFile>, BackendError> {
        let guard = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let mut files: Vec<UploadedFile> = guard
            .iter()
            .filter(|f| f.owner == owner_id)
            .filter(|f| kinds.is_empty() || kinds.contains(&f.kind))
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::SelectedFile;

    fn request(owner: &str, name: &str, path: &str) -> UploadRequest {
        UploadRequest {
            file: SelectedFile::new(name, vec![1u8, 2, 3]),
            owner_id: owner.to_string(),
            account_id: format!("{owner}-acct"),
            path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upload_records_file_and_path() {
        let backend = MemoryBackend::new();
        let record = backend
            .upload_file(request("alice", "cat.png", "/images"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.kind, FileKind::Image);
        assert_eq!(record.extension, "png");
        assert_eq!(record.size, 3);
        assert_eq!(record.owner, "alice");
        assert_eq!(backend.invalidated_paths(), vec!["/images"]);
    }

    #[tokio::test]
    async fn test_list_filters_owner_and_kind() {
        let backend = MemoryBackend::new();
        backend.upload_file(request("alice", "a.pdf", "/")).await.unwrap();
        backend.upload_file(request("alice", "b.mp3", "/")).await.unwrap();
        backend.upload_file(request("bob", "c.pdf", "/")).await.unwrap();

        let all = backend.list_files("alice", &[]).await.unwrap();
        assert_eq!(all.len(), 2);

        let docs = backend
            .list_files("alice", &[FileKind::Document])
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "a.pdf");
        assert_eq!(backend.file_count(), 3);
    }
}
