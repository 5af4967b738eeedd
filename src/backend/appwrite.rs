//! Appwrite-compatible REST client.
//!
//! Serves both seams: [`UploadBackend`] (storage bucket + files collection)
//! and [`IdentityProvider`] (account session + users collection).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;
use uuid::Uuid;

use super::{BackendError, UploadBackend, UploadRequest, UploadedFile};
use crate::config::BackendConfig;
use crate::file_type::{self, FileKind};
use crate::identity::{CurrentUser, Credentials, IdentityError, IdentityProvider};

/// Appwrite rejects single requests above 5MB; larger files go in chunks.
pub const CHUNK_SIZE: usize = 5 * 1024 * 1024;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
const SESSION_HEADER: &str = "X-Appwrite-Session";
const UPLOAD_ID_HEADER: &str = "x-appwrite-id";

/// HTTP client for an Appwrite project.
#[derive(Clone)]
pub struct AppwriteClient {
    base_url: Url,
    http: reqwest::Client,
    project_id: String,
    api_key: String,
    database_id: String,
    users_collection_id: String,
    files_collection_id: String,
    bucket_id: String,
}

impl std::fmt::Debug for AppwriteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppwriteClient")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .field("bucket_id", &self.bucket_id)
            .finish_non_exhaustive()
    }
}

/// Stored blob as returned by the storage API.
#[derive(Debug, Deserialize)]
struct StorageFile {
    #[serde(rename = "$id")]
    id: String,
}

/// Row of the files collection.
#[derive(Debug, Deserialize)]
struct FileDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt")]
    created_at: DateTime<Utc>,
    name: String,
    url: String,
    #[serde(rename = "type")]
    kind: FileKind,
    extension: String,
    size: u64,
    /// Plain id, or the expanded user document when stored as a relationship.
    owner: serde_json::Value,
    #[serde(rename = "accountId")]
    account_id: String,
    #[serde(rename = "bucketFileId")]
    bucket_file_id: String,
}

impl From<FileDocument> for UploadedFile {
    fn from(doc: FileDocument) -> Self {
        let owner = match &doc.owner {
            serde_json::Value::String(id) => id.clone(),
            other => other
                .get("$id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        Self {
            id: doc.id,
            name: doc.name,
            url: doc.url,
            kind: doc.kind,
            extension: doc.extension,
            size: doc.size,
            owner,
            account_id: doc.account_id,
            bucket_file_id: doc.bucket_file_id,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewFileDocument<'a> {
    #[serde(rename = "type")]
    kind: FileKind,
    name: &'a str,
    url: &'a str,
    extension: &'a str,
    size: u64,
    owner: &'a str,
    #[serde(rename = "accountId")]
    account_id: &'a str,
    users: Vec<String>,
    #[serde(rename = "bucketFileId")]
    bucket_file_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Account {
    #[serde(rename = "$id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "accountId")]
    account_id: String,
    #[serde(rename = "fullName")]
    full_name: String,
    email: String,
    #[serde(default)]
    avatar: Option<String>,
}

impl AppwriteClient {
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        for (name, value) in [
            ("backend.project_id", &config.project_id),
            ("backend.api_key", &config.api_key),
            ("backend.database_id", &config.database_id),
            ("backend.users_collection_id", &config.users_collection_id),
            ("backend.files_collection_id", &config.files_collection_id),
            ("backend.bucket_id", &config.bucket_id),
        ] {
            if value.trim().is_empty() {
                return Err(BackendError::Config(format!(
                    "{name} must be set for the appwrite provider"
                )));
            }
        }

        Ok(Self {
            base_url: normalize_base(&config.endpoint)?,
            http: reqwest::Client::new(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
            users_collection_id: config.users_collection_id.clone(),
            files_collection_id: config.files_collection_id.clone(),
            bucket_id: config.bucket_id.clone(),
        })
    }

    /// Public view URL of a stored blob.
    pub fn file_view_url(&self, bucket_file_id: &str) -> Result<Url, BackendError> {
        let mut url = self.url(&format!(
            "storage/buckets/{}/files/{bucket_file_id}/view",
            self.bucket_id
        ))?;
        url.query_pairs_mut().append_pair("project", &self.project_id);
        Ok(url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────

    async fn store_blob(&self, request: &UploadRequest) -> Result<StorageFile, BackendError> {
        let url = self.url(&format!("storage/buckets/{}/files", self.bucket_id))?;
        let file_id = Uuid::new_v4().simple().to_string();
        let payload = request.file.payload();
        let total = payload.len();
        let content_type = request.file.content_type();

        if total <= CHUNK_SIZE {
            let part = Part::bytes(payload.to_vec())
                .file_name(request.file.name().to_string())
                .mime_str(&content_type)?;
            let form = Form::new().text("fileId", file_id).part("file", part);
            let response = self.server_request(self.http.post(url)).multipart(form).send().await?;
            return handle_response(response).await;
        }

        let mut stored = None;
        for start in (0..total).step_by(CHUNK_SIZE) {
            let end = (start + CHUNK_SIZE).min(total);
            let part = Part::bytes(payload.slice(start..end).to_vec())
                .file_name(request.file.name().to_string())
                .mime_str(&content_type)?;
            let form = Form::new().text("fileId", file_id.clone()).part("file", part);

            let mut builder = self
                .server_request(self.http.post(url.clone()))
                .header("content-range", format!("bytes {start}-{}/{total}", end - 1));
            if start > 0 {
                builder = builder.header(UPLOAD_ID_HEADER, &file_id);
            }

            let response = builder.multipart(form).send().await?;
            stored = Some(handle_response::<StorageFile>(response).await?);
            tracing::trace!(file_id = %file_id, end, total, "Uploaded chunk");
        }

        stored.ok_or_else(|| BackendError::Api {
            status: 0,
            message: "no chunk was uploaded".to_string(),
        })
    }

    async fn delete_blob(&self, bucket_file_id: &str) -> Result<(), BackendError> {
        let url = self.url(&format!(
            "storage/buckets/{}/files/{bucket_file_id}",
            self.bucket_id
        ))?;
        let response = self.server_request(self.http.delete(url)).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    fn documents_url(&self, collection_id: &str) -> Result<Url, BackendError> {
        self.url(&format!(
            "databases/{}/collections/{collection_id}/documents",
            self.database_id
        ))
    }

    /// Request authenticated with the server API key.
    fn server_request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(PROJECT_HEADER, &self.project_id)
            .header(KEY_HEADER, &self.api_key)
    }
}

#[async_trait]
impl UploadBackend for AppwriteClient {
    async fn upload_file(&self, request: UploadRequest) -> Result<Option<UploadedFile>, BackendError> {
        let blob = self.store_blob(&request).await?;
        let (kind, extension) = file_type::classify(request.file.name());
        let view_url = self.file_view_url(&blob.id)?;

        let data = NewFileDocument {
            kind,
            name: request.file.name(),
            url: view_url.as_str(),
            extension: &extension,
            size: request.file.size(),
            owner: &request.owner_id,
            account_id: &request.account_id,
            users: Vec::new(),
            bucket_file_id: &blob.id,
        };
        let body = json!({ "documentId": Uuid::new_v4().simple().to_string(), "data": data });

        let response = self
            .server_request(self.http.post(self.documents_url(&self.files_collection_id)?))
            .json(&body)
            .send()
            .await;

        let document = match response {
            Ok(response) => handle_response::<FileDocument>(response).await,
            Err(e) => Err(e.into()),
        };

        match document {
            Ok(document) => {
                tracing::debug!(
                    file_id = %document.id,
                    bucket_file_id = %blob.id,
                    path = %request.path,
                    "Created file document"
                );
                Ok(Some(document.into()))
            }
            Err(e) => {
                // Never leave an orphaned blob behind a failed record write.
                if let Err(cleanup) = self.delete_blob(&blob.id).await {
                    tracing::warn!(
                        bucket_file_id = %blob.id,
                        error = %cleanup,
                        "Failed to delete orphaned blob"
                    );
                }
                Err(e)
            }
        }
    }

    async fn list_files(
        &self,
        owner_id: &str,
        kinds: &[FileKind],
    ) -> Result<Vec<UploadedFile>, BackendError> {
        let mut queries = vec![
            json!({ "method": "equal", "attribute": "owner", "values": [owner_id] }).to_string(),
            json!({ "method": "orderDesc", "attribute": "$createdAt" }).to_string(),
        ];
        if !kinds.is_empty() {
            let values: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            queries.push(
                json!({ "method": "equal", "attribute": "type", "values": values }).to_string(),
            );
        }

        let mut url = self.documents_url(&self.files_collection_id)?;
        {
            let mut pairs = url.query_pairs_mut();
            for query in &queries {
                pairs.append_pair("queries[]", query);
            }
        }

        let response = self.server_request(self.http.get(url)).send().await?;
        let list: DocumentList<FileDocument> = handle_response(response).await?;
        Ok(list.documents.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl IdentityProvider for AppwriteClient {
    async fn current_user(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<CurrentUser>, IdentityError> {
        let Some(session) = credentials.session_token.as_deref() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.url("account")?)
            .header(PROJECT_HEADER, &self.project_id)
            .header(SESSION_HEADER, session)
            .send()
            .await
            .map_err(BackendError::from)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let account: Account = handle_response(response).await?;

        let mut url = self.documents_url(&self.users_collection_id)?;
        url.query_pairs_mut().append_pair(
            "queries[]",
            &json!({ "method": "equal", "attribute": "accountId", "values": [account.id] })
                .to_string(),
        );
        let response = self
            .server_request(self.http.get(url))
            .send()
            .await
            .map_err(BackendError::from)?;
        let users: DocumentList<UserDocument> = handle_response(response).await?;

        Ok(users.documents.into_iter().next().map(|user| CurrentUser {
            id: user.id,
            account_id: user.account_id,
            full_name: user.full_name,
            email: user.email,
            avatar: user.avatar,
        }))
    }
}

fn normalize_base(endpoint: &str) -> Result<Url, BackendError> {
    let trimmed = endpoint.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    if response.status().is_success() {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".into());
    BackendError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::SelectedFile;
    use mockito::{Matcher, Server};

    const FILES_PATH: &str = "/v1/storage/buckets/bucket/files";
    const DOCUMENTS_PATH: &str = "/v1/databases/db/collections/files/documents";

    fn config() -> BackendConfig {
        BackendConfig {
            provider: "appwrite".to_string(),
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project_id: "proj".to_string(),
            api_key: "key".to_string(),
            database_id: "db".to_string(),
            users_collection_id: "users".to_string(),
            files_collection_id: "files".to_string(),
            bucket_id: "bucket".to_string(),
        }
    }

    #[test]
    fn test_endpoint_keeps_version_segment() {
        let client = AppwriteClient::from_config(&config()).unwrap();
        assert_eq!(client.base_url.as_str(), "https://cloud.appwrite.io/v1/");
        assert_eq!(
            client.file_view_url("abc").unwrap().as_str(),
            "https://cloud.appwrite.io/v1/storage/buckets/bucket/files/abc/view?project=proj"
        );
    }

    #[test]
    fn test_missing_settings_are_reported() {
        let mut cfg = config();
        cfg.bucket_id = String::new();
        let err = AppwriteClient::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("backend.bucket_id"));
    }

    #[test]
    fn test_file_document_owner_shapes() {
        let plain = serde_json::json!({
            "$id": "doc1",
            "$createdAt": "2024-05-01T10:00:00.000+00:00",
            "name": "a.pdf",
            "url": "https://x/view",
            "type": "document",
            "extension": "pdf",
            "size": 10,
            "owner": "user-1",
            "accountId": "acct-1",
            "bucketFileId": "blob1"
        });
        let doc: FileDocument = serde_json::from_value(plain).unwrap();
        let file = UploadedFile::from(doc);
        assert_eq!(file.owner, "user-1");
        assert_eq!(file.kind, FileKind::Document);

        let expanded = serde_json::json!({
            "$id": "doc2",
            "$createdAt": "2024-05-01T10:00:00.000+00:00",
            "name": "b.png",
            "url": "https://x/view",
            "type": "image",
            "extension": "png",
            "size": 10,
            "owner": { "$id": "user-2", "fullName": "Bo" },
            "accountId": "acct-2",
            "bucketFileId": "blob2"
        });
        let doc: FileDocument = serde_json::from_value(expanded).unwrap();
        assert_eq!(UploadedFile::from(doc).owner, "user-2");
    }

    fn mock_client(server: &Server) -> AppwriteClient {
        let mut cfg = config();
        cfg.endpoint = format!("{}/v1", server.url());
        AppwriteClient::from_config(&cfg).unwrap()
    }

    fn request(name: &str, size: usize) -> UploadRequest {
        UploadRequest {
            file: SelectedFile::new(name, vec![7u8; size]),
            owner_id: "user-1".to_string(),
            account_id: "acct-1".to_string(),
            path: "/".to_string(),
        }
    }

    fn document_body(bucket_file_id: &str) -> String {
        serde_json::json!({
            "$id": "doc-1",
            "$createdAt": "2024-05-01T10:00:00.000+00:00",
            "name": "big.bin",
            "url": "https://example.test/view",
            "type": "other",
            "extension": "bin",
            "size": 2 * CHUNK_SIZE + 1,
            "owner": "user-1",
            "accountId": "acct-1",
            "bucketFileId": bucket_file_id
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_large_payload_is_uploaded_in_chunks() {
        let mut server = Server::new_async().await;
        let total = 2 * CHUNK_SIZE + 1;

        let first = server
            .mock("POST", FILES_PATH)
            .match_header("content-range", "bytes 0-5242879/10485761")
            .match_header("x-appwrite-id", Matcher::Missing)
            .match_header("x-appwrite-key", "key")
            .with_status(201)
            .with_body(r#"{"$id":"blob-1"}"#)
            .expect(1)
            .create_async()
            .await;
        let middle = server
            .mock("POST", FILES_PATH)
            .match_header("content-range", "bytes 5242880-10485759/10485761")
            .match_header("x-appwrite-id", Matcher::Regex("^[0-9a-f]{32}$".to_string()))
            .with_status(201)
            .with_body(r#"{"$id":"blob-1"}"#)
            .expect(1)
            .create_async()
            .await;
        let last = server
            .mock("POST", FILES_PATH)
            .match_header("content-range", "bytes 10485760-10485760/10485761")
            .match_header("x-appwrite-id", Matcher::Regex("^[0-9a-f]{32}$".to_string()))
            .with_status(201)
            .with_body(r#"{"$id":"blob-1"}"#)
            .expect(1)
            .create_async()
            .await;
        let document = server
            .mock("POST", DOCUMENTS_PATH)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "data": { "bucketFileId": "blob-1", "owner": "user-1", "accountId": "acct-1" }
            })))
            .with_status(201)
            .with_body(document_body("blob-1"))
            .expect(1)
            .create_async()
            .await;

        let client = mock_client(&server);
        let uploaded = client
            .upload_file(request("big.bin", total))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(uploaded.bucket_file_id, "blob-1");
        assert_eq!(uploaded.size, total as u64);
        first.assert_async().await;
        middle.assert_async().await;
        last.assert_async().await;
        document.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_document_write_deletes_blob() {
        let mut server = Server::new_async().await;

        let blob = server
            .mock("POST", FILES_PATH)
            .match_header("content-range", Matcher::Missing)
            .with_status(201)
            .with_body(r#"{"$id":"blob-9"}"#)
            .expect(1)
            .create_async()
            .await;
        let document = server
            .mock("POST", DOCUMENTS_PATH)
            .with_status(500)
            .with_body("database unavailable")
            .expect(1)
            .create_async()
            .await;
        let cleanup = server
            .mock("DELETE", "/v1/storage/buckets/bucket/files/blob-9")
            .match_header("x-appwrite-project", "proj")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let client = mock_client(&server);
        let err = client.upload_file(request("small.txt", 16)).await.unwrap_err();

        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        blob.assert_async().await;
        document.assert_async().await;
        cleanup.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_session_is_anonymous() {
        let mut server = Server::new_async().await;
        let account = server
            .mock("GET", "/v1/account")
            .match_header("x-appwrite-session", "stale")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let client = mock_client(&server);
        let credentials = Credentials {
            session_token: Some("stale".to_string()),
        };
        assert!(client.current_user(&credentials).await.unwrap().is_none());
        account.assert_async().await;
    }
}
