//! Batch upload orchestration for one uploader instance.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::pending::{PendingEntry, PendingFiles, Ticket};
use super::toast::{Notifier, Toast};
use super::SelectedFile;
use crate::backend::{BackendError, UploadBackend, UploadRequest, UploadedFile};
use crate::config::{DEFAULT_MAX_FILE_SIZE, UploadConfig};

/// What happens to a listed file whose upload failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the entry visible in the `Failed` state.
    #[default]
    Retain,
    /// Drop the entry and raise an error toast.
    Remove,
}

#[derive(Debug, Clone)]
pub struct UploaderSettings {
    pub max_file_size: u64,
    pub max_concurrent: Option<usize>,
    pub timeout: Option<Duration>,
    pub on_failure: FailurePolicy,
}

impl Default for UploaderSettings {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_concurrent: None,
            timeout: None,
            on_failure: FailurePolicy::Retain,
        }
    }
}

impl From<&UploadConfig> for UploaderSettings {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes,
            max_concurrent: config.max_concurrent(),
            timeout: config.timeout(),
            on_failure: config.on_failure,
        }
    }
}

/// Who is uploading, and from which page.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub owner_id: String,
    pub account_id: String,
    pub path: String,
}

/// Tally of a settled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub accepted: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Removed by the user before a request was issued.
    pub withdrawn: usize,
    pub cancelled: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Rejected => self.rejected += 1,
            FileOutcome::Uploaded => self.succeeded += 1,
            FileOutcome::Failed => self.failed += 1,
            FileOutcome::Withdrawn => self.withdrawn += 1,
            FileOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Rejected,
    Uploaded,
    Failed,
    Withdrawn,
    Cancelled,
}

#[derive(Error, Debug)]
enum UploadFailure {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("upload timed out after {0:?}")]
    TimedOut(Duration),

    #[error("the backend returned no file record")]
    NoRecord,
}

/// One uploader: its pending list, notification channel and in-flight work.
///
/// Cloning is cheap and shares the same state.
#[derive(Debug, Clone)]
pub struct FileUploader {
    inner: Arc<UploaderInner>,
}

#[derive(Debug)]
struct UploaderInner {
    id: String,
    backend: Arc<dyn UploadBackend>,
    notifier: Arc<dyn Notifier>,
    settings: UploaderSettings,
    pending: PendingFiles,
    cancel: CancellationToken,
    last_activity: Mutex<Instant>,
}

impl FileUploader {
    pub fn new(
        id: impl Into<String>,
        backend: Arc<dyn UploadBackend>,
        notifier: Arc<dyn Notifier>,
        settings: UploaderSettings,
    ) -> Self {
        Self {
            inner: Arc::new(UploaderInner {
                id: id.into(),
                backend,
                notifier,
                settings,
                pending: PendingFiles::new(),
                cancel: CancellationToken::new(),
                last_activity: Mutex::new(Instant::now()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn settings(&self) -> &UploaderSettings {
        &self.inner.settings
    }

    /// Record `files` as pending and upload them concurrently.
    ///
    /// The list is updated before this returns; the handle resolves once
    /// every file has settled.
    pub fn submit_batch(&self, files: Vec<SelectedFile>, ctx: UploadContext) -> JoinHandle<BatchReport> {
        self.touch();
        let split = self.inner.pending.begin_batch(files);

        for dup in &split.duplicates {
            self.inner.notifier.notify(Toast::warning(format!(
                "{} was selected more than once and will be uploaded once.",
                dup.name()
            )));
        }

        let mut report = BatchReport {
            accepted: split.accepted.len(),
            duplicates: split.duplicates.len(),
            ..BatchReport::default()
        };

        info!(
            name: "upload.batch.started",
            uploader_id = %self.inner.id,
            owner_id = %ctx.owner_id,
            path = %ctx.path,
            accepted = report.accepted,
            duplicates = report.duplicates,
            "Upload batch started"
        );

        let limiter = self.inner.settings.max_concurrent.map(Semaphore::new);
        let this = self.clone();
        tokio::spawn(async move {
            let uploads = split
                .accepted
                .into_iter()
                .map(|(ticket, file)| this.process_file(ticket, file, &ctx, limiter.as_ref()));

            for outcome in futures::future::join_all(uploads).await {
                report.record(outcome);
            }

            info!(
                name: "upload.batch.settled",
                uploader_id = %this.inner.id,
                succeeded = report.succeeded,
                rejected = report.rejected,
                failed = report.failed,
                withdrawn = report.withdrawn,
                cancelled = report.cancelled,
                "Upload batch settled"
            );
            report
        })
    }

    /// Stop showing a file. An issued request keeps running; its completion
    /// finds nothing to remove.
    pub fn remove(&self, name: &str) -> bool {
        self.touch();
        let removed = self.inner.pending.remove(name);
        debug!(uploader_id = %self.inner.id, file = %name, removed, "Pending file removed by user");
        removed
    }

    pub fn pending(&self) -> Vec<PendingEntry> {
        self.touch();
        self.inner.pending.snapshot()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.pending.is_empty()
    }

    /// Cancel in-flight requests and clear the list.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.pending.clear();
        debug!(uploader_id = %self.inner.id, "Uploader shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    pub fn idle_for(&self) -> Duration {
        self.inner
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    fn touch(&self) {
        *self
            .inner
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    async fn process_file(
        &self,
        ticket: Ticket,
        file: SelectedFile,
        ctx: &UploadContext,
        limiter: Option<&Semaphore>,
    ) -> FileOutcome {
        let name = file.name().to_string();
        let max = self.inner.settings.max_file_size;

        if file.size() > max {
            self.inner.pending.settle(ticket);
            warn!(
                name: "upload.file.rejected",
                uploader_id = %self.inner.id,
                file = %name,
                size = file.size(),
                max_size = max,
                "File exceeds maximum size"
            );
            self.inner.notifier.notify(Toast::warning(format!(
                "{name} is too large. Max file size is {}.",
                human_size(max)
            )));
            return FileOutcome::Rejected;
        }

        let _permit = match limiter {
            Some(semaphore) => tokio::select! {
                () = self.inner.cancel.cancelled() => return FileOutcome::Cancelled,
                permit = semaphore.acquire() => match permit {
                    Ok(permit) => Some(permit),
                    Err(_closed) => return FileOutcome::Cancelled,
                },
            },
            None => None,
        };

        if self.inner.cancel.is_cancelled() {
            return FileOutcome::Cancelled;
        }

        if !self.inner.pending.mark_uploading(ticket) {
            debug!(uploader_id = %self.inner.id, file = %name, "File removed before upload started");
            return FileOutcome::Withdrawn;
        }

        let request = UploadRequest {
            file,
            owner_id: ctx.owner_id.clone(),
            account_id: ctx.account_id.clone(),
            path: ctx.path.clone(),
        };

        let result = tokio::select! {
            () = self.inner.cancel.cancelled() => return FileOutcome::Cancelled,
            result = self.upload(request) => result,
        };

        match result {
            Ok(record) => {
                self.inner.pending.settle(ticket);
                info!(
                    name: "upload.file.completed",
                    uploader_id = %self.inner.id,
                    file = %name,
                    file_id = %record.id,
                    size = record.size,
                    "File uploaded"
                );
                FileOutcome::Uploaded
            }
            Err(e) => {
                self.handle_failure(ticket, &name, &e);
                FileOutcome::Failed
            }
        }
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadedFile, UploadFailure> {
        let call = self.inner.backend.upload_file(request);
        let result = match self.inner.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_elapsed| UploadFailure::TimedOut(limit))?,
            None => call.await,
        };
        result?.ok_or(UploadFailure::NoRecord)
    }

    fn handle_failure(&self, ticket: Ticket, name: &str, error: &UploadFailure) {
        warn!(
            name: "upload.file.failed",
            uploader_id = %self.inner.id,
            file = %name,
            error = %error,
            policy = ?self.inner.settings.on_failure,
            "File upload failed"
        );

        match self.inner.settings.on_failure {
            FailurePolicy::Retain => {
                self.inner.pending.mark_failed(ticket, error.to_string());
            }
            FailurePolicy::Remove => {
                if self.inner.pending.settle(ticket) {
                    self.inner
                        .notifier
                        .notify(Toast::error(format!("{name} could not be uploaded.")));
                }
            }
        }
    }
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{bytes} bytes")
    }
}
