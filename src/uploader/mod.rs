//! Client-selected file uploads.
//!
//! A [`FileUploader`] owns the list of files the user is uploading. A batch
//! is listed immediately, each file is size-checked and submitted to the
//! [`UploadBackend`](crate::backend::UploadBackend) concurrently, and entries
//! leave the list on success, size rejection, or user removal.
//!
//! - [`SelectedFile`]: one picked or dropped file
//! - [`PendingFiles`]: the per-uploader state container
//! - [`FileUploader`]: batch orchestration
//! - [`UploaderStore`]: live uploader instances keyed by owner
//! - [`ToastQueue`]: warnings shown by the toaster

mod orchestrator;
mod pending;
mod selected;
mod store;
mod toast;

pub use orchestrator::{
    BatchReport, FailurePolicy, FileUploader, UploadContext, UploaderSettings,
};
pub use pending::{BatchSplit, FileState, PendingEntry, PendingFiles, Ticket};
pub use selected::SelectedFile;
pub use store::UploaderStore;
pub use toast::{Notifier, Toast, ToastLevel, ToastQueue};
