//! Live uploader instances, one per rendered page.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use super::orchestrator::{FileUploader, UploaderSettings};
use super::toast::{Notifier, Toast, ToastQueue};
use crate::backend::UploadBackend;

/// Uploaders are scoped to their owner so ids cannot be used across users.
type UploaderKey = (String, String);

#[derive(Debug, Clone)]
struct Slot {
    uploader: FileUploader,
    toasts: Arc<ToastQueue>,
}

/// Thread-safe registry of uploader instances.
///
/// Cloning shares the same registry.
#[derive(Debug, Clone)]
pub struct UploaderStore {
    slots: Arc<RwLock<HashMap<UploaderKey, Slot>>>,
    backend: Arc<dyn UploadBackend>,
    settings: UploaderSettings,
    toast_capacity: usize,
}

impl UploaderStore {
    pub fn new(
        backend: Arc<dyn UploadBackend>,
        settings: UploaderSettings,
        toast_capacity: usize,
    ) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            backend,
            settings,
            toast_capacity,
        }
    }

    pub fn get(&self, owner_id: &str, uploader_id: &str) -> Option<FileUploader> {
        self.read()
            .get(&key(owner_id, uploader_id))
            .map(|slot| slot.uploader.clone())
    }

    /// Look up an uploader, creating it on first use of the id.
    ///
    /// Pages only name an uploader; it comes to life with the first upload
    /// (or again after eviction or a restart).
    pub fn get_or_create(&self, owner_id: &str, uploader_id: &str) -> FileUploader {
        if let Some(existing) = self.get(owner_id, uploader_id) {
            return existing;
        }

        let mut guard = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(key(owner_id, uploader_id))
            .or_insert_with(|| {
                let toasts = Arc::new(ToastQueue::new(self.toast_capacity));
                let uploader = FileUploader::new(
                    uploader_id,
                    Arc::clone(&self.backend),
                    Arc::clone(&toasts) as Arc<dyn Notifier>,
                    self.settings.clone(),
                );
                Slot { uploader, toasts }
            })
            .uploader
            .clone()
    }

    /// Drain the toasts raised by one uploader.
    pub fn take_toasts(&self, owner_id: &str, uploader_id: &str) -> Vec<Toast> {
        self.read()
            .get(&key(owner_id, uploader_id))
            .map(|slot| slot.toasts.drain())
            .unwrap_or_default()
    }

    /// Shut down and drop uploaders idle for longer than `idle`.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let mut guard = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, slot| {
            let keep = slot.uploader.idle_for() <= idle;
            if !keep {
                slot.uploader.shutdown();
            }
            keep
        });
        before - guard.len()
    }

    /// Periodically evict idle uploaders.
    pub fn spawn_sweeper(&self, idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = (idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(idle);
                if evicted > 0 {
                    info!(evicted, remaining = store.len(), "Evicted idle uploaders");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<UploaderKey, Slot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(owner_id: &str, uploader_id: &str) -> UploaderKey {
    (owner_id.to_string(), uploader_id.to_string())
}
