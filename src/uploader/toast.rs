//! Short-lived user notifications.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Warning,
    Error,
}

impl ToastLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget notification channel. Delivery is never acknowledged.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    fn notify(&self, toast: Toast);
}

/// Bounded queue drained by the toaster. When full, the oldest toast is dropped.
#[derive(Debug)]
pub struct ToastQueue {
    capacity: usize,
    toasts: Mutex<VecDeque<Toast>>,
}

impl ToastQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            toasts: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Take every queued toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        let mut guard = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.len() == self.capacity {
            guard.pop_front();
        }
        guard.push_back(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let queue = ToastQueue::new(2);
        queue.notify(Toast::warning("one"));
        queue.notify(Toast::warning("two"));
        queue.notify(Toast::error("three"));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "two");
        assert_eq!(drained[1], Toast::error("three"));
        assert!(queue.is_empty());
    }
}
