//! The in-flight file list of one uploader.
//!
//! Entries are shown and removed by name. Upload completions address the
//! [`Ticket`] handed out when the file was listed, so a completion from an
//! earlier batch never touches a newer entry that happens to share its name.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::SelectedFile;
use crate::file_type::{self, FileKind};

/// Where a listed file is in its upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FileState {
    /// Listed, size not yet checked.
    Selected,
    /// Request issued to the backend.
    Uploading,
    /// Request failed and the entry is kept visible.
    Failed { reason: String },
}

/// Display row for a pending file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEntry {
    pub name: String,
    pub size: u64,
    pub kind: FileKind,
    pub extension: String,
    pub thumbnail: Option<String>,
    pub state: FileState,
}

impl PendingEntry {
    fn from_file(file: &SelectedFile) -> Self {
        let (kind, extension) = file_type::classify(file.name());
        Self {
            name: file.name().to_string(),
            size: file.size(),
            kind,
            extension,
            thumbnail: file_type::thumbnail_data_url(file.name(), kind, file.payload()),
            state: FileState::Selected,
        }
    }
}

/// Identifies one accepted file of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Result of recording a new batch.
#[derive(Debug, Default)]
pub struct BatchSplit {
    /// First occurrence of each name, in selection order.
    pub accepted: Vec<(Ticket, SelectedFile)>,
    /// Later files repeating an accepted name.
    pub duplicates: Vec<SelectedFile>,
}

#[derive(Debug, Default)]
struct Listing {
    entries: Vec<(Ticket, PendingEntry)>,
    /// Tickets the user removed before their request was issued.
    withdrawn: HashSet<Ticket>,
    next_ticket: u64,
}

impl Listing {
    fn position(&self, ticket: Ticket) -> Option<usize> {
        self.entries.iter().position(|(t, _)| *t == ticket)
    }
}

#[derive(Debug, Default)]
pub struct PendingFiles {
    listing: Mutex<Listing>,
}

impl PendingFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the displayed list with a new batch, keeping one entry per name.
    ///
    /// Files of earlier batches drop out of the display but keep their
    /// tickets, so their uploads still run to completion.
    pub fn begin_batch(&self, files: Vec<SelectedFile>) -> BatchSplit {
        let mut listing = self.lock();
        let mut seen = HashSet::new();
        let mut split = BatchSplit::default();
        for file in files {
            if seen.insert(file.name().to_string()) {
                let ticket = Ticket(listing.next_ticket);
                listing.next_ticket += 1;
                split.accepted.push((ticket, file));
            } else {
                split.duplicates.push(file);
            }
        }

        listing.entries = split
            .accepted
            .iter()
            .map(|(ticket, file)| (*ticket, PendingEntry::from_file(file)))
            .collect();
        split
    }

    /// Claim a ticket for upload. False only when the user removed the
    /// file before its request was issued.
    pub fn mark_uploading(&self, ticket: Ticket) -> bool {
        let mut listing = self.lock();
        if listing.withdrawn.remove(&ticket) {
            return false;
        }
        if let Some(at) = listing.position(ticket) {
            listing.entries[at].1.state = FileState::Uploading;
        }
        true
    }

    /// Keep a listed file visible as failed. False when it is no longer shown.
    pub fn mark_failed(&self, ticket: Ticket, reason: impl Into<String>) -> bool {
        let mut listing = self.lock();
        match listing.position(ticket) {
            Some(at) => {
                listing.entries[at].1.state = FileState::Failed {
                    reason: reason.into(),
                };
                true
            }
            None => false,
        }
    }

    /// Drop the entry for a settled ticket. False when it is no longer shown.
    pub fn settle(&self, ticket: Ticket) -> bool {
        let mut listing = self.lock();
        listing.withdrawn.remove(&ticket);
        match listing.position(ticket) {
            Some(at) => {
                listing.entries.remove(at);
                true
            }
            None => false,
        }
    }

    /// User removal of the shown entry with this name. Removing an absent
    /// name is a no-op.
    pub fn remove(&self, name: &str) -> bool {
        let mut listing = self.lock();
        let Some(at) = listing.entries.iter().position(|(_, e)| e.name == name) else {
            return false;
        };
        let (ticket, entry) = listing.entries.remove(at);
        if entry.state == FileState::Selected {
            listing.withdrawn.insert(ticket);
        }
        true
    }

    pub fn clear(&self) {
        let mut listing = self.lock();
        listing.entries.clear();
        listing.withdrawn.clear();
    }

    /// Entries in display order.
    pub fn snapshot(&self) -> Vec<PendingEntry> {
        self.lock()
            .entries
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Listing> {
        self.listing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, vec![0u8; 4])
    }

    fn names(pending: &PendingFiles) -> Vec<String> {
        pending.snapshot().into_iter().map(|e| e.name).collect()
    }

    fn state_of(pending: &PendingFiles, name: &str) -> Option<FileState> {
        pending
            .snapshot()
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.state)
    }

    fn tickets(split: &BatchSplit) -> Vec<Ticket> {
        split.accepted.iter().map(|(ticket, _)| *ticket).collect()
    }

    #[test]
    fn test_batch_replaces_list_and_dedupes() {
        let pending = PendingFiles::new();
        pending.begin_batch(vec![file("old.txt")]);

        let split = pending.begin_batch(vec![file("a.txt"), file("b.png"), file("a.txt")]);
        assert_eq!(split.accepted.len(), 2);
        assert_eq!(split.duplicates.len(), 1);
        assert_eq!(names(&pending), vec!["a.txt", "b.png"]);
        assert_eq!(state_of(&pending, "a.txt"), Some(FileState::Selected));
    }

    #[test]
    fn test_remove_only_touches_matching_name() {
        let pending = PendingFiles::new();
        let split = pending.begin_batch(vec![file("a"), file("b"), file("c")]);
        pending.mark_uploading(tickets(&split)[2]);

        assert!(pending.remove("b"));
        assert_eq!(names(&pending), vec!["a", "c"]);
        assert_eq!(state_of(&pending, "c"), Some(FileState::Uploading));

        // Second removal of the same name changes nothing.
        assert!(!pending.remove("b"));
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_removed_ticket_is_not_claimed_or_resurrected() {
        let pending = PendingFiles::new();
        let split = pending.begin_batch(vec![file("gone.txt")]);
        let ticket = tickets(&split)[0];
        pending.remove("gone.txt");

        assert!(!pending.mark_uploading(ticket));
        assert!(!pending.mark_failed(ticket, "boom"));
        assert!(!pending.settle(ticket));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_replaced_batch_still_claims_its_tickets() {
        let pending = PendingFiles::new();
        let first = tickets(&pending.begin_batch(vec![file("a"), file("b")]));
        pending.begin_batch(vec![file("c")]);

        assert!(pending.mark_uploading(first[0]));
        assert!(pending.mark_uploading(first[1]));
        assert!(!pending.settle(first[0]));
        assert_eq!(names(&pending), vec!["c"]);
        assert_eq!(state_of(&pending, "c"), Some(FileState::Selected));
    }

    #[test]
    fn test_stale_completion_leaves_same_named_entry_alone() {
        let pending = PendingFiles::new();
        let old = tickets(&pending.begin_batch(vec![file("x.txt")]))[0];
        pending.mark_uploading(old);
        let new = tickets(&pending.begin_batch(vec![file("x.txt")]))[0];
        pending.mark_uploading(new);

        assert!(!pending.settle(old));
        assert!(!pending.mark_failed(old, "late"));
        assert_eq!(state_of(&pending, "x.txt"), Some(FileState::Uploading));

        assert!(pending.mark_failed(new, "backend unavailable"));
        assert_eq!(
            state_of(&pending, "x.txt"),
            Some(FileState::Failed {
                reason: "backend unavailable".to_string()
            })
        );
    }

    #[test]
    fn test_removing_issued_entry_leaves_nothing_withdrawn() {
        let pending = PendingFiles::new();
        let ticket = tickets(&pending.begin_batch(vec![file("a.txt")]))[0];
        pending.mark_uploading(ticket);
        pending.remove("a.txt");

        assert!(pending.lock().withdrawn.is_empty());
    }

    #[test]
    fn test_mark_failed_keeps_entry() {
        let pending = PendingFiles::new();
        let ticket = tickets(&pending.begin_batch(vec![file("a.txt")]))[0];
        pending.mark_uploading(ticket);

        assert!(pending.mark_failed(ticket, "backend unavailable"));
        assert_eq!(
            state_of(&pending, "a.txt"),
            Some(FileState::Failed {
                reason: "backend unavailable".to_string()
            })
        );
    }

    #[test]
    fn test_image_entries_carry_thumbnail() {
        let pending = PendingFiles::new();
        pending.begin_batch(vec![file("pic.png"), file("doc.pdf")]);
        let entries = pending.snapshot();
        assert!(entries[0].thumbnail.is_some());
        assert_eq!(entries[0].kind, FileKind::Image);
        assert!(entries[1].thumbnail.is_none());
        assert_eq!(entries[1].extension, "pdf");
    }
}
