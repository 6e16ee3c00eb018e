//! Batch search and delete over a [`Store`].
//!
//! `run_delete` deletes exactly the rows the same criteria would list, so a
//! preview shown with `run_search` is what gets removed.

use crate::history::{HistoryEntry, SearchCriteria, Store};

/// Result of [`run_delete`].
#[derive(Debug)]
pub struct Deletion {
    /// The matched entries, in query order, before removal.
    pub entries: Vec<HistoryEntry>,
    /// Rows actually removed.
    pub removed: usize,
}

impl Deletion {
    pub const fn count(&self) -> usize {
        self.removed
    }
}

/// Query the store, optionally collapsing consecutive repeats of a command.
///
/// # Errors
/// Returns an error if the query fails.
pub fn run_search(
    store: &Store,
    criteria: &SearchCriteria,
    adjacent_dedup: bool,
) -> anyhow::Result<Vec<HistoryEntry>> {
    let entries = store.search(criteria)?;
    if adjacent_dedup {
        Ok(dedup_adjacent(entries))
    } else {
        Ok(entries)
    }
}

/// Delete every entry matching `criteria`.
///
/// # Errors
/// Returns an error if the query or the delete transaction fails.
pub fn run_delete(store: &Store, criteria: &SearchCriteria) -> anyhow::Result<Deletion> {
    let entries = store.search(criteria)?;
    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    let removed = store.delete_by_ids(&ids)?;
    tracing::debug!(matched = ids.len(), removed, "deleted history entries");
    Ok(Deletion { entries, removed })
}

/// Drop entries whose command equals the one right before them. Repeats that
/// are separated by another command are kept.
pub fn dedup_adjacent(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut out: Vec<HistoryEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if out.last().is_some_and(|prev| prev.command == entry.command) {
            continue;
        }
        out.push(entry);
    }
    out
}
