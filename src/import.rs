//! Bulk import of an existing plain-text history (e.g. `~/.bash_history`).

use std::io::BufRead;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::history::{EXIT_CODE_UNKNOWN, NewEntry, Store};
use crate::record::{current_user, local_hostname};

/// Turn each line of `reader` into an entry with no directory, the epoch as
/// its timestamp and an unknown exit code. Bytes that are not UTF-8 are
/// replaced rather than rejected.
///
/// # Errors
/// Returns an error if reading fails.
pub fn read_entries(reader: impl BufRead) -> anyhow::Result<Vec<NewEntry>> {
    let hostname = local_hostname();
    let user = current_user();
    let mut entries = Vec::new();
    for line in reader.split(b'\n') {
        let mut bytes = line.context("read import line")?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        entries.push(NewEntry {
            command: String::from_utf8_lossy(&bytes).into_owned(),
            workdir: String::new(),
            hostname: hostname.clone(),
            user: user.clone(),
            exit_code: EXIT_CODE_UNKNOWN,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        });
    }
    Ok(entries)
}

/// Import every line of `reader` in a single transaction.
///
/// # Errors
/// Returns an error if reading fails or any insert fails; in the latter case
/// nothing is written.
pub fn import(store: &Store, reader: impl BufRead) -> anyhow::Result<usize> {
    let entries = read_entries(reader)?;
    let n = store.bulk_insert(&entries)?;
    tracing::debug!(entries = n, "imported history");
    Ok(n)
}
