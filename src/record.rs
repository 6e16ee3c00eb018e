//! The `add` path: turn one line of `history 1` output into a stored entry.

use std::sync::LazyLock;

use anyhow::Context as _;
use chrono::Utc;
use regex::Regex;

use crate::history::{EXIT_CODE_NO_LOG, NewEntry, Store};

/// `history 1` prints `  <index>[*]  <command>`; the `*` marks an entry edited
/// in place. The command may span several lines.
#[allow(clippy::unwrap_used)]
static HISTORY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*\d+\*?\s+(.*)$").unwrap());

/// Extract the command text from a `history 1` line.
pub fn parse_history_line(line: &str) -> Option<&str> {
    let caps = HISTORY_LINE.captures(line)?;
    let cmd = caps.get(1)?.as_str().trim_end_matches('\n');
    if cmd.trim().is_empty() {
        None
    } else {
        Some(cmd)
    }
}

/// Returns `true` when the hook asked for this invocation to be skipped.
pub const fn is_no_log(exit_code: i32) -> bool {
    exit_code == EXIT_CODE_NO_LOG
}

impl NewEntry {
    /// Build an entry for a command that just ran here, now, as this user.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined.
    pub fn capture(command: &str, exit_code: i32) -> anyhow::Result<Self> {
        let workdir = std::env::current_dir().context("determine current directory")?;
        Ok(Self {
            command: command.to_owned(),
            workdir: workdir.to_string_lossy().into_owned(),
            hostname: local_hostname(),
            user: current_user(),
            exit_code,
            timestamp: Utc::now(),
        })
    }
}

pub(crate) fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

pub(crate) fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}

/// What [`record_line`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// A row was written with this id.
    Added(i64),
    /// The exit code was the "do not log" sentinel.
    Skipped,
    /// The line did not look like `history 1` output.
    Unparsed,
}

/// Record the command found in `line`, unless `exit_code` says not to.
///
/// # Errors
/// Returns an error if the entry cannot be captured or written.
pub fn record_line(store: &Store, line: &str, exit_code: i32) -> anyhow::Result<Recorded> {
    if is_no_log(exit_code) {
        return Ok(Recorded::Skipped);
    }
    let Some(command) = parse_history_line(line) else {
        tracing::debug!(line, "not a history line, nothing recorded");
        return Ok(Recorded::Unparsed);
    };
    let entry = NewEntry::capture(command, exit_code)?;
    let id = store.insert(&entry)?;
    Ok(Recorded::Added(id))
}
