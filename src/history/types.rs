use chrono::{DateTime, Utc};
use serde::Serialize;

/// Exit code stored when the real status of a command is not known
/// (e.g. entries brought in by `import`).
pub const EXIT_CODE_UNKNOWN: i32 = -9001;

/// Exit code the shell hook passes to say "do not record this invocation".
pub const EXIT_CODE_NO_LOG: i32 = 23;

/// A persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub command: String,
    pub workdir: String,
    pub hostname: String,
    pub user: String,
    pub exit_code: i32,
    pub timestamp: DateTime<Utc>,
}

/// An entry that has not been written yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub command: String,
    pub workdir: String,
    pub hostname: String,
    pub user: String,
    pub exit_code: i32,
    pub timestamp: DateTime<Utc>,
}

/// One row of the `count_by_date` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub day: String,
    pub count: i64,
}
