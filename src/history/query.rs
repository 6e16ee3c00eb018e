//! Turns a set of optional filters into one parameterized `SELECT`.
//!
//! Clauses are appended in a fixed order and every value travels as a bound
//! argument, so the same combination of filters always yields the same SQL
//! text.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

/// Direction of the `timestamp` ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Optional filters for a history query. `None` means "no constraint".
///
/// Pattern filters are matched with `LIKE` and passed through untouched:
/// add `%` yourself for prefix or substring semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub command: Option<String>,
    pub workdir: Option<String>,
    /// Exact directory, compared byte for byte (no wildcards, case-sensitive).
    pub directory: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub order: Option<SortOrder>,
    pub limit: Option<u32>,
}

impl SearchCriteria {
    /// Match commands containing `text` anywhere.
    pub fn containing(text: &str) -> Self {
        Self {
            command: Some(format!("%{text}%")),
            ..Self::default()
        }
    }
}

/// SQL text plus the arguments for its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

const BASE: &str = "SELECT id, command, workdir, user, hostname, retval, \
                    CAST(strftime('%s', timestamp) AS INTEGER) \
                    FROM history WHERE 1=1";

/// Build the query for `criteria`.
pub fn build_query(criteria: &SearchCriteria) -> BuiltQuery {
    let mut sql = String::from(BASE);
    let mut args: Vec<Value> = Vec::new();

    if let Some(ref pattern) = criteria.command {
        sql.push_str(" AND command LIKE ?");
        args.push(Value::Text(pattern.clone()));
    }
    if let Some(ref pattern) = criteria.workdir {
        sql.push_str(" AND workdir LIKE ?");
        args.push(Value::Text(pattern.clone()));
    }
    if let Some(ref dir) = criteria.directory {
        sql.push_str(" AND workdir = ?");
        args.push(Value::Text(dir.clone()));
    }
    if let Some(after) = criteria.after {
        sql.push_str(" AND timestamp > datetime(?, 'unixepoch')");
        args.push(Value::Integer(after.timestamp()));
    }
    if let Some(before) = criteria.before {
        sql.push_str(" AND timestamp < datetime(?, 'unixepoch')");
        args.push(Value::Integer(before.timestamp()));
    }
    if let Some(code) = criteria.exit_code {
        sql.push_str(" AND retval = ?");
        args.push(Value::Integer(i64::from(code)));
    }

    // `id` orders rows recorded within the same second.
    let dir = criteria.order.unwrap_or_default().keyword();
    sql.push_str(&format!(" ORDER BY timestamp {dir}, id {dir}"));

    if let Some(limit) = criteria.limit {
        sql.push_str(" LIMIT ?");
        args.push(Value::Integer(i64::from(limit)));
    }

    BuiltQuery { sql, args }
}
