pub mod query;
pub mod schema;
pub mod types;

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub use query::{BuiltQuery, SearchCriteria, SortOrder, build_query};
pub use types::{DailyCount, EXIT_CODE_NO_LOG, EXIT_CODE_UNKNOWN, HistoryEntry, NewEntry};

/// Handle to an open history database.
///
/// Every operation goes through an explicit `Store`; nothing is cached
/// between handles, so callers open one per invocation and drop it.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and bring its schema up to date.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the file cannot be
    /// opened, or a migration fails.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open db at {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))
            .context("set busy timeout")?;
        schema::prepare(&conn)?;
        Ok(Self { conn })
    }

    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// # Errors
    /// Returns an error if the version pragma cannot be read.
    pub fn schema_version(&self) -> anyhow::Result<u32> {
        schema::read_version(&self.conn)
    }

    /// Insert one entry and return its new id.
    ///
    /// # Errors
    /// Returns an error if the INSERT fails.
    pub fn insert(&self, entry: &NewEntry) -> anyhow::Result<i64> {
        insert_row(&self.conn, entry)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert all `entries` in a single transaction. Either every row is
    /// written or none is.
    ///
    /// # Errors
    /// Returns an error if any INSERT or the commit fails.
    pub fn bulk_insert(&self, entries: &[NewEntry]) -> anyhow::Result<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin import transaction")?;
        for entry in entries {
            insert_row(&tx, entry)?;
        }
        tx.commit().context("commit import")?;
        Ok(entries.len())
    }

    /// Delete the rows with the given ids in one transaction, then reclaim
    /// free pages. Ids that do not exist are ignored.
    ///
    /// # Errors
    /// Returns an error if a DELETE, the commit, or the VACUUM fails.
    pub fn delete_by_ids(&self, ids: &[i64]) -> anyhow::Result<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin delete transaction")?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM history WHERE id = ?1")?;
            for id in ids {
                removed += stmt
                    .execute([id])
                    .with_context(|| format!("delete history entry {id}"))?;
            }
        }
        tx.commit().context("commit delete")?;
        self.conn.execute_batch("VACUUM").context("vacuum")?;
        Ok(removed)
    }

    /// Run the query built from `criteria`.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn search(&self, criteria: &SearchCriteria) -> anyhow::Result<Vec<HistoryEntry>> {
        let BuiltQuery { sql, args } = build_query(criteria);
        tracing::debug!(%sql, args = args.len(), "history query");

        let mut stmt = self.conn.prepare(&sql).context("prepare history query")?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), map_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row.context("read history row")?);
        }
        Ok(result)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub fn count(&self) -> anyhow::Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM history", [], |r| r.get(0))
            .context("count history")
    }

    /// Entry counts per calendar day, oldest day first.
    ///
    /// # Errors
    /// Returns an error if the view cannot be read.
    pub fn count_by_date(&self) -> anyhow::Result<Vec<DailyCount>> {
        let mut stmt = self.conn.prepare("SELECT * FROM count_by_date ORDER BY 2 ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(DailyCount {
                count: row.get(0)?,
                day: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row.context("read daily count")?);
        }
        Ok(result)
    }
}

fn insert_row(conn: &Connection, entry: &NewEntry) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO history (user, command, hostname, workdir, timestamp, retval)
         VALUES (?1, ?2, ?3, ?4, datetime(?5, 'unixepoch'), ?6)",
        rusqlite::params![
            entry.user,
            entry.command,
            entry.hostname,
            entry.workdir,
            entry.timestamp.timestamp(),
            entry.exit_code,
        ],
    )
    .context("insert history entry")?;
    Ok(())
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let secs: i64 = row.get(6)?;
    let timestamp = DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Integer,
            format!("timestamp {secs} out of range").into(),
        )
    })?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        command: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        workdir: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        user: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        hostname: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        exit_code: row.get::<_, Option<i32>>(5)?.unwrap_or(EXIT_CODE_UNKNOWN),
        timestamp,
    })
}


#[cfg(test)]
mod tests_query;

#[cfg(test)]
mod tests_schema;
