//! Table definitions and the migration list.
//!
//! The schema version lives in `PRAGMA user_version` and counts how many
//! entries of [`MIGRATIONS`] have been applied. Migrations only ever add
//! columns, so the version never goes down.

use anyhow::Context as _;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Schema of the very first release. Stores created by it sit at version 0
/// and reach the current layout through [`MIGRATIONS`].
#[cfg(test)]
pub(super) const LEGACY_SCHEMA: &str = "
    CREATE TABLE history (
        id        INTEGER PRIMARY KEY,
        command   varchar(512),
        timestamp datetime DEFAULT current_timestamp,
        user      varchar(25),
        hostname  varchar(32)
    );
    CREATE VIEW count_by_date AS
        SELECT COUNT(id), strftime('%Y-%m-%d', timestamp)
        FROM history
        GROUP BY strftime('%Y-%m-%d', timestamp);";

/// Current layout, used for fresh stores. Must equal [`LEGACY_SCHEMA`] with
/// every migration applied.
const SCHEMA: &str = "
    CREATE TABLE history (
        id        INTEGER PRIMARY KEY,
        command   varchar(512),
        timestamp datetime DEFAULT current_timestamp,
        user      varchar(25),
        hostname  varchar(32),
        workdir   varchar(4096) DEFAULT '',
        retval    integer DEFAULT -9001
    );
    CREATE VIEW count_by_date AS
        SELECT COUNT(id), strftime('%Y-%m-%d', timestamp)
        FROM history
        GROUP BY strftime('%Y-%m-%d', timestamp);";

/// Additive schema changes, in the order they shipped.
pub(super) const MIGRATIONS: &[&str] = &[
    "ALTER TABLE history ADD COLUMN workdir varchar(4096) DEFAULT ''",
    "ALTER TABLE history ADD COLUMN retval integer DEFAULT -9001",
];

/// Version a fully migrated store reports.
pub fn latest_version() -> u32 {
    u32::try_from(MIGRATIONS.len()).unwrap_or(u32::MAX)
}

/// Create the schema on a fresh database or bring an existing one up to date.
///
/// Changes run under an immediate transaction. The table and version are
/// re-read once the write lock is held.
///
/// # Errors
/// Returns an error if any DDL statement fails. A failed migration leaves the
/// database as it was.
pub fn prepare(conn: &Connection) -> anyhow::Result<()> {
    if history_table_exists(conn)? {
        let current = read_version(conn)?;
        if current >= latest_version() {
            return apply_migrations(conn, current);
        }
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .context("begin schema transaction")?;
    if history_table_exists(&tx)? {
        let current = read_version(&tx)?;
        apply_migrations(&tx, current)?;
    } else {
        tx.execute_batch(SCHEMA).context("create history schema")?;
        write_version(&tx, latest_version())?;
        tracing::debug!(version = latest_version(), "created history schema");
    }
    tx.commit().context("commit schema")?;
    Ok(())
}

fn history_table_exists(conn: &Connection) -> anyhow::Result<bool> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'history'",
            [],
            |r| r.get(0),
        )
        .context("inspect sqlite_master")?;
    Ok(n > 0)
}

/// Apply every migration at index `current` and above in one transaction.
///
/// # Errors
/// Returns an error if a migration statement or the version update fails.
pub fn migrate(conn: &Connection, current: u32) -> anyhow::Result<()> {
    if current >= latest_version() {
        return apply_migrations(conn, current);
    }
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .context("begin migration transaction")?;
    apply_migrations(&tx, current)?;
    tx.commit().context("commit migrations")?;
    Ok(())
}

fn apply_migrations(conn: &Connection, current: u32) -> anyhow::Result<()> {
    let target = latest_version();
    if current >= target {
        if current > target {
            tracing::debug!(current, target, "store is newer than this binary");
        }
        return Ok(());
    }
    for (idx, stmt) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        conn.execute_batch(stmt)
            .with_context(|| format!("apply migration {}", idx + 1))?;
        tracing::debug!(migration = idx + 1, "applied migration");
    }
    write_version(conn, target)
}

/// Read the persisted schema version.
///
/// # Errors
/// Returns an error if the pragma cannot be read.
pub fn read_version(conn: &Connection) -> anyhow::Result<u32> {
    let v: i64 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .context("read schema version")?;
    u32::try_from(v).with_context(|| format!("invalid schema version {v}"))
}

fn write_version(conn: &Connection, version: u32) -> anyhow::Result<()> {
    // PRAGMA does not take bound parameters; `version` is an integer we own.
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))
        .context("write schema version")
}
