#![allow(clippy::unwrap_used, clippy::expect_used)]

use tempfile::TempDir;

use super::schema::{LEGACY_SCHEMA, MIGRATIONS, latest_version, migrate, prepare, read_version};
use super::tests::make_entry;
use super::*;

fn columns(conn: &Connection) -> Vec<(String, Option<String>)> {
    let mut stmt = conn
        .prepare("SELECT name, dflt_value FROM pragma_table_info('history') ORDER BY cid")
        .expect("prepare");
    stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("collect")
}

fn legacy_db(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("legacy.sqlite");
    let conn = Connection::open(&path).expect("open");
    conn.execute_batch(LEGACY_SCHEMA).expect("legacy schema");
    conn.execute(
        "INSERT INTO history (command, user, hostname, timestamp)
         VALUES ('old cmd', 'bob', 'oldhost', '2020-01-01 10:00:00')",
        [],
    )
    .expect("legacy row");
    path
}

#[test]
fn fresh_store_starts_fully_migrated() {
    let store = Store::open_in_memory().expect("open");
    assert_eq!(store.schema_version().expect("version"), latest_version());
    assert_eq!(latest_version() as usize, MIGRATIONS.len());
}

#[test]
fn fresh_store_has_view() {
    let store = Store::open_in_memory().expect("open");
    let n: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'view' AND name = 'count_by_date'",
            [],
            |r| r.get(0),
        )
        .expect("query");
    assert_eq!(n, 1);
}

#[test]
fn legacy_store_migrates_to_fresh_layout() {
    let dir = TempDir::new().expect("tempdir");
    let path = legacy_db(&dir);

    let store = Store::open(&path).expect("open legacy");
    assert_eq!(store.schema_version().expect("version"), latest_version());

    let fresh = Store::open_in_memory().expect("fresh");
    assert_eq!(columns(store.conn()), columns(fresh.conn()));
}

#[test]
fn legacy_rows_get_column_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let path = legacy_db(&dir);
    let store = Store::open(&path).expect("open legacy");

    let entries = store.search(&SearchCriteria::default()).expect("search");
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert_eq!(e.command, "old cmd");
    assert_eq!(e.user, "bob");
    assert_eq!(e.workdir, "");
    assert_eq!(e.exit_code, EXIT_CODE_UNKNOWN);
    assert_eq!(e.timestamp.timestamp(), 1_577_872_800);
}

#[test]
fn partially_migrated_store_applies_the_rest() {
    let dir = TempDir::new().expect("tempdir");
    let path = legacy_db(&dir);
    {
        let conn = Connection::open(&path).expect("open");
        conn.execute_batch(MIGRATIONS[0]).expect("first migration");
        conn.execute_batch("PRAGMA user_version = 1").expect("version");
    }
    let store = Store::open(&path).expect("open");
    assert_eq!(store.schema_version().expect("version"), latest_version());
    let names: Vec<String> = columns(store.conn()).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names.iter().filter(|n| *n == "workdir").count(), 1);
    assert!(names.contains(&"retval".to_owned()));
}

#[test]
fn reopening_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("db.sqlite");
    let first = Store::open(&path).expect("first");
    first.insert(&make_entry("ls", "/", 0, 1)).expect("insert");
    let before = columns(first.conn());
    drop(first);

    for _ in 0..3 {
        let store = Store::open(&path).expect("reopen");
        assert_eq!(store.schema_version().expect("version"), latest_version());
        assert_eq!(columns(store.conn()), before);
        assert_eq!(store.count().expect("count"), 1);
    }
}

#[test]
fn migrate_at_latest_is_a_no_op() {
    let store = Store::open_in_memory().expect("open");
    let before = columns(store.conn());
    migrate(store.conn(), latest_version()).expect("migrate");
    prepare(store.conn()).expect("prepare");
    assert_eq!(columns(store.conn()), before);
    assert_eq!(read_version(store.conn()).expect("version"), latest_version());
}

#[test]
fn newer_store_is_left_alone() {
    let store = Store::open_in_memory().expect("open");
    store
        .conn()
        .execute_batch("PRAGMA user_version = 99")
        .expect("bump");
    prepare(store.conn()).expect("prepare");
    assert_eq!(read_version(store.conn()).expect("version"), 99);
}

#[test]
fn failed_migration_rolls_back() {
    let dir = TempDir::new().expect("tempdir");
    let path = legacy_db(&dir);
    {
        let conn = Connection::open(&path).expect("open");
        // Second migration will collide with this column.
        conn.execute_batch("ALTER TABLE history ADD COLUMN retval integer")
            .expect("pre-existing column");
    }

    assert!(Store::open(&path).is_err());

    let conn = Connection::open(&path).expect("open");
    assert_eq!(read_version(&conn).expect("version"), 0);
    let names: Vec<String> = columns(&conn).into_iter().map(|(n, _)| n).collect();
    assert!(
        !names.contains(&"workdir".to_owned()),
        "first migration must be rolled back: {names:?}"
    );
}

fn open_concurrently(path: &std::path::Path, n: usize) {
    let barrier = std::sync::Barrier::new(n);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..n)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    Store::open(path).map(|_| ())
                })
            })
            .collect();
        for h in handles {
            h.join().expect("join").expect("concurrent open");
        }
    });
}

#[test]
fn concurrent_opens_of_legacy_store_all_succeed() {
    let dir = TempDir::new().expect("tempdir");
    let path = legacy_db(&dir);
    open_concurrently(&path, 8);

    let store = Store::open(&path).expect("open");
    assert_eq!(store.schema_version().expect("version"), latest_version());
    let fresh = Store::open_in_memory().expect("fresh");
    assert_eq!(columns(store.conn()), columns(fresh.conn()));
    assert_eq!(store.count().expect("count"), 1);
}

#[test]
fn concurrent_opens_of_new_store_all_succeed() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("new.sqlite");
    open_concurrently(&path, 8);

    let store = Store::open(&path).expect("open");
    assert_eq!(store.schema_version().expect("version"), latest_version());
}

#[test]
fn latest_version_counts_migrations() {
    assert_eq!(latest_version(), 2);
}
