#![allow(clippy::unwrap_used, clippy::expect_used)]

use rusqlite::types::Value;

use super::*;

const SELECT: &str = "SELECT id, command, workdir, user, hostname, retval, \
                      CAST(strftime('%s', timestamp) AS INTEGER) FROM history WHERE 1=1";

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).expect("ts")
}

#[test]
fn empty_criteria_selects_everything_ascending() {
    let q = build_query(&SearchCriteria::default());
    assert_eq!(q.sql, format!("{SELECT} ORDER BY timestamp ASC, id ASC"));
    assert!(q.args.is_empty());
}

#[test]
fn clauses_follow_fixed_order() {
    let criteria = SearchCriteria {
        command: Some("%git%".to_owned()),
        workdir: Some("/repo%".to_owned()),
        directory: Some("/repo/sub".to_owned()),
        after: Some(ts(100)),
        before: Some(ts(200)),
        exit_code: Some(1),
        order: Some(SortOrder::Desc),
        limit: Some(10),
    };
    let q = build_query(&criteria);
    assert_eq!(
        q.sql,
        format!(
            "{SELECT} AND command LIKE ? AND workdir LIKE ? AND workdir = ? \
             AND timestamp > datetime(?, 'unixepoch') \
             AND timestamp < datetime(?, 'unixepoch') \
             AND retval = ? ORDER BY timestamp DESC, id DESC LIMIT ?"
        )
    );
    assert_eq!(
        q.args,
        vec![
            Value::Text("%git%".to_owned()),
            Value::Text("/repo%".to_owned()),
            Value::Text("/repo/sub".to_owned()),
            Value::Integer(100),
            Value::Integer(200),
            Value::Integer(1),
            Value::Integer(10),
        ]
    );
}

#[test]
fn one_placeholder_per_argument() {
    let combos = [
        SearchCriteria::default(),
        SearchCriteria::containing("x"),
        SearchCriteria {
            before: Some(ts(5)),
            limit: Some(3),
            ..SearchCriteria::default()
        },
        SearchCriteria {
            workdir: Some("/a".to_owned()),
            exit_code: Some(0),
            ..SearchCriteria::default()
        },
        SearchCriteria {
            directory: Some("/a".to_owned()),
            limit: Some(1),
            ..SearchCriteria::default()
        },
    ];
    for criteria in &combos {
        let q = build_query(criteria);
        assert_eq!(
            q.sql.matches('?').count(),
            q.args.len(),
            "mismatch for {criteria:?}: {}",
            q.sql
        );
    }
}

#[test]
fn only_present_filters_add_clauses() {
    let criteria = SearchCriteria {
        exit_code: Some(0),
        ..SearchCriteria::default()
    };
    let q = build_query(&criteria);
    assert!(q.sql.contains("AND retval = ?"));
    assert!(!q.sql.contains("command LIKE"));
    assert!(!q.sql.contains("LIMIT"));
    assert_eq!(q.args, vec![Value::Integer(0)]);
}

#[test]
fn values_never_reach_sql_text() {
    let hostile = "'; DROP TABLE history; --";
    let criteria = SearchCriteria {
        command: Some(hostile.to_owned()),
        workdir: Some(hostile.to_owned()),
        ..SearchCriteria::default()
    };
    let q = build_query(&criteria);
    assert!(!q.sql.contains("DROP"));
    assert_eq!(q.args.len(), 2);
}

#[test]
fn hostile_pattern_is_harmless_at_runtime() {
    let store = Store::open_in_memory().expect("open");
    store
        .insert(&tests::make_entry("ls", "/", 0, 1))
        .expect("insert");
    let got = store
        .search(&SearchCriteria {
            command: Some("'; DROP TABLE history; --".to_owned()),
            ..SearchCriteria::default()
        })
        .expect("search");
    assert!(got.is_empty());
    assert_eq!(store.count().expect("count"), 1);
}

#[test]
fn builder_is_deterministic() {
    let criteria = SearchCriteria {
        command: Some("a%".to_owned()),
        after: Some(ts(1)),
        ..SearchCriteria::default()
    };
    assert_eq!(build_query(&criteria), build_query(&criteria));
}

#[test]
fn directory_is_an_exact_match() {
    let store = Store::open_in_memory().expect("open");
    for dir in ["/a", "/A", "/x_y", "/xzy", "/a/b"] {
        store
            .insert(&tests::make_entry(&format!("in {dir}"), dir, 0, 1))
            .expect("insert");
    }
    let only = |dir: &str| -> Vec<String> {
        store
            .search(&SearchCriteria {
                directory: Some(dir.to_owned()),
                ..SearchCriteria::default()
            })
            .expect("search")
            .into_iter()
            .map(|e| e.workdir)
            .collect()
    };
    assert_eq!(only("/a"), vec!["/a"]);
    assert_eq!(only("/x_y"), vec!["/x_y"]);
    assert!(only("/%").is_empty());
}

#[test]
fn pattern_is_passed_raw() {
    let q = build_query(&SearchCriteria {
        command: Some("git".to_owned()),
        ..SearchCriteria::default()
    });
    assert_eq!(q.args, vec![Value::Text("git".to_owned())]);
}
