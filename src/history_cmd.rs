use std::io::IsTerminal as _;
use std::path::PathBuf;

use hs9001::config::Settings;
use hs9001::history::{EXIT_CODE_UNKNOWN, HistoryEntry, SearchCriteria, SortOrder, Store};
use hs9001::lookup::{HistoryLookup, HistoryProvider as _, Scope};
use hs9001::record::{self, Recorded};
use hs9001::search::{self, dedup_adjacent};
use hs9001::shell::SEARCH_EXIT_STATUS;
use hs9001::{import, paths, timespec};

const RED: &str = "\x1b[38;5;88m";
const RESET: &str = "\x1b[0m";

/// Filters shared by `search` and `delete`.
#[derive(clap::Args)]
pub struct SearchArgs {
    /// Text the command must contain (words are joined with spaces)
    query: Vec<String>,
    /// Only commands run in this directory
    #[arg(long)]
    cwd: Option<String>,
    /// Only commands run after this time (e.g. 2024-03-01, "2024-03-01 12:00")
    #[arg(long)]
    after: Option<String>,
    /// Only commands run before this time
    #[arg(long)]
    before: Option<String>,
    /// Only today's commands; overrides --after
    #[arg(long)]
    today: bool,
    /// Collapse consecutive duplicate commands (default from config, else true)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    distinct: Option<bool>,
    /// Only commands that exited with this code (-9001 = any)
    #[arg(long, default_value_t = EXIT_CODE_UNKNOWN, allow_negative_numbers = true)]
    ret: i32,
    /// Only the N most recent matches
    #[arg(long)]
    limit: Option<u32>,
    /// Print one JSON object per entry
    #[arg(long)]
    json: bool,
}

fn db_path() -> Option<PathBuf> {
    let path = paths::db_path();
    if path.is_none() {
        eprintln!("[hs9001] error: cannot determine history DB path");
    }
    path
}

fn open_store() -> Option<Store> {
    let path = db_path()?;
    match Store::open(&path) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("[hs9001] error opening DB: {e:#}");
            None
        }
    }
}

/// Parse a time bound; a bad value only drops that filter.
fn parse_bound(flag: &str, value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    match timespec::parse_time(value) {
        Ok(t) => Some(t),
        Err(e) => {
            eprintln!("[hs9001] warning: ignoring {flag}: {e:#}");
            None
        }
    }
}

pub fn build_criteria(args: &SearchArgs) -> SearchCriteria {
    let mut criteria = SearchCriteria::default();

    let query = args.query.join(" ");
    if !query.is_empty() {
        criteria.command = Some(format!("%{query}%"));
    }

    if let Some(ref dir) = args.cwd {
        match std::path::absolute(dir) {
            Ok(abs) => criteria.directory = Some(abs.to_string_lossy().into_owned()),
            Err(e) => eprintln!("[hs9001] warning: ignoring --cwd {dir}: {e}"),
        }
    }

    let after = if args.today {
        Some("today")
    } else {
        args.after.as_deref()
    };
    criteria.after = after.and_then(|t| parse_bound("--after", t));
    criteria.before = args.before.as_deref().and_then(|t| parse_bound("--before", t));

    if args.ret != EXIT_CODE_UNKNOWN {
        criteria.exit_code = Some(args.ret);
    }

    // With a limit we want the newest matches; they are shown oldest first.
    criteria.order = Some(if args.limit.is_some() {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    });
    criteria.limit = args.limit;
    criteria
}

fn chronological(mut entries: Vec<HistoryEntry>, criteria: &SearchCriteria) -> Vec<HistoryEntry> {
    if criteria.order == Some(SortOrder::Desc) {
        entries.reverse();
    }
    entries
}

fn print_entries(entries: &[HistoryEntry], json: bool) {
    let color = std::io::stdout().is_terminal();
    for entry in entries {
        if json {
            match serde_json::to_string(entry) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("[hs9001] error encoding entry {}: {e}", entry.id),
            }
        } else if color && entry.exit_code != 0 && entry.exit_code != EXIT_CODE_UNKNOWN {
            println!("{RED}{}{RESET}", entry.command);
        } else {
            println!("{}", entry.command);
        }
    }
}

pub fn cmd_add(ret: i32, line: Option<&str>) -> i32 {
    if record::is_no_log(ret) {
        return 0;
    }
    let Some(line) = line else {
        eprintln!("[hs9001] error: you need to provide the command to be added");
        return 1;
    };
    let Some(store) = open_store() else {
        return 1;
    };
    match record::record_line(&store, line, ret) {
        Ok(Recorded::Added(id)) => {
            tracing::debug!(id, "recorded command");
            0
        }
        Ok(Recorded::Skipped | Recorded::Unparsed) => 0,
        Err(e) => {
            eprintln!("[hs9001] error recording command: {e:#}");
            1
        }
    }
}

pub fn cmd_search(args: &SearchArgs, settings: &Settings) -> i32 {
    let Some(store) = open_store() else {
        return 1;
    };
    let criteria = build_criteria(args);
    let distinct = args.distinct.unwrap_or(settings.distinct);

    let entries = match search::run_search(&store, &criteria, distinct) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("[hs9001] error searching history: {e:#}");
            return 1;
        }
    };
    print_entries(&chronological(entries, &criteria), args.json);
    SEARCH_EXIT_STATUS
}

pub fn cmd_delete(args: &SearchArgs, settings: &Settings) -> i32 {
    let Some(store) = open_store() else {
        return 1;
    };
    let criteria = build_criteria(args);
    let distinct = args.distinct.unwrap_or(settings.distinct);

    let deletion = match search::run_delete(&store, &criteria) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("[hs9001] error deleting history: {e:#}");
            return 1;
        }
    };
    let removed = deletion.count();
    let mut shown = chronological(deletion.entries, &criteria);
    if distinct {
        shown = dedup_adjacent(shown);
    }
    print_entries(&shown, args.json);
    eprintln!("[hs9001] deleted {removed} entries");
    SEARCH_EXIT_STATUS
}

pub fn cmd_import() -> i32 {
    let Some(store) = open_store() else {
        return 1;
    };
    match import::import(&store, std::io::stdin().lock()) {
        Ok(n) => {
            eprintln!("[hs9001] imported {n} entries");
            0
        }
        Err(e) => {
            eprintln!("[hs9001] error importing history: {e:#}");
            1
        }
    }
}

pub fn cmd_lookup(text: &str, prefix: bool, cwd_only: bool, settings: &Settings) -> i32 {
    let Some(path) = db_path() else {
        return 1;
    };
    let lookup = HistoryLookup::new(path).with_limit(settings.lookup_limit);
    let scope = if cwd_only {
        Scope::CurrentDir
    } else {
        Scope::Global
    };

    if prefix {
        for command in lookup.history_by_prefix(text, scope) {
            println!("{command}");
        }
    } else {
        for m in lookup.history_by_pattern(text, scope) {
            let offset = m.offset.map_or_else(|| "-".to_string(), |o| o.to_string());
            println!("{offset}\t{}", m.command);
        }
    }
    0
}

pub fn cmd_stats() -> i32 {
    let Some(store) = open_store() else {
        return 1;
    };
    let days = match store.count_by_date() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("[hs9001] error reading stats: {e:#}");
            return 1;
        }
    };
    if days.is_empty() {
        eprintln!("[hs9001] no history entries found");
        return 0;
    }
    for day in days {
        println!("{}  {}", day.day, day.count);
    }
    0
}
