//! Backend for interactive reverse search.
//!
//! A line editor calls [`HistoryProvider`] on every keystroke. Each call opens
//! the database, runs one query and closes it again; nothing is kept between
//! calls. There is no degraded mode: if the store cannot be read the process
//! reports the error and exits.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::history::{HistoryEntry, SearchCriteria, SortOrder, Store};

/// Default number of matches returned per lookup.
pub const DEFAULT_LIMIT: u32 = 100;

/// Which entries a lookup considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every entry, wherever it was recorded.
    Global,
    /// Only entries recorded in the current working directory.
    CurrentDir,
}

/// A command matched by [`HistoryProvider::history_by_pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub command: String,
    /// Character offset of the first case-insensitive occurrence of the
    /// pattern, for highlighting. `None` when the match came from a `LIKE`
    /// wildcard in the pattern rather than its literal text.
    pub offset: Option<usize>,
}

/// Lookups a line editor needs for reverse search. Results are newest first.
pub trait HistoryProvider {
    fn history_by_prefix(&self, prefix: &str, scope: Scope) -> Vec<String>;
    fn history_by_pattern(&self, pattern: &str, scope: Scope) -> Vec<PatternMatch>;
}

/// [`HistoryProvider`] backed by the database at `db_path`.
#[derive(Debug, Clone)]
pub struct HistoryLookup {
    db_path: PathBuf,
    workdir: Option<PathBuf>,
    limit: u32,
}

impl HistoryLookup {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            workdir: None,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Use `dir` as the current directory instead of asking the process.
    #[must_use]
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Commands starting with `prefix`, newest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or queried, or the
    /// current directory cannot be determined.
    pub fn prefix_matches(&self, prefix: &str, scope: Scope) -> anyhow::Result<Vec<String>> {
        let entries = self.query(format!("{prefix}%"), scope)?;
        Ok(entries.into_iter().map(|e| e.command).collect())
    }

    /// Commands containing `pattern` (case-insensitive), newest first.
    ///
    /// # Errors
    /// Same as [`Self::prefix_matches`].
    pub fn pattern_matches(
        &self,
        pattern: &str,
        scope: Scope,
    ) -> anyhow::Result<Vec<PatternMatch>> {
        let entries = self.query(format!("%{pattern}%"), scope)?;
        Ok(entries
            .into_iter()
            .map(|e| PatternMatch {
                offset: match_offset(&e.command, pattern),
                command: e.command,
            })
            .collect())
    }

    fn query(&self, command: String, scope: Scope) -> anyhow::Result<Vec<HistoryEntry>> {
        let directory = match scope {
            Scope::Global => None,
            Scope::CurrentDir => Some(self.resolve_workdir()?),
        };
        let criteria = SearchCriteria {
            command: Some(command),
            directory,
            order: Some(SortOrder::Desc),
            limit: Some(self.limit),
            ..SearchCriteria::default()
        };
        let store = Store::open(&self.db_path)?;
        store.search(&criteria)
    }

    fn resolve_workdir(&self) -> anyhow::Result<String> {
        let dir = match self.workdir {
            Some(ref dir) => std::path::absolute(dir)
                .with_context(|| format!("resolve {}", dir.display()))?,
            None => std::env::current_dir().context("determine current directory")?,
        };
        Ok(dir.to_string_lossy().into_owned())
    }
}

impl HistoryProvider for HistoryLookup {
    fn history_by_prefix(&self, prefix: &str, scope: Scope) -> Vec<String> {
        self.prefix_matches(prefix, scope).unwrap_or_else(|e| fatal(&e))
    }

    fn history_by_pattern(&self, pattern: &str, scope: Scope) -> Vec<PatternMatch> {
        self.pattern_matches(pattern, scope).unwrap_or_else(|e| fatal(&e))
    }
}

fn fatal(e: &anyhow::Error) -> ! {
    eprintln!("[hs9001] error: history lookup failed: {e:#}");
    std::process::exit(1)
}

/// Character offset of the first case-insensitive occurrence of `needle`.
pub fn match_offset(haystack: &str, needle: &str) -> Option<usize> {
    let fold = |c: char| c.to_lowercase().next().unwrap_or(c);
    let hay: Vec<char> = haystack.chars().map(fold).collect();
    let pat: Vec<char> = needle.chars().map(fold).collect();
    if pat.is_empty() {
        return Some(0);
    }
    hay.windows(pat.len()).position(|w| w == pat.as_slice())
}
