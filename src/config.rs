//! User settings.
//!
//! Read from `{config_dir}/hs9001/config.toml` (e.g. `~/.config/hs9001/config.toml`):
//!
//! ```toml
//! [lookup]
//! limit = 100
//!
//! [search]
//! distinct = true
//! ```
//!
//! A missing or unreadable file means defaults. `HS9001_LOOKUP_LIMIT`
//! overrides the file.

use std::path::{Path, PathBuf};

use crate::lookup::DEFAULT_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Maximum matches returned by an interactive lookup.
    pub lookup_limit: u32,
    /// Whether `search` collapses consecutive duplicates by default.
    pub distinct: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookup_limit: DEFAULT_LIMIT,
            distinct: true,
        }
    }
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    lookup: Option<LookupSection>,
    search: Option<SearchSection>,
}

#[derive(serde::Deserialize)]
struct LookupSection {
    limit: Option<u32>,
}

#[derive(serde::Deserialize)]
struct SearchSection {
    distinct: Option<bool>,
}

fn read_config(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            tracing::debug!("ignoring {}: {e}", path.display());
            None
        }
    }
}

/// Default location of the settings file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hs9001").join("config.toml"))
}

impl Settings {
    /// Load settings from the default location and the environment.
    pub fn load() -> Self {
        let path = config_path();
        let mut settings = Self::load_from(path.as_deref());
        if let Some(limit) = std::env::var("HS9001_LOOKUP_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            settings.lookup_limit = limit;
        }
        settings
    }

    /// Load settings from an explicit file. Useful for testing.
    pub fn load_from(path: Option<&Path>) -> Self {
        let defaults = Self::default();
        let Some(file) = path.and_then(read_config) else {
            return defaults;
        };
        Self {
            lookup_limit: file
                .lookup
                .and_then(|l| l.limit)
                .unwrap_or(defaults.lookup_limit),
            distinct: file
                .search
                .and_then(|s| s.distinct)
                .unwrap_or(defaults.distinct),
        }
    }
}
