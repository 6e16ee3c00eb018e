use std::path::{Path, PathBuf};

/// Environment variable that overrides the database location.
pub const DB_PATH_ENV: &str = "HS9001_DB_PATH";

/// Returns the DB path: `HS9001_DB_PATH` overrides; else
/// `$XDG_DATA_HOME/hs9001/db.sqlite` when that directory exists; else
/// `~/.local/share/hs9001/db.sqlite`.
pub fn db_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(DB_PATH_ENV)
        && !p.is_empty()
    {
        return Some(PathBuf::from(p));
    }
    data_dir().map(|d| d.join("hs9001").join("db.sqlite"))
}

fn data_dir() -> Option<PathBuf> {
    let xdg = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from);
    let home = dirs::home_dir();
    data_dir_from(xdg.as_deref(), home.as_deref())
}

/// An `XDG_DATA_HOME` that does not exist is ignored.
fn data_dir_from(xdg: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = xdg
        && !dir.as_os_str().is_empty()
        && dir.is_dir()
    {
        return Some(dir.to_path_buf());
    }
    home.map(|h| h.join(".local").join("share"))
}
