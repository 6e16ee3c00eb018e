pub mod config;
pub mod history;
pub mod import;
pub mod logging;
pub mod lookup;
pub mod paths;
pub mod record;
pub mod search;
pub mod shell;
pub mod timespec;
