mod history_cmd;

use clap::{Parser, Subcommand};

use hs9001::config::Settings;
use hs9001::{logging, shell};

use history_cmd::SearchArgs;

#[derive(Parser)]
#[command(
    name = "hs9001",
    version,
    about = "Shell history in SQLite, searchable by text, directory, time and exit code"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one command (called from PROMPT_COMMAND with the output of `history 1`)
    Add {
        /// Exit code of the command; 23 means "do not record"
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        ret: i32,
        /// A line as printed by `history 1`
        line: Option<String>,
    },
    /// List matching commands
    Search(SearchArgs),
    /// List matching commands and delete them
    Delete(SearchArgs),
    /// Import a plain history file from stdin, one command per line
    Import,
    /// Reverse-search lookup, newest first
    Lookup {
        /// Match at the start of the command instead of anywhere
        #[arg(long)]
        prefix: bool,
        /// Only commands run in the current directory
        #[arg(long)]
        cwd: bool,
        /// Text to look up
        text: String,
    },
    /// Number of recorded commands per day
    Stats,
    /// Print version information
    Version,
    /// Print the bash snippet that enables recording
    BashEnable,
    /// Print the bash snippet that disables recording
    BashDisable,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let settings = Settings::load();

    let exit_code = match &cli.command {
        Commands::Add { ret, line } => history_cmd::cmd_add(*ret, line.as_deref()),
        Commands::Search(args) => history_cmd::cmd_search(args, &settings),
        Commands::Delete(args) => history_cmd::cmd_delete(args, &settings),
        Commands::Import => history_cmd::cmd_import(),
        Commands::Lookup { prefix, cwd, text } => {
            history_cmd::cmd_lookup(text, *prefix, *cwd, &settings)
        }
        Commands::Stats => history_cmd::cmd_stats(),
        Commands::Version => {
            println!("hs9001 {}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::BashEnable => {
            print!("{}", shell::bash_enable("hs9001"));
            0
        }
        Commands::BashDisable => {
            print!("{}", shell::bash_disable());
            0
        }
    };
    std::process::exit(exit_code);
}
