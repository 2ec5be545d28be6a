// ⚙️ Configuration - command line flags and default file locations

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const APP_DIR: &str = "moneypot";
const DB_FILE: &str = "moneypot.db";
const LOG_FILE: &str = "moneypot.log";

#[derive(Debug, Parser)]
#[command(
    name = "moneypot",
    version,
    about = "Divide your money into different savings goals"
)]
pub struct Cli {
    /// SQLite database holding the saved allocation
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Where log lines are written (the terminal belongs to the UI)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Keep everything in memory; nothing is saved
    #[arg(long)]
    pub ephemeral: bool,

    /// Currency symbol used when printing amounts
    #[arg(long, default_value = "₹")]
    pub currency: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Interactive form (default)
    Tui,

    /// Print the allocation summary
    Show,

    /// Set the total amount to divide
    SetTotal {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Add a savings goal at 0%
    Add { name: String },

    /// Delete a goal by id (or unique id prefix)
    Delete { id: String },

    /// Rename a goal
    Rename { id: String, name: String },

    /// Set a goal's percentage (clamped to 0..=100)
    SetPercent {
        id: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Restore the default goals and erase saved data
    Reset {
        /// Confirm the reset; without it nothing happens
        #[arg(long)]
        yes: bool,
    },
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `None` in ephemeral mode
    pub db_path: Option<PathBuf>,
    pub log_path: PathBuf,
    pub currency: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let data_dir = default_data_dir();

        let db_path = if cli.ephemeral {
            None
        } else {
            Some(cli.db.clone().unwrap_or_else(|| data_dir.join(DB_FILE)))
        };

        Config {
            db_path,
            log_path: cli.log_file.clone().unwrap_or_else(|| data_dir.join(LOG_FILE)),
            currency: cli.currency.clone(),
        }
    }
}

/// `<platform data dir>/moneypot`, or the working directory when there is none
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}
