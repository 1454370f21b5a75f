// Configuration - command line flags with environment fallbacks

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const DB_ENV: &str = "EXPENSE_TRACKER_DB";
pub const CURRENCY_ENV: &str = "EXPENSE_TRACKER_CURRENCY";
pub const LOG_ENV: &str = "EXPENSE_TRACKER_LOG";

pub const DEFAULT_CURRENCY: &str = "₹";
const DB_FILE_NAME: &str = "expenses.db";

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Track personal expenses")]
pub struct Cli {
    /// SQLite database file (defaults to the per-user data directory)
    #[arg(long, global = true, env = DB_ENV)]
    pub db: Option<PathBuf>,

    /// Currency symbol used in totals
    #[arg(long, global = true, env = CURRENCY_ENV, default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    /// Write logs to this file (the terminal UI only logs when this is set)
    #[arg(long, global = true, env = LOG_ENV)]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Interactive terminal UI (default)
    Ui,

    /// Record an expense
    Add {
        category: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses with their total
    List {
        /// Start date, YYYY-MM-DD (requires --to)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// End date, YYYY-MM-DD (requires --from)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Minimum amount (requires --max)
        #[arg(long, requires = "max", allow_negative_numbers = true)]
        min: Option<f64>,
        /// Maximum amount (requires --min)
        #[arg(long, requires = "min", allow_negative_numbers = true)]
        max: Option<f64>,
    },

    /// Delete an expense by id
    Delete { id: i64 },

    /// Export every expense to a CSV file
    Export { path: PathBuf },

    /// Print totals per category as a bar chart
    Analyze,
}

/// Resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub currency: String,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            db_path: cli.db.clone().unwrap_or_else(default_db_path),
            currency: cli.currency.clone(),
        }
    }
}

/// `<data dir>/expenses.db`, or the working directory when no home is known
pub fn default_db_path() -> PathBuf {
    ProjectDirs::from("", "", "expense-tracker")
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_ui() {
        let cli = Cli::try_parse_from(["expense-tracker", "--db", "/tmp/x.db"]).unwrap();
        assert!(cli.command.is_none());

        let config = AppConfig::from_cli(&cli);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_add_parses_amount_and_date() {
        let cli = Cli::try_parse_from([
            "expense-tracker",
            "add",
            "Food",
            "12.5",
            "--date",
            "2024-01-15",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Add {
                category: "Food".to_string(),
                amount: 12.5,
                date: Some("2024-01-15".to_string()),
            })
        );
    }

    #[test]
    fn test_list_range_flags_come_in_pairs() {
        assert!(Cli::try_parse_from(["expense-tracker", "list", "--min", "5"]).is_err());
        assert!(Cli::try_parse_from(["expense-tracker", "list", "--from", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from(["expense-tracker", "list", "--min", "5", "--max", "10"]).is_ok());
    }

    #[test]
    fn test_default_db_path_file_name() {
        assert!(default_db_path().ends_with(DB_FILE_NAME));
    }
}
