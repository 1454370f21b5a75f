// Expense Tracker - Core Library
// Exposes storage, repository, controller, export and analysis for the binary and tests

pub mod analysis;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod expense;
pub mod export;
pub mod repository;

// Only compile the terminal UI when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use analysis::{analyze, chart_bars, render_text_chart, Analysis};
pub use config::{AppConfig, Cli, Commands};
pub use controller::{ExpenseController, Field, FormState, Notice, NoticeLevel};
pub use db::{setup_database, Database};
pub use error::{ExpenseError, Result};
pub use expense::{Expense, NewExpense, DATE_FORMAT};
pub use export::{export_csv, write_csv, ExportOutcome};
pub use repository::{CategoryTotal, ExpenseFilter, ExpenseList, ExpenseRepository};
