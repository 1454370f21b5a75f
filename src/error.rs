// Error taxonomy for the expense tracker
// Connection errors are fatal, everything else is shown to the user and recovered from.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpenseError {
    /// The database could not be opened or its schema could not be created
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Form input rejected before touching storage
    #[error("{0}")]
    Validation(String),

    /// A statement failed against an open connection
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filter input that could not be parsed
    #[error("{0}")]
    Parse(String),

    #[error("Expense not found: {0}")]
    NotFound(i64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ExpenseError {
    /// Title used when the error is shown in a modal
    pub fn title(&self) -> &'static str {
        match self {
            ExpenseError::Connection(_) => "Database Error",
            ExpenseError::Validation(_) | ExpenseError::Parse(_) => "Input Error",
            ExpenseError::NotFound(_) => "Selection Error",
            ExpenseError::Storage(_) | ExpenseError::Io(_) | ExpenseError::Csv(_) => "Error",
        }
    }

    /// Whether the application can keep running after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExpenseError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, ExpenseError>;
