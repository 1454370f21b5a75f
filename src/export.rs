// CSV Exporter - writes every stored expense to a flat file

use crate::error::Result;
use crate::expense::Expense;
use crate::repository::ExpenseRepository;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default file name offered by the destination prompt
pub const DEFAULT_EXPORT_FILE: &str = "expenses.csv";

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// Table was empty, no file was touched
    NothingToExport,
    Exported { path: PathBuf, rows: usize },
}

impl ExportOutcome {
    pub fn message(&self) -> String {
        match self {
            ExportOutcome::NothingToExport => "No expenses to export.".to_string(),
            ExportOutcome::Exported { path, .. } => {
                format!("Data exported successfully to {}", path.display())
            }
        }
    }
}

/// Export all expenses, unfiltered, to `path`
pub fn export_csv(repo: &ExpenseRepository, path: &Path) -> Result<ExportOutcome> {
    let list = repo.list_all()?;
    if list.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }

    let file = std::fs::File::create(path)?;
    let rows = write_csv(file, &list.expenses)?;

    info!(path = %path.display(), rows, "expenses exported");
    Ok(ExportOutcome::Exported {
        path: path.to_path_buf(),
        rows,
    })
}

/// Header `ID,Category,Amount,Date` followed by one line per expense.
/// The header comes from the first record, so an empty slice writes nothing.
pub fn write_csv<W: Write>(writer: W, expenses: &[Expense]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    for expense in expenses {
        wtr.serialize(expense)?;
    }
    wtr.flush()?;

    Ok(expenses.len())
}
