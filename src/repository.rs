// Expense Repository - domain operations on top of the storage gateway

use crate::db::Database;
use crate::error::{ExpenseError, Result};
use crate::expense::{Expense, NewExpense};
use rusqlite::{params, Row};
use tracing::{info, warn};

// ============================================================================
// FILTERS & RESULTS
// ============================================================================

/// Narrowing predicate for `list`. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExpenseFilter {
    #[default]
    None,
    /// `YYYY-MM-DD` strings, compared lexically
    DateRange { start: String, end: String },
    AmountRange { min: f64, max: f64 },
}

impl ExpenseFilter {
    pub fn is_active(&self) -> bool {
        !matches!(self, ExpenseFilter::None)
    }

    pub fn describe(&self) -> String {
        match self {
            ExpenseFilter::None => "All expenses".to_string(),
            ExpenseFilter::DateRange { start, end } => format!("Date {} → {}", start, end),
            ExpenseFilter::AmountRange { min, max } => format!("Amount {:.2} → {:.2}", min, max),
        }
    }
}

/// Rows returned by a list call plus the sum of their amounts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseList {
    pub expenses: Vec<Expense>,
    pub total: f64,
}

impl ExpenseList {
    pub fn new(expenses: Vec<Expense>) -> Self {
        let total = expenses.iter().map(|e| e.amount).sum();
        Self { expenses, total }
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

/// Sum of amounts for one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

// ============================================================================
// REPOSITORY
// ============================================================================

pub struct ExpenseRepository {
    db: Database,
}

impl ExpenseRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate and insert a new expense, returning it with its assigned id
    pub fn add(&self, input: &NewExpense) -> Result<Expense> {
        let valid = input.validate()?;

        self.db.execute(
            "INSERT INTO expenses (category, amount, date) VALUES (?1, ?2, ?3)",
            params![valid.category, valid.amount, valid.date],
        )?;
        let id = self.db.last_insert_rowid();

        info!(id, category = %valid.category, amount = valid.amount, "expense added");

        Ok(Expense {
            id,
            category: valid.category,
            amount: valid.amount,
            date: valid.date,
        })
    }

    /// List expenses matching `filter` in insertion order, with their total
    pub fn list(&self, filter: &ExpenseFilter) -> Result<ExpenseList> {
        let expenses = match filter {
            ExpenseFilter::None => self.db.query(
                "SELECT id, category, amount, date FROM expenses ORDER BY id",
                [],
                map_expense,
            )?,
            ExpenseFilter::DateRange { start, end } => self.db.query(
                "SELECT id, category, amount, date FROM expenses
                 WHERE date BETWEEN ?1 AND ?2
                 ORDER BY id",
                params![start, end],
                map_expense,
            )?,
            ExpenseFilter::AmountRange { min, max } => self.db.query(
                "SELECT id, category, amount, date FROM expenses
                 WHERE amount BETWEEN ?1 AND ?2
                 ORDER BY id",
                params![min, max],
                map_expense,
            )?,
        };

        Ok(ExpenseList::new(expenses))
    }

    pub fn list_all(&self) -> Result<ExpenseList> {
        self.list(&ExpenseFilter::None)
    }

    /// Delete by id. A missing id is reported as `NotFound` and changes nothing.
    pub fn delete(&self, id: i64) -> Result<()> {
        let affected = self.db.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;

        if affected == 0 {
            warn!(id, "delete of unknown expense");
            return Err(ExpenseError::NotFound(id));
        }

        info!(id, "expense deleted");
        Ok(())
    }

    /// Total amount per category, in grouping order
    pub fn aggregate_by_category(&self) -> Result<Vec<CategoryTotal>> {
        self.db.query(
            "SELECT category, SUM(amount) FROM expenses GROUP BY category",
            [],
            |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )
    }

    pub fn count(&self) -> Result<i64> {
        let counts: Vec<i64> = self
            .db
            .query("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(counts.first().copied().unwrap_or(0))
    }
}

fn map_expense(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        category: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
    })
}
