// Expense entity and input validation

use crate::error::{ExpenseError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Storage and display format for expense dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A persisted expense row
/// Serde names match the CSV export header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    /// Always `YYYY-MM-DD`
    #[serde(rename = "Date")]
    pub date: String,
}

/// Unvalidated input for a new expense
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub category: String,
    pub amount: f64,
    pub date: String,
}

impl NewExpense {
    pub fn new(category: impl Into<String>, amount: f64, date: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            amount,
            date: date.into(),
        }
    }

    /// Check required fields and normalise the date.
    ///
    /// A zero or non-finite amount counts as missing. The returned value has
    /// trimmed text and a zero-padded `YYYY-MM-DD` date.
    pub fn validate(&self) -> Result<NewExpense> {
        let category = self.category.trim();
        let date = self.date.trim();

        if category.is_empty() || date.is_empty() || !self.amount.is_finite() || self.amount == 0.0 {
            return Err(ExpenseError::Validation("All fields are required.".to_string()));
        }

        let parsed = parse_date(date).ok_or_else(|| {
            ExpenseError::Validation("Invalid date format. Use YYYY-MM-DD.".to_string())
        })?;

        Ok(NewExpense {
            category: category.to_string(),
            amount: self.amount,
            date: parsed.format(DATE_FORMAT).to_string(),
        })
    }
}

/// Parse a `YYYY-MM-DD` date, returning None for anything else
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

/// Today's local date in storage format
pub fn today() -> String {
    chrono::Local::now().date_naive().format(DATE_FORMAT).to_string()
}
