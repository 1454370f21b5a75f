// View Controller - application context between the terminal UI and the repository
//
// Owns the repository (and through it the single connection), the form and
// filter inputs, the displayed rows and the selection. Every user action
// returns an optional Notice which the UI shows as a modal.

use crate::analysis::{self, Analysis};
use crate::error::ExpenseError;
use crate::expense::{self, Expense, NewExpense};
use crate::export::{self, ExportOutcome};
use crate::repository::{CategoryTotal, ExpenseFilter, ExpenseList, ExpenseRepository};
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    FormEntered,
    Submitting,
}

/// Every editable input on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Category,
    Amount,
    Date,
    MinAmount,
    MaxAmount,
    FromDate,
    ToDate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Category,
        Field::Amount,
        Field::Date,
        Field::MinAmount,
        Field::MaxAmount,
        Field::FromDate,
        Field::ToDate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Category => "Category",
            Field::Amount => "Amount",
            Field::Date => "Date (YYYY-MM-DD)",
            Field::MinAmount => "Min Amount",
            Field::MaxAmount => "Max Amount",
            Field::FromDate => "From Date",
            Field::ToDate => "To Date",
        }
    }

    pub fn is_form_field(&self) -> bool {
        matches!(self, Field::Category | Field::Amount | Field::Date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub category: String,
    pub amount: String,
    pub date: String,
}

impl FormFields {
    fn reset() -> Self {
        Self {
            category: String::new(),
            amount: String::new(),
            date: expense::today(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterFields {
    pub min_amount: String,
    pub max_amount: String,
    pub from_date: String,
    pub to_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Message for a blocking modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl From<ExpenseError> for Notice {
    fn from(err: ExpenseError) -> Self {
        Notice::error(err.title(), err.to_string())
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

pub struct ExpenseController {
    repo: ExpenseRepository,
    currency: String,
    form: FormFields,
    filters: FilterFields,
    state: FormState,
    rows: ExpenseList,
    active_filter: ExpenseFilter,
    selected: Option<usize>,
}

impl ExpenseController {
    /// Build the context and load the unfiltered list
    pub fn new(repo: ExpenseRepository, currency: impl Into<String>) -> crate::Result<Self> {
        let mut controller = Self {
            repo,
            currency: currency.into(),
            form: FormFields::reset(),
            filters: FilterFields::default(),
            state: FormState::Idle,
            rows: ExpenseList::default(),
            active_filter: ExpenseFilter::None,
            selected: None,
        };
        controller.load(ExpenseFilter::None)?;
        Ok(controller)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn filters(&self) -> &FilterFields {
        &self.filters
    }

    pub fn rows(&self) -> &[Expense] {
        &self.rows.expenses
    }

    pub fn total(&self) -> f64 {
        self.rows.total
    }

    pub fn active_filter(&self) -> &ExpenseFilter {
        &self.active_filter
    }

    pub fn total_label(&self) -> String {
        format!("Total Expense: {}{:.2}", self.currency, self.rows.total)
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Category => &self.form.category,
            Field::Amount => &self.form.amount,
            Field::Date => &self.form.date,
            Field::MinAmount => &self.filters.min_amount,
            Field::MaxAmount => &self.filters.max_amount,
            Field::FromDate => &self.filters.from_date,
            Field::ToDate => &self.filters.to_date,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        if field.is_form_field() && self.state == FormState::Idle {
            self.state = FormState::FormEntered;
        }
        match field {
            Field::Category => &mut self.form.category,
            Field::Amount => &mut self.form.amount,
            Field::Date => &mut self.form.date,
            Field::MinAmount => &mut self.filters.min_amount,
            Field::MaxAmount => &mut self.filters.max_amount,
            Field::FromDate => &mut self.filters.from_date,
            Field::ToDate => &mut self.filters.to_date,
        }
    }

    // ------------------------------------------------------------------------
    // Input editing
    // ------------------------------------------------------------------------

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        *self.field_mut(field) = value.into();
    }

    pub fn push_char(&mut self, field: Field, c: char) {
        self.field_mut(field).push(c);
    }

    pub fn pop_char(&mut self, field: Field) {
        self.field_mut(field).pop();
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.selected.and_then(|i| self.rows.expenses.get(i))
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.rows.len());
    }

    pub fn select_next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        });
    }

    pub fn select_previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        });
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Add button: validate, insert, then clear the form and reload
    pub fn submit_form(&mut self) -> Option<Notice> {
        self.state = FormState::Submitting;

        let result = self
            .parse_form()
            .and_then(|input| self.repo.add(&input));

        match result {
            Ok(expense) => {
                debug!(id = expense.id, "form submitted");
                self.clear_form();
                if let Err(err) = self.load(ExpenseFilter::None) {
                    return Some(err.into());
                }
                Some(Notice::info("Success", "Expense added successfully!"))
            }
            Err(err) => {
                // Form is kept so the user can correct it
                self.state = FormState::FormEntered;
                Some(err.into())
            }
        }
    }

    fn parse_form(&self) -> crate::Result<NewExpense> {
        let amount_text = self.form.amount.trim();
        let amount = if amount_text.is_empty() {
            // Reported as a missing field by validation
            0.0
        } else {
            amount_text
                .parse::<f64>()
                .ok()
                .filter(|a| a.is_finite())
                .ok_or_else(|| ExpenseError::Validation("Amount must be a number.".to_string()))?
        };
        Ok(NewExpense::new(&self.form.category, amount, &self.form.date))
    }

    /// Clear Form button
    pub fn clear_form(&mut self) {
        self.form = FormFields::reset();
        self.state = FormState::Idle;
    }

    /// Filter by Amount button. Bad input leaves the displayed rows alone.
    pub fn filter_by_amount(&mut self) -> Option<Notice> {
        let min = self.filters.min_amount.trim().parse::<f64>();
        let max = self.filters.max_amount.trim().parse::<f64>();

        let (Ok(min), Ok(max)) = (min, max) else {
            return Some(
                ExpenseError::Parse("Enter valid numbers for amount range.".to_string()).into(),
            );
        };

        self.load(ExpenseFilter::AmountRange { min, max })
            .err()
            .map(Notice::from)
    }

    /// Filter by Date button. Bad input leaves the displayed rows alone.
    pub fn filter_by_date(&mut self) -> Option<Notice> {
        let start = expense::parse_date(&self.filters.from_date);
        let end = expense::parse_date(&self.filters.to_date);

        let (Some(start), Some(end)) = (start, end) else {
            return Some(
                ExpenseError::Parse("Enter valid dates (YYYY-MM-DD) for date range.".to_string())
                    .into(),
            );
        };

        self.load(ExpenseFilter::DateRange {
            start: start.format(expense::DATE_FORMAT).to_string(),
            end: end.format(expense::DATE_FORMAT).to_string(),
        })
        .err()
        .map(Notice::from)
    }

    /// Reset-filters shortcut: clear the filter inputs and show everything
    pub fn reset_filters(&mut self) -> Option<Notice> {
        self.filters = FilterFields::default();
        self.load(ExpenseFilter::None).err().map(Notice::from)
    }

    /// Delete button: needs a selected row, reloads the unfiltered list afterwards
    pub fn delete_selected(&mut self) -> Option<Notice> {
        let Some(id) = self.selected_expense().map(|e| e.id) else {
            return Some(Notice::error("Selection Error", "No expense selected."));
        };

        match self.repo.delete(id) {
            Ok(()) => match self.load(ExpenseFilter::None) {
                Ok(()) => Some(Notice::info("Success", "Expense deleted successfully!")),
                Err(err) => Some(err.into()),
            },
            Err(err @ ExpenseError::NotFound(_)) => {
                // Row was already gone, drop it from the view too
                warn!(id, "selected expense no longer exists");
                match self.load(self.active_filter.clone()) {
                    Ok(()) => Some(err.into()),
                    Err(load_err) => Some(load_err.into()),
                }
            }
            Err(err) => Some(err.into()),
        }
    }

    /// Whether there is anything to export. Checked before asking for a destination.
    pub fn export_precheck(&self) -> Option<Notice> {
        match self.repo.count() {
            Ok(0) => Some(Notice::info("Info", ExportOutcome::NothingToExport.message())),
            Ok(_) => None,
            Err(err) => Some(err.into()),
        }
    }

    /// Export to the chosen destination, `None` means the prompt was cancelled
    pub fn export_to(&self, destination: Option<&Path>) -> Option<Notice> {
        let path = destination?;
        match export::export_csv(&self.repo, path) {
            Ok(outcome @ ExportOutcome::NothingToExport) => Some(Notice::info("Info", outcome.message())),
            Ok(outcome) => Some(Notice::info("Success", outcome.message())),
            Err(err) => Some(Notice::error("Error", format!("Failed to export data: {}", err))),
        }
    }

    /// Analyze button: totals for the chart, or a notice when there is nothing to draw
    pub fn analyze(&self) -> Result<Vec<CategoryTotal>, Notice> {
        match analysis::analyze(&self.repo) {
            Ok(Analysis::Totals(totals)) => Ok(totals),
            Ok(Analysis::NoData) => Err(Notice::info("Info", Analysis::no_data_message())),
            Err(err) => Err(Notice::error("Error", format!("Failed to show analysis: {}", err))),
        }
    }

    fn load(&mut self, filter: ExpenseFilter) -> crate::Result<()> {
        let rows = self.repo.list(&filter)?;
        debug!(filter = %filter.describe(), rows = rows.len(), "rows loaded");

        self.rows = rows;
        self.active_filter = filter;
        // A reload never picks a row on the user's behalf
        self.selected = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn controller() -> ExpenseController {
        let repo = ExpenseRepository::new(Database::initialize_in_memory().unwrap());
        ExpenseController::new(repo, "₹").unwrap()
    }

    fn fill_form(c: &mut ExpenseController, category: &str, amount: &str, date: &str) {
        c.set_field(Field::Category, category);
        c.set_field(Field::Amount, amount);
        c.set_field(Field::Date, date);
    }

    fn add(c: &mut ExpenseController, category: &str, amount: &str, date: &str) {
        fill_form(c, category, amount, date);
        let notice = c.submit_form().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info, "{:?}", notice);
    }

    #[test]
    fn test_starts_idle_with_today_and_zero_total() {
        let c = controller();

        assert_eq!(c.state(), FormState::Idle);
        assert_eq!(c.form().date, expense::today());
        assert_eq!(c.total_label(), "Total Expense: ₹0.00");
        assert!(c.rows().is_empty());
    }

    #[test]
    fn test_successful_add_clears_form_and_reloads() {
        let mut c = controller();

        fill_form(&mut c, "Food", "12.5", "2024-01-15");
        assert_eq!(c.state(), FormState::FormEntered);

        let notice = c.submit_form().unwrap();

        assert_eq!(notice, Notice::info("Success", "Expense added successfully!"));
        assert_eq!(c.state(), FormState::Idle);
        assert_eq!(c.form().category, "");
        assert_eq!(c.form().amount, "");
        assert_eq!(c.form().date, expense::today());
        assert_eq!(c.rows().len(), 1);
        assert_eq!(c.total_label(), "Total Expense: ₹12.50");

        println!("✅ Add flow test PASSED");
    }

    #[test]
    fn test_failed_add_retains_form() {
        let mut c = controller();

        fill_form(&mut c, "Food", "12.5", "31-12-2024");
        let notice = c.submit_form().unwrap();

        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Invalid date format. Use YYYY-MM-DD.");
        assert_eq!(c.state(), FormState::FormEntered);
        assert_eq!(c.form().category, "Food");
        assert_eq!(c.form().date, "31-12-2024");
        assert!(c.rows().is_empty());
    }

    #[test]
    fn test_missing_and_non_numeric_amount() {
        let mut c = controller();

        fill_form(&mut c, "Food", "", "2024-01-15");
        assert_eq!(c.submit_form().unwrap().message, "All fields are required.");

        c.set_field(Field::Amount, "twelve");
        assert_eq!(c.submit_form().unwrap().message, "Amount must be a number.");

        assert!(c.rows().is_empty());
    }

    #[test]
    fn test_filter_by_amount_replaces_rows_and_total() {
        let mut c = controller();
        add(&mut c, "Food", "5", "2024-01-01");
        add(&mut c, "Food", "10", "2024-01-02");
        add(&mut c, "Rent", "20", "2024-01-03");

        c.set_field(Field::MinAmount, "5");
        c.set_field(Field::MaxAmount, "10");
        assert!(c.filter_by_amount().is_none());

        assert_eq!(c.rows().len(), 2);
        assert_eq!(c.total(), 15.0);
        assert_eq!(c.total_label(), "Total Expense: ₹15.00");
        assert!(c.active_filter().is_active());
    }

    #[test]
    fn test_bad_amount_filter_keeps_rows() {
        let mut c = controller();
        add(&mut c, "Food", "5", "2024-01-01");
        add(&mut c, "Rent", "20", "2024-01-03");

        c.set_field(Field::MinAmount, "abc");
        c.set_field(Field::MaxAmount, "10");
        let notice = c.filter_by_amount().unwrap();

        assert_eq!(notice.message, "Enter valid numbers for amount range.");
        assert_eq!(c.rows().len(), 2);
        assert_eq!(c.total(), 25.0);
        assert!(!c.active_filter().is_active());
    }

    #[test]
    fn test_filter_by_date() {
        let mut c = controller();
        add(&mut c, "Food", "5", "2024-01-01");
        add(&mut c, "Food", "7", "2024-02-01");

        c.set_field(Field::FromDate, "2024-01-15");
        c.set_field(Field::ToDate, "2024-02-15");
        assert!(c.filter_by_date().is_none());
        assert_eq!(c.rows().len(), 1);
        assert_eq!(c.total(), 7.0);

        c.set_field(Field::ToDate, "soon");
        assert_eq!(c.filter_by_date().unwrap().level, NoticeLevel::Error);
        assert_eq!(c.rows().len(), 1);
    }

    #[test]
    fn test_reset_filters_clears_inputs_and_reloads() {
        let mut c = controller();
        add(&mut c, "Food", "5", "2024-01-01");
        add(&mut c, "Rent", "20", "2024-01-03");

        c.set_field(Field::MinAmount, "10");
        c.set_field(Field::MaxAmount, "30");
        c.filter_by_amount();
        assert_eq!(c.rows().len(), 1);

        assert!(c.reset_filters().is_none());
        assert_eq!(c.filters(), &FilterFields::default());
        assert_eq!(c.rows().len(), 2);
        assert_eq!(c.total(), 25.0);
    }

    #[test]
    fn test_delete_requires_selection() {
        let mut c = controller();
        let notice = c.delete_selected().unwrap();
        assert_eq!(notice, Notice::error("Selection Error", "No expense selected."));
    }

    #[test]
    fn test_delete_selected_reloads_unfiltered() {
        let mut c = controller();
        add(&mut c, "Food", "5", "2024-01-01");
        add(&mut c, "Rent", "20", "2024-01-03");
        add(&mut c, "Travel", "40", "2024-01-04");

        c.set_field(Field::MinAmount, "10");
        c.set_field(Field::MaxAmount, "50");
        c.filter_by_amount();
        c.select(Some(0));
        let doomed = c.selected_expense().unwrap().id;

        let notice = c.delete_selected().unwrap();

        assert_eq!(notice.message, "Expense deleted successfully!");
        assert!(!c.active_filter().is_active());
        assert_eq!(c.rows().len(), 2);
        assert!(c.rows().iter().all(|e| e.id != doomed));
    }

    #[test]
    fn test_delete_after_reload_requires_new_selection() {
        let mut c = controller();
        add(&mut c, "Food", "5", "2024-01-01");
        add(&mut c, "Rent", "20", "2024-01-03");

        let notice = c.delete_selected().unwrap();

        assert_eq!(notice, Notice::error("Selection Error", "No expense selected."));
        assert_eq!(c.rows().len(), 2);

        // Deleting one row clears the selection again
        c.select(Some(0));
        c.delete_selected().unwrap();
        assert_eq!(c.selected(), None);
        assert_eq!(c.delete_selected().unwrap().message, "No expense selected.");
        assert_eq!(c.rows().len(), 1);
    }

    /// Controller on a database file plus a second handle to the same file
    fn file_backed(dir: &tempfile::TempDir) -> (ExpenseController, Database) {
        let path = dir.path().join("expenses.db");
        let repo = ExpenseRepository::new(Database::initialize(&path).unwrap());
        let other = Database::initialize(&path).unwrap();
        (ExpenseController::new(repo, "₹").unwrap(), other)
    }

    #[test]
    fn test_storage_error_keeps_form() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, other) = file_backed(&dir);
        other.execute("DROP TABLE expenses", []).unwrap();

        fill_form(&mut c, "Food", "12.5", "2024-01-15");
        let notice = c.submit_form().unwrap();

        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("Database error"), "{}", notice.message);
        assert_eq!(c.state(), FormState::FormEntered);
        assert_eq!(c.form().category, "Food");
        assert_eq!(c.form().amount, "12.5");
        assert_eq!(c.form().date, "2024-01-15");
    }

    #[test]
    fn test_delete_of_vanished_row_refreshes_view() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, other) = file_backed(&dir);
        add(&mut c, "Food", "5", "2024-01-01");
        let id = c.rows()[0].id;

        // Row removed behind the controller's back
        other.execute("DELETE FROM expenses", []).unwrap();
        c.select(Some(0));
        let notice = c.delete_selected().unwrap();

        assert_eq!(notice, Notice::error("Selection Error", format!("Expense not found: {}", id)));
        assert!(c.rows().is_empty());
        assert_eq!(c.total(), 0.0);
    }

    #[test]
    fn test_non_finite_amount_is_not_a_number() {
        let mut c = controller();

        for bad in ["inf", "-inf", "NaN", "1e400"] {
            fill_form(&mut c, "Food", bad, "2024-01-15");
            let notice = c.submit_form().unwrap();
            assert_eq!(notice.message, "Amount must be a number.", "amount {}", bad);
        }
        assert!(c.rows().is_empty());
    }

    #[test]
    fn test_selection_wraps() {
        let mut c = controller();
        add(&mut c, "A", "1", "2024-01-01");
        add(&mut c, "B", "2", "2024-01-02");

        // Nothing is picked until the user moves the cursor
        assert_eq!(c.selected(), None);
        c.select_previous();
        assert_eq!(c.selected(), Some(1));
        c.select_next();
        assert_eq!(c.selected(), Some(0));

        c.select(Some(10));
        assert_eq!(c.selected(), None);
    }

    #[test]
    fn test_export_flow() {
        let mut c = controller();
        assert_eq!(
            c.export_precheck(),
            Some(Notice::info("Info", "No expenses to export."))
        );

        add(&mut c, "Food", "5", "2024-01-01");
        assert!(c.export_precheck().is_none());

        // Cancelled prompt
        assert!(c.export_to(None).is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let notice = c.export_to(Some(&path)).unwrap();
        assert_eq!(notice.title, "Success");
        assert!(path.exists());
    }

    #[test]
    fn test_analyze_notice_when_empty() {
        let mut c = controller();
        assert_eq!(
            c.analyze(),
            Err(Notice::info("Info", "No data available for analysis."))
        );

        add(&mut c, "Food", "12.50", "2024-01-15");
        add(&mut c, "Food", "7.50", "2024-01-20");
        let totals = c.analyze().unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total, 20.0);
    }
}
