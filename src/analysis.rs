// Analyzer - per-category totals for the bar chart

use crate::error::Result;
use crate::repository::{CategoryTotal, ExpenseRepository};

#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    NoData,
    /// Totals in grouping order
    Totals(Vec<CategoryTotal>),
}

impl Analysis {
    pub fn no_data_message() -> &'static str {
        "No data available for analysis."
    }
}

pub fn analyze(repo: &ExpenseRepository) -> Result<Analysis> {
    let totals = repo.aggregate_by_category()?;
    if totals.is_empty() {
        Ok(Analysis::NoData)
    } else {
        Ok(Analysis::Totals(totals))
    }
}

/// (label, value) pairs for a bar chart widget.
/// Bar widgets take integers, values are rounded to whole units and negatives clamp to 0.
pub fn chart_bars(totals: &[CategoryTotal]) -> Vec<(String, u64)> {
    totals
        .iter()
        .map(|t| (t.category.clone(), t.total.max(0.0).round() as u64))
        .collect()
}

/// Plain-text horizontal bar chart, bars scaled to the largest total
pub fn render_text_chart(totals: &[CategoryTotal], width: usize) -> String {
    let label_width = totals
        .iter()
        .map(|t| t.category.chars().count())
        .max()
        .unwrap_or(0);
    let max = totals.iter().map(|t| t.total).fold(0.0_f64, f64::max);

    let mut out = String::from("Expense Analysis\n");
    for t in totals {
        let len = if max > 0.0 && t.total > 0.0 {
            ((t.total / max) * width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:<lw$} │{} {:.2}\n",
            t.category,
            "█".repeat(len),
            t.total,
            lw = label_width
        ));
    }
    out
}
