use anyhow::{Context, Result};
use clap::Parser;
use expense_tracker::{
    analyze, export_csv, render_text_chart, Analysis, AppConfig, Cli, Commands, Database,
    ExpenseFilter, ExpenseRepository, NewExpense,
};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Commands::Ui);

    init_logging(&cli, command == Commands::Ui)?;

    let config = AppConfig::from_cli(&cli);

    // Connection failures are fatal: report once and stop
    let db = match Database::initialize(&config.db_path) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("❌ {}: {}", err.title(), err);
            if err.is_fatal() {
                std::process::exit(1);
            }
            return Err(err.into());
        }
    };
    let repo = ExpenseRepository::new(db);

    match command {
        Commands::Ui => run_ui_mode(repo, &config),
        Commands::Add {
            category,
            amount,
            date,
        } => run_add(&repo, category, amount, date),
        Commands::List { from, to, min, max } => run_list(&repo, &config, from, to, min, max),
        Commands::Delete { id } => {
            repo.delete(id)?;
            println!("✓ Expense {} deleted", id);
            Ok(())
        }
        Commands::Export { path } => run_export(&repo, &path),
        Commands::Analyze => run_analyze(&repo),
    }
}

/// Priority: RUST_LOG env var > --verbose flag > default (info).
/// The terminal UI owns the screen, so it only logs to a file.
fn init_logging(cli: &Cli, ui_mode: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    if let Some(path) = &cli.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init();
    } else if !ui_mode {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
            .init();
    }

    Ok(())
}

fn run_add(
    repo: &ExpenseRepository,
    category: String,
    amount: f64,
    date: Option<String>,
) -> Result<()> {
    let date = date.unwrap_or_else(expense_tracker::expense::today);
    let expense = repo.add(&NewExpense::new(category, amount, date))?;

    println!(
        "✓ Added #{} {} {:.2} on {}",
        expense.id, expense.category, expense.amount, expense.date
    );
    Ok(())
}

fn run_list(
    repo: &ExpenseRepository,
    config: &AppConfig,
    from: Option<String>,
    to: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<()> {
    // Date range wins when both kinds are given
    let filter = match (from, to, min, max) {
        (Some(start), Some(end), _, _) => {
            let start = parse_date_arg(&start)?;
            let end = parse_date_arg(&end)?;
            ExpenseFilter::DateRange { start, end }
        }
        (_, _, Some(min), Some(max)) => ExpenseFilter::AmountRange { min, max },
        _ => ExpenseFilter::None,
    };

    let list = repo.list(&filter)?;

    println!("{:>6}  {:<24} {:>12}  {}", "ID", "Category", "Amount", "Date");
    println!("{}", "─".repeat(56));
    for e in &list.expenses {
        println!("{:>6}  {:<24} {:>12.2}  {}", e.id, e.category, e.amount, e.date);
    }
    println!("{}", "─".repeat(56));
    println!("Total Expense: {}{:.2}", config.currency, list.total);

    Ok(())
}

fn parse_date_arg(input: &str) -> Result<String> {
    let date = expense_tracker::expense::parse_date(input)
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD.", input))?;
    Ok(date.format(expense_tracker::DATE_FORMAT).to_string())
}

fn run_export(repo: &ExpenseRepository, path: &Path) -> Result<()> {
    let outcome = export_csv(repo, path).context("Failed to export data")?;
    println!("{}", outcome.message());
    Ok(())
}

fn run_analyze(repo: &ExpenseRepository) -> Result<()> {
    match analyze(repo)? {
        Analysis::NoData => println!("{}", Analysis::no_data_message()),
        Analysis::Totals(totals) => print!("{}", render_text_chart(&totals, 40)),
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(repo: ExpenseRepository, config: &AppConfig) -> Result<()> {
    use expense_tracker::{ui, ExpenseController};

    let controller = ExpenseController::new(repo, config.currency.clone())?;
    let mut app = ui::App::new(controller);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_repo: ExpenseRepository, _config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: add, list, delete, export, analyze");
    std::process::exit(1);
}
