use crate::analysis;
use crate::controller::{ExpenseController, Field, Notice, NoticeLevel};
use crate::export::DEFAULT_EXPORT_FILE;
use crate::repository::CategoryTotal;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Expenses,
    Analysis,
}

impl Page {
    pub fn title(&self) -> &str {
        match self {
            Page::Expenses => "Expenses",
            Page::Analysis => "Expense Analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input(Field),
    Table,
}

impl Focus {
    fn order() -> Vec<Focus> {
        let mut order: Vec<Focus> = Field::ALL.iter().map(|f| Focus::Input(*f)).collect();
        order.push(Focus::Table);
        order
    }

    pub fn next(&self) -> Self {
        let order = Self::order();
        let i = order.iter().position(|f| f == self).unwrap_or(0);
        order[(i + 1) % order.len()]
    }

    pub fn previous(&self) -> Self {
        let order = Self::order();
        let i = order.iter().position(|f| f == self).unwrap_or(0);
        order[(i + order.len() - 1) % order.len()]
    }
}

pub struct App {
    pub controller: ExpenseController,
    pub current_page: Page,
    pub focus: Focus,
    pub state: TableState,
    /// Blocking modal, every other key is ignored while it is shown
    pub notice: Option<Notice>,
    /// Export destination being typed, `Some` while the prompt is open
    pub export_prompt: Option<String>,
    pub chart: Vec<CategoryTotal>,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: ExpenseController) -> Self {
        let mut state = TableState::default();
        state.select(controller.selected());

        Self {
            controller,
            current_page: Page::Expenses,
            focus: Focus::Input(Field::Category),
            state,
            notice: None,
            export_prompt: None,
            chart: Vec::new(),
            should_quit: false,
        }
    }

    fn show(&mut self, notice: Option<Notice>) {
        if notice.is_some() {
            self.notice = notice;
        }
        self.state.select(self.controller.selected());
    }

    pub fn add_expense(&mut self) {
        let notice = self.controller.submit_form();
        if notice.as_ref().map(|n| n.level) == Some(NoticeLevel::Info) {
            self.focus = Focus::Input(Field::Category);
        }
        self.show(notice);
    }

    pub fn start_export(&mut self) {
        match self.controller.export_precheck() {
            Some(notice) => self.show(Some(notice)),
            None => self.export_prompt = Some(DEFAULT_EXPORT_FILE.to_string()),
        }
    }

    /// Close the destination prompt, `confirm == false` is a cancel
    pub fn finish_export(&mut self, confirm: bool) {
        let Some(input) = self.export_prompt.take() else {
            return;
        };
        let trimmed = input.trim();
        let destination = (confirm && !trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        let notice = self.controller.export_to(destination.as_deref());
        self.show(notice);
    }

    pub fn show_analysis(&mut self) {
        match self.controller.analyze() {
            Ok(totals) => {
                self.chart = totals;
                self.current_page = Page::Analysis;
            }
            Err(notice) => self.show(Some(notice)),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return;
        }

        if self.export_prompt.is_some() {
            match key.code {
                KeyCode::Enter => self.finish_export(true),
                KeyCode::Esc => self.finish_export(false),
                KeyCode::Backspace => {
                    if let Some(input) = self.export_prompt.as_mut() {
                        input.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(input) = self.export_prompt.as_mut() {
                        input.push(c);
                    }
                }
                _ => {}
            }
            return;
        }

        if self.current_page == Page::Analysis {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::F(7) | KeyCode::Tab) {
                self.current_page = Page::Expenses;
            }
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::F(2) => self.add_expense(),
            KeyCode::F(3) => self.controller.clear_form(),
            KeyCode::F(4) => {
                let notice = self.controller.filter_by_amount();
                self.show(notice);
            }
            KeyCode::F(5) => {
                let notice = self.controller.filter_by_date();
                self.show(notice);
            }
            KeyCode::F(6) => self.start_export(),
            KeyCode::F(7) => self.show_analysis(),
            KeyCode::F(8) => {
                let notice = self.controller.delete_selected();
                self.show(notice);
            }
            KeyCode::Delete if self.focus == Focus::Table => {
                let notice = self.controller.delete_selected();
                self.show(notice);
            }
            KeyCode::F(12) => {
                let notice = self.controller.reset_filters();
                self.show(notice);
            }
            KeyCode::Down => {
                self.controller.select_next();
                self.state.select(self.controller.selected());
            }
            KeyCode::Up => {
                self.controller.select_previous();
                self.state.select(self.controller.selected());
            }
            KeyCode::Enter => match self.focus {
                Focus::Input(Field::Category | Field::Amount | Field::Date) => self.add_expense(),
                Focus::Input(Field::MinAmount | Field::MaxAmount) => {
                    let notice = self.controller.filter_by_amount();
                    self.show(notice);
                }
                Focus::Input(Field::FromDate | Field::ToDate) => {
                    let notice = self.controller.filter_by_date();
                    self.show(notice);
                }
                Focus::Table => {}
            },
            KeyCode::Backspace => {
                if let Focus::Input(field) = self.focus {
                    self.controller.pop_char(field);
                }
            }
            KeyCode::Char(c) => {
                if let Focus::Input(field) = self.focus {
                    self.controller.push_char(field, c);
                }
            }
            _ => {}
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.handle_key(key);
            if app.should_quit {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Entry form
            Constraint::Min(5),    // Table or chart
            Constraint::Length(3), // Filter panel
            Constraint::Length(3), // Total + key hints
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_form(f, chunks[1], app);

    match app.current_page {
        Page::Expenses => render_table(f, chunks[2], app),
        Page::Analysis => render_chart(f, chunks[2], app),
    }

    render_filters(f, chunks[3], app);
    render_status_bar(f, chunks[4], app);

    if let Some(input) = &app.export_prompt {
        render_export_prompt(f, input);
    }
    if let Some(notice) = &app.notice {
        render_notice(f, notice);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let spans = vec![
        Span::styled(
            " Expense Tracker ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled(app.current_page.title(), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled(
            app.controller.active_filter().describe(),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("{} rows", app.controller.rows().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn input_spans<'a>(app: &'a App, fields: &[Field]) -> Vec<Span<'a>> {
    let mut spans = vec![];
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        let focused = app.focus == Focus::Input(*field);
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{}: ", field.label()), label_style));
        spans.push(Span::styled(
            format!("[{}{}]", app.controller.field(*field), if focused { "▏" } else { "" }),
            Style::default().fg(Color::White),
        ));
    }
    spans
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = input_spans(app, &[Field::Category, Field::Amount, Field::Date]);
    spans.push(Span::raw("   "));
    spans.push(Span::styled("F2", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Add  "));
    spans.push(Span::styled("F3", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Clear"));

    let form = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" New Expense "),
    );
    f.render_widget(form, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Category", "Amount", "Date"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.controller.rows().iter().map(|e| {
        Row::new(vec![
            Cell::from(e.id.to_string()),
            Cell::from(truncate(&e.category, 30)),
            Cell::from(format!("{:.2}", e.amount)),
            Cell::from(e.date.clone()),
        ])
        .height(1)
    });

    let border = if app.focus == Focus::Table {
        Color::Yellow
    } else {
        Color::White
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(32),
            Constraint::Length(14),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Expenses "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let bars = analysis::chart_bars(&app.chart);
    let data: Vec<(&str, u64)> = bars.iter().map(|(label, v)| (label.as_str(), *v)).collect();

    // Widest label decides the bar width so categories stay readable
    let bar_width = bars
        .iter()
        .map(|(label, _)| label.chars().count() as u16)
        .max()
        .unwrap_or(3)
        .clamp(3, 16);

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Expense Analysis - Total by Category (Esc to return) "),
        )
        .data(data.as_slice())
        .bar_width(bar_width)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Rgb(255, 165, 0)))
        .value_style(Style::default().fg(Color::Black).bg(Color::Rgb(255, 165, 0)));

    f.render_widget(chart, area);
}

fn render_filters(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = input_spans(
        app,
        &[Field::MinAmount, Field::MaxAmount, Field::FromDate, Field::ToDate],
    );
    spans.push(Span::raw("   "));
    for (key, label) in [("F4", " Amount  "), ("F5", " Date  "), ("F6", " Export  "), ("F7", " Analyze")] {
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(label));
    }

    let filters = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Filters "),
    );
    f.render_widget(filters, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.controller.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.controller.rows().len();

    let status_spans = vec![
        Span::styled(
            app.controller.total_label(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::raw(format!("Row: {}/{} ", selected, total)),
        Span::raw("| "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Focus | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Select | "),
        Span::styled("F8", Style::default().fg(Color::Yellow)),
        Span::raw(" Delete | "),
        Span::styled("F12", Style::default().fg(Color::Yellow)),
        Span::raw(" Reset filters | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_export_prompt(f: &mut Frame, input: &str) {
    let area = centered_rect(60, 5, f.size());
    let prompt = Paragraph::new(vec![
        Line::from(format!("{}▏", input)),
        Line::from(Span::styled(
            "Enter to save, Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Export to CSV "),
    );

    f.render_widget(Clear, area);
    f.render_widget(prompt, area);
}

fn render_notice(f: &mut Frame, notice: &Notice) {
    let color = match notice.level {
        NoticeLevel::Info => Color::Green,
        NoticeLevel::Error => Color::Red,
    };
    let area = centered_rect(50, 6, f.size());
    let body = Paragraph::new(vec![
        Line::from(notice.message.clone()),
        Line::from(""),
        Line::from(Span::styled("Press Enter", Style::default().fg(Color::DarkGray))),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", notice.title)),
    );

    f.render_widget(Clear, area);
    f.render_widget(body, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = (r.width as u32 * percent_x as u32 / 100) as u16;
    Rect {
        x: r.x + (r.width.saturating_sub(width)) / 2,
        y: r.y + (r.height.saturating_sub(height)) / 2,
        width,
        height: height.min(r.height),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
