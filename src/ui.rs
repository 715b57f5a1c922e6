// Interactive terminal UI. Read-only: it renders a snapshot loaded from the
// ledger at startup; all mutations go through the CLI subcommands.

use anyhow::Result;
use chrono::{Datelike, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;

use tallybook::{
    format_amount, AccountBalance, Ledger, MonthlyFlow, PatrimonySlice, Transaction,
    TransactionFilter, TransactionKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Transactions,
    Accounts,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterType {
    None,
    All,
    Income,
    Expenses,
    Transfers,
    ByAccount(String),
}

#[derive(Debug, Clone)]
pub struct FilterState {
    pub active_filter: FilterType,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Transactions,
            Page::Transactions => Page::Accounts,
            Page::Accounts => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::Accounts,
            Page::Transactions => Page::Overview,
            Page::Accounts => Page::Transactions,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Transactions => "Transactions",
            Page::Accounts => "Accounts",
        }
    }
}

/// A transaction with its account and category names resolved for display.
#[derive(Debug, Clone)]
pub struct TransactionRow {
    pub tx: Transaction,
    pub account: String,
    pub category: String,
}

pub struct App {
    pub rows: Vec<TransactionRow>,
    pub filtered: Vec<TransactionRow>,
    pub state: TableState,
    pub accounts_state: TableState,
    pub balances: Vec<AccountBalance>,
    pub tx_counts: HashMap<i64, usize>,
    pub savings_total: i64,
    pub patrimony_total: i64,
    pub flows: Vec<MonthlyFlow>,
    pub distribution: Vec<PatrimonySlice>,
    pub top_expenses: Vec<TransactionRow>,
    pub current_page: Page,
    pub show_detail: bool,
    pub filter_state: FilterState,
}

impl App {
    /// Snapshot everything the three pages need in one pass.
    pub fn load(ledger: &Ledger) -> Result<Self> {
        let account_names: HashMap<i64, String> = ledger
            .accounts()?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        let category_names: HashMap<i64, String> = ledger
            .categories()?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let to_row = |tx: Transaction| TransactionRow {
            account: account_names.get(&tx.account_id).cloned().unwrap_or_default(),
            category: category_names.get(&tx.category_id).cloned().unwrap_or_default(),
            tx,
        };

        let rows: Vec<TransactionRow> = ledger
            .transactions(&TransactionFilter::default())?
            .into_iter()
            .map(to_row)
            .collect();
        let mut tx_counts: HashMap<i64, usize> = HashMap::new();
        for row in &rows {
            *tx_counts.entry(row.tx.account_id).or_insert(0) += 1;
        }

        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).unwrap_or(today);
        let top_expenses = ledger
            .top_expenses(5, month_start, today)?
            .into_iter()
            .map(to_row)
            .collect();

        let balances = ledger.balances()?;
        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }
        let mut accounts_state = TableState::default();
        if !balances.is_empty() {
            accounts_state.select(Some(0));
        }

        Ok(Self {
            filtered: rows.clone(),
            rows,
            state,
            accounts_state,
            balances,
            tx_counts,
            savings_total: ledger.savings_total()?,
            patrimony_total: ledger.patrimony_total()?,
            flows: ledger.monthly_flow(6)?,
            distribution: ledger.patrimony_distribution()?,
            top_expenses,
            current_page: Page::Overview,
            show_detail: false,
            filter_state: FilterState {
                active_filter: FilterType::None,
            },
        })
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_row(&self) -> Option<&TransactionRow> {
        self.state.selected().and_then(|i| self.filtered.get(i))
    }

    pub fn selected_balance(&self) -> Option<&AccountBalance> {
        self.accounts_state.selected().and_then(|i| self.balances.get(i))
    }

    pub fn apply_filter(&mut self, filter: FilterType) {
        self.filter_state.active_filter = filter.clone();

        self.filtered = match filter {
            FilterType::None | FilterType::All => self.rows.clone(),
            FilterType::Income => self.rows_of_kind(TransactionKind::Income),
            FilterType::Expenses => self.rows_of_kind(TransactionKind::Expense),
            FilterType::Transfers => self.rows_of_kind(TransactionKind::TransferLeg),
            FilterType::ByAccount(ref name) => self
                .rows
                .iter()
                .filter(|row| &row.account == name)
                .cloned()
                .collect(),
        };

        // Reset selection to the first row
        if !self.filtered.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    fn rows_of_kind(&self, kind: TransactionKind) -> Vec<TransactionRow> {
        self.rows
            .iter()
            .filter(|row| row.tx.kind == kind)
            .cloned()
            .collect()
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterType::None);
    }

    /// Jump from the accounts page to the transactions of the selected one.
    pub fn focus_selected_account(&mut self) {
        if let Some(balance) = self.selected_balance() {
            let name = balance.account.name.clone();
            self.apply_filter(FilterType::ByAccount(name));
            self.current_page = Page::Transactions;
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_table(&mut self) -> Option<(&mut TableState, usize)> {
        match self.current_page {
            Page::Transactions => Some((&mut self.state, self.filtered.len())),
            Page::Accounts => Some((&mut self.accounts_state, self.balances.len())),
            Page::Overview => None,
        }
    }

    pub fn next(&mut self) {
        if let Some((state, len)) = self.active_table() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(i) if i >= len - 1 => 0,
                Some(i) => i + 1,
                None => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn previous(&mut self) {
        if let Some((state, len)) = self.active_table() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(0) | None => len - 1,
                Some(i) => i - 1,
            };
            state.select(Some(i));
        }
    }

    pub fn page_down(&mut self) {
        if let Some((state, len)) = self.active_table() {
            if len == 0 {
                return;
            }
            let i = state.selected().map_or(0, |i| (i + 20).min(len - 1));
            state.select(Some(i));
        }
    }

    pub fn page_up(&mut self) {
        if let Some((state, _)) = self.active_table() {
            let i = state.selected().map_or(0, |i| i.saturating_sub(20));
            state.select(Some(i));
        }
    }

    pub fn select_first(&mut self) {
        if let Some((state, len)) = self.active_table() {
            if len > 0 {
                state.select(Some(0));
            }
        }
    }

    pub fn select_last(&mut self) {
        if let Some((state, len)) = self.active_table() {
            if len > 0 {
                state.select(Some(len - 1));
            }
        }
    }

    pub fn stats(&self) -> LedgerStats {
        let mut stats = LedgerStats::default();
        for row in &self.rows {
            match row.tx.kind {
                TransactionKind::Income => {
                    stats.income_count += 1;
                    stats.income_total += row.tx.amount;
                }
                TransactionKind::Expense => {
                    stats.expense_count += 1;
                    stats.expense_total += -row.tx.amount;
                }
                TransactionKind::TransferLeg => stats.transfer_leg_count += 1,
            }
        }
        stats
    }
}

/// Whole-ledger counters for the header. Totals are positive magnitudes.
#[derive(Default)]
pub struct LedgerStats {
    pub income_count: usize,
    pub income_total: i64,
    pub expense_count: usize,
    pub expense_total: i64,
    pub transfer_leg_count: usize,
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => match app.current_page {
                    Page::Accounts => app.focus_selected_account(),
                    Page::Transactions => app.toggle_detail(),
                    Page::Overview => {}
                },
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('c') => app.clear_filter(),
                KeyCode::Char('1') if app.current_page == Page::Transactions => {
                    app.apply_filter(FilterType::All);
                }
                KeyCode::Char('2') if app.current_page == Page::Transactions => {
                    app.apply_filter(FilterType::Income);
                }
                KeyCode::Char('3') if app.current_page == Page::Transactions => {
                    app.apply_filter(FilterType::Expenses);
                }
                KeyCode::Char('4') if app.current_page == Page::Transactions => {
                    app.apply_filter(FilterType::Transfers);
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.select_first(),
                KeyCode::End => app.select_last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Transactions {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_transactions(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Overview => render_overview(f, chunks[1], app),
            Page::Transactions => render_transactions(f, chunks[1], app),
            Page::Accounts => render_accounts(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let pages = [Page::Overview, Page::Transactions, Page::Accounts];
    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Patrimony: {}", format_amount(app.patrimony_total)),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("↓ {}", stats.expense_count),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("↑ {}", stats.income_count),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    // Balances
    let mut balance_lines = vec![];
    for balance in &app.balances {
        balance_lines.push(Line::from(vec![
            Span::raw(format!("{:<20} ", truncate(&balance.account.name, 20))),
            Span::styled(
                format!("{:>14}", format_amount(balance.balance)),
                Style::default().fg(amount_color(balance.balance)),
            ),
            Span::styled(
                format!("  {}", balance.account.kind.label()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    if balance_lines.is_empty() {
        balance_lines.push(Line::from(Span::styled(
            "no accounts yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(
        Paragraph::new(balance_lines).block(titled_block(" Balances ")),
        top[0],
    );

    // Totals and patrimony distribution
    let mut total_lines = vec![
        Line::from(vec![
            Span::raw(format!("{:<14}", "Savings")),
            Span::styled(
                format!("{:>14}", format_amount(app.savings_total)),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!("{:<14}", "Patrimony")),
            Span::styled(
                format!("{:>14}", format_amount(app.patrimony_total)),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(""),
    ];
    for slice in &app.distribution {
        total_lines.push(Line::from(vec![
            Span::raw(format!("{:<14}", slice.kind.label())),
            Span::raw(format!("{:>14}", format_amount(slice.total))),
            Span::styled(
                format!("  {:>5.1}%", slice.share * 100.0),
                Style::default().fg(Color::Yellow),
            ),
        ]));
    }
    f.render_widget(
        Paragraph::new(total_lines).block(titled_block(" Patrimony ")),
        top[1],
    );

    // Monthly flow, oldest first
    let mut flow_lines = vec![];
    for flow in &app.flows {
        flow_lines.push(Line::from(vec![
            Span::raw(format!("{}-{:02}  ", flow.year, flow.month)),
            Span::styled(
                format!("in {:>12}", format_amount(flow.income)),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("  out {:>12}", format_amount(flow.expenses)),
                Style::default().fg(Color::Red),
            ),
            Span::styled(
                format!("  net {:>12}", format_amount(flow.net())),
                Style::default().fg(amount_color(flow.net())),
            ),
        ]));
    }
    f.render_widget(
        Paragraph::new(flow_lines).block(titled_block(" Monthly flow ")),
        chunks[1],
    );

    // Largest expenses of the current month
    let mut expense_lines = vec![];
    for row in &app.top_expenses {
        expense_lines.push(Line::from(vec![
            Span::raw(format!("{}  ", row.tx.date)),
            Span::styled(
                format!("{:>12}", format_amount(row.tx.amount)),
                Style::default().fg(Color::Red),
            ),
            Span::raw(format!("  {:<30}", truncate(&row.tx.description, 30))),
            Span::styled(
                truncate(&row.category, 20),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    if expense_lines.is_empty() {
        expense_lines.push(Line::from(Span::styled(
            "no expenses this month",
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(
        Paragraph::new(expense_lines).block(titled_block(" Top expenses this month ")),
        chunks[2],
    );
}

fn render_transactions(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Date", "Description", "Amount", "Type", "Account", "Category"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered.iter().map(|row| {
        let color = kind_color(row.tx.kind);
        let cells = vec![
            Cell::from(row.tx.date.to_string()),
            Cell::from(truncate(&row.tx.description, 30)),
            Cell::from(format!("{:>12}", format_amount(row.tx.amount)))
                .style(Style::default().fg(color)),
            Cell::from(row.tx.kind.as_str()).style(Style::default().fg(color)),
            Cell::from(truncate(&row.account, 16)),
            Cell::from(truncate(&row.category, 16)),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(32),
            Constraint::Length(13),
            Constraint::Length(9),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(titled_block(" Transactions "))
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_accounts(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Id", "Name", "Kind", "Balance", "Entries", "Since"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.balances.iter().map(|balance| {
        let count = app.tx_counts.get(&balance.account.id).copied().unwrap_or(0);
        let cells = vec![
            Cell::from(balance.account.id.to_string()),
            Cell::from(truncate(&balance.account.name, 24)),
            Cell::from(balance.account.kind.label()),
            Cell::from(format!("{:>14}", format_amount(balance.balance)))
                .style(Style::default().fg(amount_color(balance.balance))),
            Cell::from(count.to_string()),
            Cell::from(balance.account.created_at.date_naive().to_string()),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(26),
            Constraint::Length(13),
            Constraint::Length(15),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(titled_block(" Accounts (Enter: show transactions) "))
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.accounts_state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![];

    if let Some(row) = app.selected_row() {
        let color = kind_color(row.tx.kind);
        lines.push(Line::from(vec![
            Span::styled("Id        ", Style::default().fg(Color::DarkGray)),
            Span::raw(row.tx.id.to_string()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Date      ", Style::default().fg(Color::DarkGray)),
            Span::raw(row.tx.date.to_string()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Amount    ", Style::default().fg(Color::DarkGray)),
            Span::styled(format_amount(row.tx.amount), Style::default().fg(color)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Type      ", Style::default().fg(Color::DarkGray)),
            Span::styled(row.tx.kind.as_str(), Style::default().fg(color)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Account   ", Style::default().fg(Color::DarkGray)),
            Span::raw(row.account.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Category  ", Style::default().fg(Color::DarkGray)),
            Span::raw(row.category.clone()),
        ]));
        if let Some(pair_id) = row.tx.linked_id {
            lines.push(Line::from(vec![
                Span::styled("Paired    ", Style::default().fg(Color::DarkGray)),
                Span::styled(format!("leg #{pair_id}"), Style::default().fg(Color::Cyan)),
            ]));
        }
        lines.push(Line::from(""));
        let width = area.width.saturating_sub(4) as usize;
        for part in wrap_text(&row.tx.description, width.max(16)).lines() {
            lines.push(Line::from(part.to_string()));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "no transaction selected",
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(
        Paragraph::new(lines).block(titled_block(" Detail ")),
        area,
    );
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.filter_state.active_filter != FilterType::None
        && app.filter_state.active_filter != FilterType::All
    {
        let filter_name = match &app.filter_state.active_filter {
            FilterType::Income => "income",
            FilterType::Expenses => "expenses",
            FilterType::Transfers => "transfers",
            FilterType::ByAccount(name) => name.as_str(),
            _ => "custom",
        };
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", filter_name),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("1-4", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Filter | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Detail | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn titled_block(title: &str) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title.to_string())
}

fn kind_color(kind: TransactionKind) -> Color {
    match kind {
        TransactionKind::Income => Color::Green,
        TransactionKind::Expense => Color::Red,
        TransactionKind::TransferLeg => Color::Cyan,
    }
}

fn amount_color(amount: i64) -> Color {
    if amount < 0 {
        Color::Red
    } else {
        Color::Green
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len > 0 && line_len + word_len + 1 > width {
            result.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}
