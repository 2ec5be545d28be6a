use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use moneypot::{
    format_money, format_percentage, AllocationStatus, AllocationStore, AllocationSummary,
    Category, KeyValueStore,
};

/// What the keyboard is currently editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Total,
    AddGoal,
    Rename { id: String },
    Percentage { id: String },
    ConfirmReset,
}

pub struct App<S: KeyValueStore> {
    pub store: AllocationStore<S>,
    pub state: TableState,
    pub mode: InputMode,
    /// Text being typed in the active input
    pub input: String,
    pub message: Option<String>,
    pub currency: String,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: AllocationStore<S>, currency: String) -> Self {
        let mut app = Self {
            store,
            state: TableState::default(),
            mode: InputMode::Normal,
            input: String::new(),
            message: None,
            currency,
        };
        app.clamp_selection();
        app
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.state
            .selected()
            .and_then(|i| self.store.categories().get(i))
    }

    fn clamp_selection(&mut self) {
        let len = self.store.categories().len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(selected);
    }

    fn select_id(&mut self, id: &str) {
        let index = self.store.categories().iter().position(|c| c.id == id);
        self.state.select(index);
    }

    pub fn next(&mut self) {
        let len = self.store.categories().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.store.categories().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    // ========================================================================
    // KEY HANDLING
    // ========================================================================

    /// Apply one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if !self.store.is_ready() {
            return matches!(key.code, KeyCode::Char('q') | KeyCode::Esc);
        }

        match self.mode {
            InputMode::Normal => return self.handle_normal_key(key.code),
            InputMode::ConfirmReset => self.handle_confirm_key(key.code),
            _ => self.handle_input_key(key.code),
        }
        false
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> bool {
        self.message = None;

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.select_first(),
            KeyCode::End => {
                let len = self.store.categories().len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            KeyCode::Char('t') => {
                self.input = self.store.total_amount().to_string();
                self.mode = InputMode::Total;
            }
            KeyCode::Char('a') => {
                self.input.clear();
                self.mode = InputMode::AddGoal;
            }
            KeyCode::Char('r') | KeyCode::F(2) => {
                if let Some((id, name)) = self
                    .selected_category()
                    .map(|c| (c.id.clone(), c.name.clone()))
                {
                    self.input = name;
                    self.mode = InputMode::Rename { id };
                }
            }
            KeyCode::Char('p') | KeyCode::Enter => {
                if let Some((id, percentage)) = self
                    .selected_category()
                    .map(|c| (c.id.clone(), c.percentage))
                {
                    self.input = if percentage == 0.0 {
                        String::new()
                    } else {
                        format_percentage(percentage)
                    };
                    self.mode = InputMode::Percentage { id };
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_category().map(|c| c.id.clone()) {
                    self.store.delete_category(&id);
                    self.clamp_selection();
                }
            }
            KeyCode::Char('R') => self.mode = InputMode::ConfirmReset,
            _ => {}
        }
        false
    }

    fn select_first(&mut self) {
        if !self.store.categories().is_empty() {
            self.state.select(Some(0));
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        self.mode = InputMode::Normal;
        let confirmed = matches!(code, KeyCode::Char('y') | KeyCode::Char('Y'));

        if self.store.reset(confirmed) {
            self.state.select(None);
            self.clamp_selection();
            self.message = Some("Data reset successfully!".to_string());
        } else {
            self.message = Some("Reset cancelled".to_string());
        }
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.confirm_input(),
            KeyCode::Esc => self.cancel_input(),
            KeyCode::Backspace => {
                self.input.pop();
                self.write_through();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.write_through();
            }
            _ => {}
        }
    }

    /// Total and percentage edits apply on every keystroke
    fn write_through(&mut self) {
        match &self.mode {
            InputMode::Total => {
                self.store.set_total_amount(&self.input);
            }
            InputMode::Percentage { id } => {
                self.store.set_percentage(id, &self.input);
            }
            _ => {}
        }
    }

    fn confirm_input(&mut self) {
        match std::mem::replace(&mut self.mode, InputMode::Normal) {
            InputMode::AddGoal => match self.store.add_category(&self.input) {
                Some(id) => {
                    self.message = Some(format!("✓ Added goal {}", self.input.trim()));
                    self.select_id(&id);
                }
                None => {
                    // nothing to add yet, keep the prompt open
                    self.mode = InputMode::AddGoal;
                    return;
                }
            },
            InputMode::Rename { id } => {
                self.store.rename_category(&id, &self.input);
            }
            _ => {}
        }
        self.input.clear();
    }

    fn cancel_input(&mut self) {
        self.mode = InputMode::Normal;
        self.input.clear();
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
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

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    if !app.store.is_ready() {
        terminal.draw(|f| ui(f, app))?;
        app.store.load();
        app.clamp_selection();
    }

    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    if !app.store.is_ready() {
        render_loading(f, f.size());
        return;
    }

    let summary = app.store.summary();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Total amount input
            Constraint::Length(3), // Allocation status
            Constraint::Min(0),    // Goals + summary
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0]);
    render_total(f, chunks[1], app);
    render_status(f, chunks[2], &summary);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[3]);

    render_goals(f, content_chunks[0], app, &summary);
    render_summary(f, content_chunks[1], app, &summary);

    render_status_bar(f, chunks[4], app);
}

fn render_loading(f: &mut Frame, area: Rect) {
    let loading = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Loading your data...",
            Style::default().fg(Color::Green),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(loading, area);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "💰 Money Pot Allocator",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::styled(
            "Divide your money into different savings goals",
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  │  "),
        Span::styled("💾 Auto-save enabled", Style::default().fg(Color::Cyan)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    f.render_widget(header, area);
}

fn render_total<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let editing = app.mode == InputMode::Total;
    let raw = app.store.total_amount();

    let mut spans = vec![Span::styled(
        app.currency.clone(),
        Style::default().fg(Color::Yellow),
    )];
    spans.push(Span::raw(" "));
    if raw.is_empty() && !editing {
        spans.push(Span::styled(
            "Enter total amount (e.g., 80000)",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ));
    } else {
        spans.push(Span::styled(
            raw.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    if editing {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }

    let border = if editing { Color::Yellow } else { Color::White };
    let total = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Total Amount Available (t) "),
    );

    f.render_widget(total, area);
}

fn status_color(status: AllocationStatus) -> Color {
    match status {
        AllocationStatus::Balanced => Color::Green,
        AllocationStatus::OverAllocated => Color::Red,
        AllocationStatus::UnderAllocated => Color::Yellow,
    }
}

fn render_status(f: &mut Frame, area: Rect, summary: &AllocationSummary) {
    let line = if summary.has_total() {
        let color = status_color(summary.status);
        Line::from(vec![
            Span::styled(
                "Total Percentage Allocated: ",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{:.2}%", summary.total_percentage)),
            Span::raw("   "),
            Span::styled(
                summary.status_message(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Enter a total amount to see how it is allocated",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let status = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn render_goals<S: KeyValueStore>(
    f: &mut Frame,
    area: Rect,
    app: &mut App<S>,
    summary: &AllocationSummary,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" 📊 Money Allocation Breakdown ");

    if summary.rows.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from("  No savings goals yet. Add your first goal above!"),
            Line::from(Span::styled(
                "  Press a to add a goal",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["Goal", "Percentage", "Amount Allocated", "Share"]
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

    let editing_id = match &app.mode {
        InputMode::Percentage { id } => Some(id.as_str()),
        _ => None,
    };

    let rows = summary.rows.iter().map(|row| {
        let percentage = if editing_id == Some(row.id.as_str()) {
            Cell::from(format!("{}_ %", app.input))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            Cell::from(format!("{}%", format_percentage(row.percentage)))
        };

        let cells = vec![
            Cell::from(truncate(&row.name, 24)),
            percentage,
            Cell::from(format_money(&app.currency, row.allocated))
                .style(Style::default().fg(Color::Green)),
            Cell::from(
                summary
                    .share_line(row, &app.currency)
                    .unwrap_or_default(),
            )
            .style(Style::default().fg(Color::DarkGray)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_summary<S: KeyValueStore>(
    f: &mut Frame,
    area: Rect,
    app: &App<S>,
    summary: &AllocationSummary,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 📈 Allocation Summary ");

    if !summary.shows_breakdown() {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Set a total amount and add goals to see the summary",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(block);
        f.render_widget(hint, area);
        return;
    }

    let header = Row::new(["Goal", "Percentage", "Amount Allocated"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .style(Style::default().bg(Color::DarkGray));

    let color = status_color(summary.status);
    let mut rows: Vec<Row> = summary
        .rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(truncate(&row.name, 20)),
                Cell::from(format!("{}%", format_percentage(row.percentage))),
                Cell::from(format_money(&app.currency, row.allocated)),
            ])
        })
        .collect();

    rows.push(
        Row::new(vec![
            Cell::from("TOTAL"),
            Cell::from(format!("{:.2}%", summary.total_percentage)).style(Style::default().fg(color)),
            Cell::from(format_money(&app.currency, summary.allocated_total)),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    if let Some(label) = summary.imbalance_label() {
        rows.push(
            Row::new(vec![
                Cell::from(label),
                Cell::from(format!("{:.2}%", summary.gap_percentage())),
                Cell::from(format_money(&app.currency, summary.remaining.abs())),
            ])
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
        );
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Length(12),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let spans = match &app.mode {
        InputMode::Normal => {
            let mut spans = Vec::new();
            if let Some(message) = &app.message {
                spans.push(Span::styled(
                    format!(" {} ", message),
                    Style::default().fg(Color::Green),
                ));
                spans.push(Span::raw("|"));
            }
            spans.extend([
                Span::raw(" "),
                key("t"),
                Span::raw(" Total | "),
                key("a"),
                Span::raw(" Add | "),
                key("r"),
                Span::raw(" Rename | "),
                key("p"),
                Span::raw(" Percent | "),
                key("d"),
                Span::raw(" Delete | "),
                key("R"),
                Span::raw(" Reset | "),
                Span::styled("q", Style::default().fg(Color::Red)),
                Span::raw(" Quit"),
            ]);
            spans
        }
        InputMode::ConfirmReset => vec![Span::styled(
            " Are you sure you want to reset all data? This cannot be undone. (y/n)",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )],
        mode => {
            let prompt = match mode {
                InputMode::Total => " Total amount: ".to_string(),
                InputMode::AddGoal => " New goal (e.g., Emergency Fund, Vacation, Laptop): ".to_string(),
                InputMode::Rename { id } => {
                    let current = app
                        .store
                        .state()
                        .find(id)
                        .map(|c| c.name.clone())
                        .unwrap_or_default();
                    format!(" Rename '{}': ", current)
                }
                InputMode::Percentage { .. } => " Allocation percentage: ".to_string(),
                _ => String::new(),
            };
            let hint = match mode {
                InputMode::AddGoal if app.input.trim().is_empty() => "  (type a name, Esc cancel)",
                InputMode::AddGoal | InputMode::Rename { .. } => "  (Enter save, Esc cancel)",
                _ => "  (Enter done)",
            };
            vec![
                Span::styled(prompt, Style::default().fg(Color::Cyan)),
                Span::raw(app.input.clone()),
                Span::styled("_", Style::default().fg(Color::Yellow)),
                Span::styled(hint, Style::default().fg(Color::DarkGray)),
            ]
        }
    };

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
