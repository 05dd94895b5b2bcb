use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use production_stats::{
    sort_message, ControlsConfig, Page, SaveDataStore, Session, SessionError, StatsConfig,
    WorldHoldings,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;
use tracing::{error, info};

/// Menu actions a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleMenu,
    Sort,
    FocusSearch,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    NextPage,
    PreviousPage,
}

impl Action {
    pub fn for_key(controls: &ControlsConfig, key_name: &str) -> Option<Self> {
        let bindings = [
            (&controls.toggle_menu, Action::ToggleMenu),
            (&controls.sort, Action::Sort),
            (&controls.focus_search, Action::FocusSearch),
            (&controls.scroll_up, Action::ScrollUp),
            (&controls.scroll_down, Action::ScrollDown),
            (&controls.page_up, Action::PageUp),
            (&controls.page_down, Action::PageDown),
            (&controls.next_page, Action::NextPage),
            (&controls.previous_page, Action::PreviousPage),
        ];
        bindings
            .into_iter()
            .find(|(binding, _)| binding.matches(key_name))
            .map(|(_, action)| action)
    }
}

/// Name of a key as written in the config file.
pub fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "BackTab".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        _ => return None,
    };
    Some(name)
}

pub struct App<S: SaveDataStore> {
    pub session: Session<S>,
    pub holdings: WorldHoldings,
    controls: ControlsConfig,
    menu_open: bool,
    search_focused: bool,
    search_input: String,
    status: String,
    viewport_height: u32,
    should_quit: bool,
}

impl<S: SaveDataStore> App<S> {
    pub fn new(session: Session<S>, holdings: WorldHoldings, config: &StatsConfig) -> Self {
        Self {
            session,
            holdings,
            controls: config.controls.clone(),
            menu_open: false,
            search_focused: false,
            search_input: String::new(),
            status: String::new(),
            viewport_height: 0,
            should_quit: false,
        }
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn open_menu(&mut self) {
        let sources = self.holdings.sources();
        match self.session.show_page(Page::Inventory, &sources) {
            Ok(()) => {
                self.menu_open = true;
                self.search_input.clear();
                self.status.clear();
            }
            Err(err) => self.report("open the menu", err),
        }
    }

    pub fn close_menu(&mut self) {
        self.session.close_menu();
        self.menu_open = false;
        self.search_focused = false;
    }

    pub fn toggle_menu(&mut self) {
        if self.menu_open {
            self.close_menu();
        } else {
            self.open_menu();
        }
    }

    pub fn next_page(&mut self) {
        let sources = self.holdings.sources();
        if let Err(err) = self.session.next_page(&sources) {
            self.report("switch page", err);
        }
    }

    pub fn previous_page(&mut self) {
        let sources = self.holdings.sources();
        if let Err(err) = self.session.previous_page(&sources) {
            self.report("switch page", err);
        }
    }

    pub fn sort(&mut self) {
        match self.session.advance_sort() {
            Some(order) => self.status = sort_message(order),
            None if self.session.view().map_or(false, |v| v.is_filtering()) => {
                self.status = "Clear the search to sort".to_string();
            }
            None => {}
        }
    }

    fn update_search(&mut self) {
        self.session.set_search(&self.search_input);
    }

    fn scroll(&mut self, action: Action) {
        let viewport = self.viewport_height;
        if let Some(view) = self.session.view_mut() {
            let scroll = view.scroll_mut();
            match action {
                Action::ScrollUp => scroll.scroll_up(None),
                Action::ScrollDown => scroll.scroll_down(None),
                Action::PageUp => scroll.page_up(viewport),
                Action::PageDown => scroll.page_down(viewport),
                _ => {}
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if self.search_focused {
            match code {
                KeyCode::Esc | KeyCode::Enter => self.search_focused = false,
                KeyCode::Backspace => {
                    self.search_input.pop();
                    self.update_search();
                }
                KeyCode::Char(c) => {
                    self.search_input.push(c);
                    self.update_search();
                }
                _ => {}
            }
            return;
        }

        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            self.should_quit = true;
            return;
        }

        let Some(action) = key_name(code).and_then(|name| Action::for_key(&self.controls, &name)) else {
            return;
        };

        if !self.menu_open {
            if action == Action::ToggleMenu {
                self.open_menu();
            }
            return;
        }

        match action {
            Action::ToggleMenu => self.close_menu(),
            Action::Sort => self.sort(),
            Action::FocusSearch => self.search_focused = true,
            Action::NextPage => self.next_page(),
            Action::PreviousPage => self.previous_page(),
            Action::ScrollUp | Action::ScrollDown | Action::PageUp | Action::PageDown => {
                self.scroll(action)
            }
        }
    }

    fn report(&mut self, action: &str, err: SessionError) {
        error!(action, error = %err, "menu.failed");
        self.status = format!("Could not {}: {}", action, err);
    }
}

pub fn run_ui<S: SaveDataStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.open_menu();
    info!("ui.started");

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = %err, "ui.failed");
    }

    res
}

fn run_app<B: ratatui::backend::Backend, S: SaveDataStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.handle_key(key.code);
            if app.should_quit {
                return Ok(());
            }
        }
    }
}

fn ui<S: SaveDataStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Page tabs
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Item list
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.menu_open {
        render_search(f, chunks[1], app);
        render_table(f, chunks[2], app);
    } else {
        let toggle = app.controls.toggle_menu.0.join("/");
        let hint = Paragraph::new(Line::from(vec![
            Span::raw("Press "),
            Span::styled(toggle, Style::default().fg(Color::Yellow)),
            Span::raw(" to open the production menu"),
        ]))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(hint, chunks[2]);
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header<S: SaveDataStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let current = app.session.current_page();

    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if Some(*page) == current {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    if let Some(tracker) = app.session.tracker() {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            tracker.today().to_string(),
            Style::default().fg(Color::White),
        ));
    }

    let header = Paragraph::new(Line::from(tab_spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_search<S: SaveDataStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let border = if app.search_focused { Color::Yellow } else { Color::White };
    let mut spans = vec![Span::raw(app.search_input.clone())];
    if app.search_focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }

    let search = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Search "),
    );

    f.render_widget(search, area);
}

fn render_table<S: SaveDataStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    // Borders and the header row
    let viewport = area.height.saturating_sub(3) as u32;
    app.viewport_height = viewport;

    let Some(view) = app.session.view_mut() else {
        return;
    };
    let content_rows = view.visible().len() as u32;
    view.layout(content_rows, viewport);

    let scroll = view.scroll().clone();
    let arrows = format!(
        "{}{}",
        if scroll.can_scroll_up() { " ▲" } else { "" },
        if scroll.can_scroll_down() { " ▼" } else { "" },
    );

    let header_cells = ["Item", "Quality", "Count"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = view
        .visible()
        .iter()
        .skip(scroll.current() as usize)
        .take(viewport as usize)
        .map(|entry| {
            let count_color = if entry.count > 0 { Color::Green } else { Color::Red };
            Row::new(vec![
                Cell::from(truncate(entry.name(), 40)),
                Cell::from(entry.resource.quality.as_str()),
                Cell::from(entry.count.to_string()).style(Style::default().fg(count_color)),
            ])
            .height(1)
        });

    let table = Table::new(
        rows,
        [Constraint::Length(42), Constraint::Length(10), Constraint::Length(10)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ({}){} ", view.title(), view.visible().len(), arrows)),
    );

    f.render_widget(table, area);
}

fn render_status_bar<S: SaveDataStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut status_spans = vec![];

    if let Some(view) = app.session.view() {
        let sort_label = if view.is_filtering() {
            "by match".to_string()
        } else {
            view.sort_order().description().to_string()
        };
        status_spans.push(Span::styled(
            format!(" Sort: {} ", sort_label),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw(" | "));
    }

    if !app.status.is_empty() {
        status_spans.push(Span::styled(app.status.clone(), Style::default().fg(Color::Green)));
        status_spans.push(Span::raw(" | "));
    }

    let hints = [
        (app.controls.sort.0.join("/"), " Sort | "),
        (app.controls.focus_search.0.join("/"), " Search | "),
        (
            format!("{}/{}", app.controls.previous_page.0.join("/"), app.controls.next_page.0.join("/")),
            " Page | ",
        ),
        (app.controls.toggle_menu.0.join("/"), " Menu | "),
    ];
    for (key, label) in hints {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
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
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
