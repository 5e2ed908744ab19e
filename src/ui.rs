use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use migration_dashboard::{
    choropleth::strip_state_suffix, format_thousands, search, AssistantReply, Dashboard,
    DashboardPage, Direction as MigrationDirection, InteractionRow, MapFigure, SummaryCard,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row,
        Table, TableState, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use tracing::info;

const PAGE_STEP: isize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Interactions,
    TopCounties,
    Regional,
    Explorer,
    Ask,
}

impl Page {
    const ALL: [Page; 5] = [
        Page::Interactions,
        Page::TopCounties,
        Page::Regional,
        Page::Explorer,
        Page::Ask,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::Interactions => Page::TopCounties,
            Page::TopCounties => Page::Regional,
            Page::Regional => Page::Explorer,
            Page::Explorer => Page::Ask,
            Page::Ask => Page::Interactions,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Interactions => Page::Ask,
            Page::TopCounties => Page::Interactions,
            Page::Regional => Page::TopCounties,
            Page::Explorer => Page::Regional,
            Page::Ask => Page::Explorer,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Interactions => "Interactions",
            Page::TopCounties => "Top Counties",
            Page::Regional => "NY Metro",
            Page::Explorer => "County Explorer",
            Page::Ask => "Ask",
        }
    }
}

/// Keys go to a text field instead of navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    dashboard: Dashboard,
    pub page: DashboardPage,
    pub current_page: Page,
    pub input_mode: InputMode,
    pub interactions: Vec<InteractionRow>,
    pub search_query: String,
    pub interactions_state: TableState,
    pub top_state: TableState,
    pub selector_state: ListState,
    pub question: String,
    pub reply: Option<AssistantReply>,
    pub status: Option<String>,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Result<Self> {
        let page = dashboard.render(None)?;

        let mut interactions_state = TableState::default();
        if !page.interactions.is_empty() {
            interactions_state.select(Some(0));
        }

        let mut top_state = TableState::default();
        top_state.select(Some(0));

        let mut selector_state = ListState::default();
        selector_state.select(page.selector.selected_index);

        Ok(Self {
            dashboard,
            interactions: page.interactions.to_vec(),
            page,
            current_page: Page::Interactions,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            interactions_state,
            top_state,
            selector_state,
            question: String::new(),
            reply: None,
            status: None,
        })
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn apply_search(&mut self) {
        self.interactions = if self.search_query.trim().is_empty() {
            self.page.interactions.to_vec()
        } else {
            search(&self.page.interactions, &self.search_query)
        };

        let first = if self.interactions.is_empty() { None } else { Some(0) };
        self.interactions_state.select(first);
        self.status = Some(format!("{} matching pairs", self.interactions.len()));
    }

    /// Re-render the whole page for the highlighted county
    pub fn select_county(&mut self) {
        let name = match self
            .selector_state
            .selected()
            .and_then(|idx| self.page.selector.options.get(idx))
        {
            Some(name) => name.clone(),
            None => return,
        };

        self.rerender(Some(&name));
    }

    /// Drop every memoized result and render again
    pub fn reload(&mut self) {
        let removed = self.dashboard.cache().clear();
        info!(removed, "Cache cleared from terminal UI");
        let selected = self.page.selector.selected().map(str::to_string);
        self.rerender(selected.as_deref());
    }

    fn rerender(&mut self, county: Option<&str>) {
        match self.dashboard.render(county) {
            Ok(page) => {
                self.page = page;
                self.selector_state.select(self.page.selector.selected_index);
                self.apply_search();
                self.status = self
                    .page
                    .selector
                    .selected()
                    .map(|name| format!("Selected {}", name));
            }
            Err(e) => self.status = Some(format!("Error: {:#}", e)),
        }
    }

    pub fn submit_question(&mut self) {
        match self.dashboard.ask(&self.question) {
            Ok(reply) => self.reply = Some(reply),
            Err(e) => self.status = Some(format!("Error: {:#}", e)),
        }
    }

    pub fn start_editing(&mut self) {
        if matches!(self.current_page, Page::Interactions | Page::Ask) {
            self.input_mode = InputMode::Editing;
        }
    }

    fn input_buffer(&mut self) -> Option<&mut String> {
        match self.current_page {
            Page::Interactions => Some(&mut self.search_query),
            Page::Ask => Some(&mut self.question),
            _ => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(buffer) = self.input_buffer() {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(buffer) = self.input_buffer() {
            buffer.pop();
        }
    }

    pub fn submit_input(&mut self) {
        self.input_mode = InputMode::Normal;
        match self.current_page {
            Page::Interactions => self.apply_search(),
            Page::Ask => self.submit_question(),
            _ => {}
        }
    }

    fn list_len(&self) -> usize {
        match self.current_page {
            Page::Interactions => self.interactions.len(),
            Page::TopCounties => self
                .page
                .out_map
                .figure
                .data
                .len()
                .max(self.page.in_map.figure.data.len()),
            Page::Explorer => self.page.selector.options.len(),
            Page::Regional | Page::Ask => 0,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.list_len();
        match self.current_page {
            Page::Interactions => {
                let next = step_index(self.interactions_state.selected(), len, delta);
                self.interactions_state.select(next);
            }
            Page::TopCounties => {
                let next = step_index(self.top_state.selected(), len, delta);
                self.top_state.select(next);
            }
            Page::Explorer => {
                let next = step_index(self.selector_state.selected(), len, delta);
                self.selector_state.select(next);
            }
            Page::Regional | Page::Ask => {}
        }
    }

    pub fn jump_to(&mut self, end: bool) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let target = Some(if end { len - 1 } else { 0 });
        match self.current_page {
            Page::Interactions => self.interactions_state.select(target),
            Page::TopCounties => self.top_state.select(target),
            Page::Explorer => self.selector_state.select(target),
            Page::Regional | Page::Ask => {}
        }
    }
}

/// Single steps wrap around; page jumps clamp at the ends
fn step_index(current: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = match current {
        Some(i) => i.min(len - 1) as isize,
        None => return Some(0),
    };
    let last = len as isize - 1;
    let next = current + delta;

    let next = if delta.abs() == 1 {
        if next < 0 {
            last
        } else if next > last {
            0
        } else {
            next
        }
    } else {
        next.clamp(0, last)
    };
    Some(next as usize)
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

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        if app.input_mode == InputMode::Editing {
            match key.code {
                KeyCode::Enter => app.submit_input(),
                KeyCode::Esc => app.input_mode = InputMode::Normal,
                KeyCode::Backspace => app.pop_char(),
                KeyCode::Char(c) => app.push_char(c),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Tab => app.next_page(),
            KeyCode::BackTab => app.previous_page(),
            KeyCode::Char('/') if app.current_page == Page::Interactions => app.start_editing(),
            KeyCode::Char('e') if app.current_page == Page::Ask => app.start_editing(),
            KeyCode::Enter => match app.current_page {
                Page::Explorer => app.select_county(),
                Page::Ask => app.start_editing(),
                _ => {}
            },
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => app.reload(),
            KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
            KeyCode::PageDown => app.move_selection(PAGE_STEP),
            KeyCode::PageUp => app.move_selection(-PAGE_STEP),
            KeyCode::Home => app.jump_to(false),
            KeyCode::End => app.jump_to(true),
            _ => {}
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

    match app.current_page {
        Page::Interactions => render_interactions(f, chunks[1], app),
        Page::TopCounties => render_top_counties(f, chunks[1], app),
        Page::Regional => render_regional(f, chunks[1], app),
        Page::Explorer => render_explorer(f, chunks[1], app),
        Page::Ask => render_ask(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
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

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Pairs: {}", format_thousands(app.page.interactions.len() as i64)),
        Style::default().fg(Color::White),
    ));
    if let Some(county) = &app.page.county {
        let net = county.summary.net();
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("{} net {}", county.name, county.cards[2].value),
            Style::default().fg(if net >= 0 { Color::Green } else { Color::Red }),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", app.page.title)),
    );

    f.render_widget(header, area);
}

fn render_interactions(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let editing = app.input_mode == InputMode::Editing;
    let search = Paragraph::new(Line::from(vec![
        Span::styled(" Search: ", header_style()),
        Span::raw(app.search_query.clone()),
        if editing { Span::styled("▏", Style::default().fg(Color::Yellow)) } else { Span::raw("") },
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::White })),
    );
    f.render_widget(search, chunks[0]);

    let header = Row::new(
        ["County", "County", "Interactions"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.interactions.iter().map(|row| {
        Row::new(vec![
            Cell::from(truncate(&row.name1, 40)),
            Cell::from(truncate(&row.name2, 40)),
            Cell::from(format!("{:>12}", format_thousands(row.count as i64)))
                .style(Style::default().fg(Color::Cyan)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(42),
            Constraint::Length(42),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" County pairs with the most interaction (by exemption) "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.interactions_state);
}

fn direction_color(direction: MigrationDirection) -> Color {
    match direction {
        MigrationDirection::Out => Color::Red,
        MigrationDirection::In => Color::Green,
    }
}

fn map_table<'a>(figure: &'a MapFigure, total: usize) -> Table<'a> {
    let color = direction_color(figure.direction);
    let peak = figure.max_migration();

    let header = Row::new(
        ["#", "County", "Migration", ""]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray));

    let rows = figure.data.iter().enumerate().map(move |(i, point)| {
        let share = if peak == 0 { 0.0 } else { point.migration as f64 / peak as f64 };
        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(truncate(&point.name, 30)),
            Cell::from(format!("{:>10}", format_thousands(point.migration as i64))),
            Cell::from(share_bar(share, 12)).style(Style::default().fg(color)),
        ])
    });

    Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(31),
            Constraint::Length(11),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(
                " {} ({} located of {}) ",
                figure.title,
                figure.data.len(),
                total
            )),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
}

fn render_top_counties(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let out_table = map_table(&app.page.out_map.figure, app.page.out_map.table.len());
    let in_table = map_table(&app.page.in_map.figure, app.page.in_map.table.len());

    let mut in_state = app.top_state.clone();
    f.render_stateful_widget(out_table, chunks[0], &mut app.top_state);
    f.render_stateful_widget(in_table, chunks[1], &mut in_state);
}

fn render_regional(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let series = &app.page.bar_chart.series;
    let legend: Vec<Span> = series
        .iter()
        .flat_map(|s| {
            vec![
                Span::styled("■ ", Style::default().fg(hex_color(s.color))),
                Span::raw(format!("{}   ", s.name)),
            ]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(legend)), chunks[0]);

    let mut chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", app.page.bar_chart.title)),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);

    for (idx, county) in app.page.bar_chart.categories.iter().enumerate() {
        let bars: Vec<Bar> = series
            .iter()
            .map(|s| {
                let value = s.values.get(idx).copied().unwrap_or(0);
                Bar::default()
                    .value(value)
                    .text_value(format_thousands(value as i64))
                    .style(Style::default().fg(hex_color(s.color)))
            })
            .collect();

        chart = chart.data(
            BarGroup::default()
                .label(Line::from(truncate(county, 28)))
                .bars(&bars),
        );
    }

    f.render_widget(chart, chunks[1]);
}

fn render_card(f: &mut Frame, area: Rect, card: &SummaryCard) {
    let color = hex_color(card.color);
    let content = vec![
        Line::from(Span::styled(
            card.value.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(card.caption, Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", card.title)),
    );
    f.render_widget(paragraph, area);
}

fn render_explorer(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    let items: Vec<ListItem> = app
        .page
        .selector
        .options
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let style = if Some(idx) == app.page.selector.selected_index {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(name.clone()).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Select a County "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");
    f.render_stateful_widget(list, chunks[0], &mut app.selector_state);

    let county = match &app.page.county {
        Some(county) => county,
        None => {
            let empty = Paragraph::new("No county selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            );
            f.render_widget(empty, chunks[1]);
            return;
        }
    };

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Cards
            Constraint::Min(0),    // Destinations
            Constraint::Length(5), // Choropleth framing
        ])
        .split(chunks[1]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(right[0]);
    for (card, area) in county.cards.iter().zip(cards.iter()) {
        render_card(f, *area, card);
    }

    let header = Row::new(
        ["County", "Interactions", ""]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray));

    let rows = county.destinations.iter().map(|row| {
        Row::new(vec![
            Cell::from(truncate(&row.name, 36)),
            Cell::from(format!("{:>10}", format_thousands(row.count as i64))),
            Cell::from(share_bar(row.share, 20)).style(Style::default().fg(Color::Blue)),
        ])
    });

    let destinations = Table::new(
        rows,
        [
            Constraint::Length(37),
            Constraint::Length(12),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Selected County: {} ", county.name)),
    );
    f.render_widget(destinations, right[1]);

    let choropleth = &county.choropleth;
    let framing = match choropleth.view.center() {
        Some(center) => format!(
            "centered on {:.4}, {:.4} (projection scale {})",
            center.lat, center.lon, migration_dashboard::choropleth::CENTERED_PROJECTION_SCALE
        ),
        None => format!(
            "default framing (no polygon named '{}')",
            strip_state_suffix(&county.name)
        ),
    };
    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" Shaded counties: ", header_style()),
            Span::raw(format!("{}", choropleth.locations.len())),
        ]),
        Line::from(vec![
            Span::styled(" Framing: ", header_style()),
            Span::raw(framing),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Choropleth "),
    );
    f.render_widget(info, right[2]);
}

fn render_ask(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let editing = app.input_mode == InputMode::Editing;
    let input = Paragraph::new(app.question.clone())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::White }))
                .title(" Enter your question here: "),
        );
    f.render_widget(input, chunks[0]);

    let (text, color, title) = match &app.reply {
        Some(AssistantReply::Answered { text }) => (text.clone(), Color::Green, " Answer "),
        Some(AssistantReply::Failed { reason }) => (reason.clone(), Color::Red, " Failed "),
        None => (
            "Press Enter to type a question, Enter again to get an answer.".to_string(),
            Color::DarkGray,
            " Answer ",
        ),
    };

    let reply = Paragraph::new(text)
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        );
    f.render_widget(reply, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    let position = match app.current_page {
        Page::Interactions => Some((app.interactions_state.selected(), app.interactions.len())),
        Page::TopCounties => Some((app.top_state.selected(), app.list_len())),
        Page::Explorer => Some((app.selector_state.selected(), app.page.selector.options.len())),
        Page::Regional | Page::Ask => None,
    };
    if let Some((selected, total)) = position {
        status_spans.push(Span::styled(
            format!(" Row: {}/{} ", selected.map(|i| i + 1).unwrap_or(0), total),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw(" | "));
    }

    if let Some(status) = &app.status {
        status_spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
        status_spans.push(Span::raw(" | "));
    }

    let hints: &[(&str, &str)] = match (app.input_mode, app.current_page) {
        (InputMode::Editing, _) => &[("Enter", " Submit | "), ("Esc", " Cancel")],
        (InputMode::Normal, Page::Interactions) => &[("/", " Search | "), ("Tab", " Page | "), ("q", " Quit")],
        (InputMode::Normal, Page::Explorer) => &[("Enter", " Select | "), ("Tab", " Page | "), ("q", " Quit")],
        (InputMode::Normal, Page::Ask) => &[("Enter", " Type | "), ("Tab", " Page | "), ("q", " Quit")],
        (InputMode::Normal, _) => &[("Tab", " Page | "), ("Ctrl-r", " Reload | "), ("q", " Quit")],
    };
    for (key, label) in hints {
        let color = if *key == "q" { Color::Red } else { Color::Yellow };
        status_spans.push(Span::styled(key.to_string(), Style::default().fg(color)));
        status_spans.push(Span::raw(label.to_string()));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
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

fn share_bar(share: f64, width: usize) -> String {
    let filled = (share.clamp(0.0, 1.0) * width as f64).round() as usize;
    "█".repeat(filled)
}

/// `#rrggbb` to a terminal color; named CSS colors fall back to gray
fn hex_color(hex: &str) -> Color {
    let digits = match hex.strip_prefix('#') {
        Some(digits) if digits.len() == 6 => digits,
        _ => return Color::Gray,
    };
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();

    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}
