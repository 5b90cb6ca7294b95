use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod agent;
pub mod chart_data;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error_display;
pub mod fast_path;
mod help_strings;
pub mod history;
pub mod loader;
pub mod logging;
pub mod router;
pub mod session;
pub mod widgets;

pub use agent::{QueryAgent, SqlAgent};
pub use cli::{Args, CompressionFormat, SampleFile};
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use dataset::Dataset;
pub use loader::{DataSource, LoadError, LoadOptions, UploadedFile};
pub use router::Route;
pub use session::{Answer, QueryError, QueryOutcome, Session, SessionSettings};

use dataset::TablePreview;
use error_display::{user_message_from_load, user_message_from_polars};
use widgets::answer::AnswerView;
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::history::HistoryView;
use widgets::preview::DatasetPreview;
use widgets::sidebar::Sidebar;
use widgets::text_input::{TextInput, TextInputEvent};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "supplychat";

pub const TITLE: &str = "AI Supply Chain ChatBot";
pub const SUBTITLE: &str =
    "Upload your CSV or choose a sample. Ask smart questions. Get charts + insights.";
pub const QUERY_PLACEHOLDER: &str = "e.g. What are the top 5 SKUs by units sold?";

/// What to load; paths are read from disk when the load runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Sample(SampleFile),
    Path(PathBuf),
    Upload(UploadedFile),
}

impl LoadRequest {
    pub fn name(&self) -> String {
        match self {
            LoadRequest::Sample(sample) => sample.label().to_string(),
            LoadRequest::Path(path) => path.display().to_string(),
            LoadRequest::Upload(file) => file.name.clone(),
        }
    }
}

pub enum AppEvent {
    Key(KeyEvent),
    Load(LoadRequest),
    DoLoad(LoadRequest), // Internal event to actually perform loading after UI update
    ClearDataset,
    Submit(String),
    DoSubmit(String), // Internal event to call the handler after "Thinking..." is drawn
    Exit,
    Resize(u16, u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Samples,
    Upload,
    Query,
    History,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BusyState {
    #[default]
    Idle,
    Loading(String),
    Thinking,
}

impl BusyState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, BusyState::Idle)
    }
}

pub struct App {
    session: Session,
    theme: Theme,
    preview_rows: usize,
    focus: Focus,
    selected_sample: usize,
    use_sample: bool,
    upload_input: TextInput,
    query_input: TextInput,
    last_upload: Option<UploadedFile>,
    preview: Option<TablePreview>,
    load_error: Option<String>,
    last_outcome: Option<QueryOutcome>,
    busy: BusyState,
    history_scroll: u16,
    show_help: bool,
    debug: DebugState,
}

impl App {
    pub fn with_session(config: &AppConfig, theme: Theme, session: Session) -> App {
        let upload_input = TextInput::new()
            .with_placeholder("path/to/file.csv")
            .with_theme(&theme);
        let query_input = TextInput::new()
            .with_placeholder(QUERY_PLACEHOLDER)
            .with_theme(&theme);

        App {
            session,
            theme,
            preview_rows: config.display.preview_rows,
            focus: Focus::Samples,
            selected_sample: 0,
            use_sample: false,
            upload_input,
            query_input,
            last_upload: None,
            preview: None,
            load_error: None,
            last_outcome: None,
            busy: BusyState::Idle,
            history_scroll: 0,
            show_help: false,
            debug: DebugState {
                enabled: config.debug.enabled,
                ..DebugState::default()
            },
        }
    }

    /// Select a sample in the sidebar without loading it
    pub fn select_sample(&mut self, sample: SampleFile) {
        if let Some(index) = SampleFile::ALL.iter().position(|s| *s == sample) {
            self.selected_sample = index;
        }
    }

    /// Set the checkbox without triggering a load
    pub fn set_use_sample(&mut self, use_sample: bool) {
        self.use_sample = use_sample;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn selected_sample(&self) -> SampleFile {
        SampleFile::ALL[self.selected_sample.min(SampleFile::ALL.len() - 1)]
    }

    pub fn use_sample(&self) -> bool {
        self.use_sample
    }

    pub fn busy(&self) -> &BusyState {
        &self.busy
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn last_outcome(&self) -> Option<&QueryOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn query_text(&self) -> &str {
        self.query_input.value()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// The query input exists only while a dataset is loaded
    pub fn query_input_visible(&self) -> bool {
        self.session.accepts_queries()
    }

    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Samples];
        if !self.use_sample {
            order.push(Focus::Upload);
        }
        if self.query_input_visible() {
            order.push(Focus::Query);
        }
        order.push(Focus::History);
        order
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.upload_input.set_focused(focus == Focus::Upload);
        self.query_input.set_focused(focus == Focus::Query);
    }

    fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let current = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.set_focus(order[next]);
    }

    /// Move focus off panels that are no longer shown
    fn fix_focus(&mut self) {
        if !self.focus_order().contains(&self.focus) {
            self.set_focus(Focus::Samples);
        }
    }

    /// Load for the checkbox's new state: the selected sample, else the last
    /// upload, else nothing.
    fn reload_for_checkbox(&self) -> AppEvent {
        if self.use_sample {
            AppEvent::Load(LoadRequest::Sample(self.selected_sample()))
        } else {
            match &self.last_upload {
                Some(file) => AppEvent::Load(LoadRequest::Upload(file.clone())),
                None => AppEvent::ClearDataset,
            }
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && event.code == KeyCode::Char('c') {
            return Some(AppEvent::Exit);
        }
        if ctrl && event.code == KeyCode::Char('h') {
            self.show_help = !self.show_help;
            return None;
        }
        if self.show_help {
            if matches!(event.code, KeyCode::Esc | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return None;
        }
        if self.busy.is_busy() {
            return None;
        }

        match event.code {
            KeyCode::Tab => {
                self.cycle_focus(true);
                return None;
            }
            KeyCode::BackTab => {
                self.cycle_focus(false);
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Samples => self.samples_key(event),
            Focus::Upload => match self.upload_input.handle_key(event) {
                TextInputEvent::Submit => {
                    let path = self.upload_input.value().trim().to_string();
                    if path.is_empty() {
                        None
                    } else {
                        Some(AppEvent::Load(LoadRequest::Path(PathBuf::from(path))))
                    }
                }
                TextInputEvent::Cancel => {
                    self.set_focus(Focus::Samples);
                    None
                }
                TextInputEvent::None => None,
            },
            Focus::Query => match self.query_input.handle_key(event) {
                TextInputEvent::Submit => Some(AppEvent::Submit(self.query_input.value().to_string())),
                TextInputEvent::Cancel => {
                    self.set_focus(Focus::History);
                    None
                }
                TextInputEvent::None => None,
            },
            Focus::History => self.history_key(event),
        }
    }

    fn samples_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        let count = SampleFile::ALL.len();
        let previous = self.selected_sample;
        match event.code {
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_sample = (self.selected_sample + count - 1) % count;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_sample = (self.selected_sample + 1) % count;
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.use_sample = !self.use_sample;
                return Some(self.reload_for_checkbox());
            }
            _ => return None,
        }
        if self.use_sample && self.selected_sample != previous {
            return Some(AppEvent::Load(LoadRequest::Sample(self.selected_sample())));
        }
        None
    }

    fn history_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.history_scroll = self.history_scroll.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.history_scroll = self.history_scroll.saturating_add(1)
            }
            KeyCode::PageUp => self.history_scroll = self.history_scroll.saturating_sub(10),
            KeyCode::PageDown => self.history_scroll = self.history_scroll.saturating_add(10),
            KeyCode::Home => self.history_scroll = 0,
            KeyCode::End => self.history_scroll = u16::MAX / 2,
            _ => {}
        }
        None
    }

    fn do_load(&mut self, request: &LoadRequest) {
        let started = Instant::now();
        let source = match request {
            LoadRequest::Sample(sample) => Ok(DataSource::Sample(*sample)),
            LoadRequest::Path(path) => UploadedFile::read(path).map(DataSource::Upload),
            LoadRequest::Upload(file) => Ok(DataSource::Upload(file.clone())),
        };

        // The previous dataset is gone whether or not the new one loads
        self.session.clear_dataset();
        let result = source.and_then(|source| {
            self.session.load(&source)?;
            if let DataSource::Upload(file) = source {
                self.last_upload = Some(file);
            }
            Ok(())
        });

        self.last_outcome = None;
        match result {
            Ok(()) => {
                self.load_error = None;
                self.preview = match self.session.dataset().map(|d| d.preview(self.preview_rows)) {
                    Some(Ok(preview)) => Some(preview),
                    Some(Err(e)) => {
                        self.load_error = Some(user_message_from_polars(&e));
                        None
                    }
                    None => None,
                };
                if matches!(request, LoadRequest::Path(_)) {
                    self.upload_input.clear();
                }
            }
            Err(e) => {
                tracing::warn!(source = %request.name(), error = %e, "load failed");
                self.load_error = Some(user_message_from_load(&e));
                self.preview = None;
            }
        }
        self.debug.last_load_ms = Some(started.elapsed().as_millis());
        self.fix_focus();
    }

    fn do_submit(&mut self, query: &str) {
        let started = Instant::now();
        let outcome = self.session.submit(query);
        self.debug.last_route = Some(outcome.route.to_string());
        self.debug.last_answer_ms = Some(started.elapsed().as_millis());
        if outcome.is_success() {
            self.query_input.clear();
            self.history_scroll = 0;
        }
        self.last_outcome = Some(outcome);
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Load(request) => {
                // Show the loading state first, then load after the next render
                self.busy = BusyState::Loading(request.name());
                Some(AppEvent::DoLoad(request.clone()))
            }
            AppEvent::DoLoad(request) => {
                self.do_load(request);
                self.busy = BusyState::Idle;
                None
            }
            AppEvent::ClearDataset => {
                self.session.clear_dataset();
                self.preview = None;
                self.load_error = None;
                self.last_outcome = None;
                self.fix_focus();
                None
            }
            AppEvent::Submit(query) => {
                if !self.session.accepts_queries() {
                    return None;
                }
                self.busy = BusyState::Thinking;
                Some(AppEvent::DoSubmit(query.clone()))
            }
            AppEvent::DoSubmit(query) => {
                self.do_submit(query);
                self.busy = BusyState::Idle;
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit => None,
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            Line::styled(
                TITLE,
                Style::default()
                    .fg(self.color("primary"))
                    .add_modifier(Modifier::BOLD),
            )
            .centered(),
            Line::styled(SUBTITLE, Style::default().fg(self.color("text_secondary"))).centered(),
        ];
        Paragraph::new(lines).render(area, buf);
    }

    fn render_query_input(&self, area: Rect, buf: &mut Buffer) {
        let border = if self.focus == Focus::Query {
            self.color("modal_border_active")
        } else {
            self.color("modal_border")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("Ask a Question");
        let inner = block.inner(area);
        block.render(area, buf);
        (&self.query_input).render(inner, buf);
    }

    fn render_busy(&self, area: Rect, buf: &mut Buffer) {
        let message = match &self.busy {
            BusyState::Idle => return,
            BusyState::Loading(name) => format!("Loading {}...", name),
            BusyState::Thinking => "Thinking...".to_string(),
        };
        let width = (message.chars().count() as u16 + 6).min(area.width);
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(3) / 2,
            width,
            height: 3.min(area.height),
        };
        Clear.render(popup, buf);
        Paragraph::new(message)
            .centered()
            .style(Style::default().fg(self.color("secondary")))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.color("modal_border_active"))),
            )
            .render(popup, buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let (title, text) = match self.focus {
            Focus::Query => ("Query Help", help_strings::query()),
            Focus::Upload => ("Upload Help", help_strings::upload()),
            Focus::Samples | Focus::History => ("Help", help_strings::main_view()),
        };
        let popup = centered_rect(area, 70, 80);
        Clear.render(popup, buf);
        Paragraph::new(text)
            .style(Style::default().fg(self.color("text_primary")))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.color("modal_border_active")))
                    .title(format!("{} (Esc to close)", title)),
            )
            .render(popup, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        Block::default()
            .style(Style::default().bg(self.color("background")))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Fill(1)])
            .split(layout[0]);

        Sidebar {
            selected: self.selected_sample,
            use_sample: self.use_sample,
            samples_focused: self.focus == Focus::Samples,
            upload: &self.upload_input,
            last_upload: self.last_upload.as_ref().map(|f| f.name.as_str()),
            theme: &self.theme,
        }
        .render(columns[0], buf);

        let dataset = self.session.dataset();
        let preview_height = match (dataset, &self.load_error) {
            (Some(d), _) => {
                DatasetPreview::height(self.preview_rows, !d.skipped_rows().is_empty())
            }
            (None, Some(_)) => 3,
            (None, None) => 0,
        };
        let query_height = if dataset.is_some() { 3 } else { 0 };
        let content = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(preview_height),
                Constraint::Length(query_height),
                Constraint::Fill(3),
                Constraint::Fill(2),
            ])
            .split(columns[1]);

        self.render_header(content[0], buf);

        match (dataset, &self.preview, &self.load_error) {
            (_, _, Some(error)) => {
                Paragraph::new(error.as_str())
                    .style(Style::default().fg(self.color("error")))
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL).title("Load Error"))
                    .render(content[1], buf);
            }
            (Some(dataset), Some(preview), None) => {
                DatasetPreview {
                    dataset,
                    preview,
                    theme: &self.theme,
                }
                .render(content[1], buf);
            }
            _ => {}
        }

        if dataset.is_some() {
            self.render_query_input(content[2], buf);
        }

        match &self.last_outcome {
            Some(outcome) => AnswerView {
                outcome,
                theme: &self.theme,
            }
            .render(content[3], buf),
            None => {
                let hint = if dataset.is_some() {
                    "Press Tab to reach the question box, type a question and press Enter."
                } else {
                    "Choose a sample in the sidebar or type the path of a CSV file to upload."
                };
                Paragraph::new(hint)
                    .style(Style::default().fg(self.color("text_secondary")))
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL).title("Answer"))
                    .render(content[3], buf);
            }
        }

        HistoryView {
            history: self.session.history(),
            scroll: self.history_scroll,
            focused: self.focus == Focus::History,
            theme: &self.theme,
        }
        .render(content[4], buf);

        let controls = Controls::new(self.focus)
            .with_row_count(dataset.map(|d| d.height()))
            .with_dimmed(self.busy.is_busy())
            .with_colors(self.color("primary"), self.color("controls_bg"));
        (&controls).render(layout[1], buf);

        if self.debug.enabled {
            (&self.debug).render(layout[2], buf);
        }

        self.render_busy(area, buf);
        if self.show_help {
            self.render_help(area, buf);
        }
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
