use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget},
};

use super::text_input::TextInput;
use crate::cli::SampleFile;
use crate::config::Theme;

/// Sample picker, the "use sample" checkbox, and the upload path field
pub struct Sidebar<'a> {
    pub selected: usize,
    pub use_sample: bool,
    pub samples_focused: bool,
    pub upload: &'a TextInput,
    pub last_upload: Option<&'a str>,
    pub theme: &'a Theme,
}

impl Sidebar<'_> {
    fn border_style(&self, focused: bool) -> Style {
        let color = if focused {
            self.theme.get("modal_border_active")
        } else {
            self.theme.get("modal_border")
        };
        Style::default().fg(color)
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let outer = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("dimmed")))
            .title("Sample Data or Upload Your Own");
        let inner = outer.inner(area);
        outer.render(area, buf);

        let upload_height = if self.use_sample { 0 } else { 5 };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(SampleFile::ALL.len() as u16 + 4),
                Constraint::Length(upload_height),
                Constraint::Fill(1),
            ])
            .split(inner);

        let samples_block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(self.samples_focused))
            .title("Choose a sample CSV");
        let samples_inner = samples_block.inner(layout[0]);
        samples_block.render(layout[0], buf);

        let text_primary = self.theme.get("text_primary");
        let items: Vec<ListItem> = SampleFile::ALL
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let (marker, style) = if i == self.selected {
                    (
                        "> ",
                        Style::default()
                            .fg(self.theme.get("primary"))
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    ("  ", Style::default().fg(text_primary))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(sample.label(), style),
                ]))
            })
            .collect();

        let list_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(SampleFile::ALL.len() as u16),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(samples_inner);
        List::new(items).render(list_layout[0], buf);

        let checkbox = if self.use_sample { "[x]" } else { "[ ]" };
        Paragraph::new(format!("{} Use selected sample file", checkbox))
            .style(Style::default().fg(if self.use_sample {
                self.theme.get("success")
            } else {
                text_primary
            }))
            .render(list_layout[2], buf);

        if !self.use_sample {
            let upload_block = Block::default()
                .borders(Borders::ALL)
                .border_style(self.border_style(self.upload.is_focused()))
                .title("Upload your own CSV");
            let upload_inner = upload_block.inner(layout[1]);
            upload_block.render(layout[1], buf);

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Fill(1)])
                .split(upload_inner);
            self.upload.render(rows[0], buf);
            if let Some(name) = self.last_upload {
                Paragraph::new(format!("Last upload: {}", name))
                    .style(Style::default().fg(self.theme.get("text_secondary")))
                    .render(rows[2], buf);
            }
        }
    }
}
