use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::config::Theme;
use crate::history::SessionHistory;

/// Answered questions, most recent at the top
pub struct HistoryView<'a> {
    pub history: &'a SessionHistory,
    pub scroll: u16,
    pub focused: bool,
    pub theme: &'a Theme,
}

impl HistoryView<'_> {
    fn lines(&self) -> Vec<Line<'static>> {
        let question_style = Style::default()
            .fg(self.theme.get("primary"))
            .add_modifier(Modifier::BOLD);
        let answer_style = Style::default().fg(self.theme.get("text_primary"));
        let meta_style = Style::default().fg(self.theme.get("text_secondary"));

        let mut lines = Vec::new();
        for entry in self.history.newest_first() {
            lines.push(Line::from(vec![
                Span::styled("You: ", question_style),
                Span::styled(entry.question.clone(), question_style),
                Span::styled(
                    format!("  ({}, {})", entry.answered_at.format("%H:%M:%S"), entry.route),
                    meta_style,
                ),
            ]));
            for text in entry.answer.lines() {
                lines.push(Line::styled(format!("  {}", text), answer_style));
            }
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.theme.get("modal_border_active")
        } else {
            self.theme.get("modal_border")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!("Chat History ({})", self.history.len()));

        if self.history.is_empty() {
            Paragraph::new("No questions answered yet")
                .style(Style::default().fg(self.theme.get("text_secondary")))
                .block(block)
                .render(area, buf);
            return;
        }

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(area, buf);
    }
}
