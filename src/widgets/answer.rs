use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};

use super::chart::{LineChartView, TopSkusBars};
use crate::config::Theme;
use crate::error_display::{user_message_from_chart, user_message_from_query};
use crate::fast_path::TopSkus;
use crate::session::{Answer, QueryOutcome};

/// Result of the most recent question: the answer, its table or chart, or the error
pub struct AnswerView<'a> {
    pub outcome: &'a QueryOutcome,
    pub theme: &'a Theme,
}

impl AnswerView<'_> {
    fn block(&self) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("modal_border")))
            .title(format!("Answer ({})", self.outcome.route))
    }

    fn heading(&self) -> Line<'static> {
        match &self.outcome.result {
            Ok(_) => Line::from(vec![
                Span::styled(
                    "Answer: ",
                    Style::default()
                        .fg(self.theme.get("success"))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    self.outcome.query.clone(),
                    Style::default().fg(self.theme.get("text_secondary")),
                ),
            ]),
            Err(e) => Line::styled(
                format!("Error: {}", user_message_from_query(e)),
                Style::default().fg(self.theme.get("error")),
            ),
        }
    }

    fn render_top_skus(&self, top: &TopSkus, area: Rect, buf: &mut Buffer) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Fill(1)])
            .split(area);

        let header = Row::new([
            Cell::from(top.key_column.clone()),
            Cell::from(top.quantity_column.clone()),
        ])
        .style(
            Style::default()
                .fg(self.theme.get("table_header"))
                .add_modifier(Modifier::BOLD),
        );
        let rows = top
            .display_rows()
            .into_iter()
            .map(|[key, total]| Row::new([Cell::from(key), Cell::from(total)]));
        Table::new(rows, [Constraint::Length(16), Constraint::Length(16)])
            .header(header)
            .style(Style::default().fg(self.theme.get("text_primary")))
            .render(columns[0], buf);

        if !top.is_empty() {
            TopSkusBars {
                top,
                theme: self.theme,
            }
            .render(columns[1], buf);
        }
    }

    fn render_text(&self, text: &str, area: Rect, buf: &mut Buffer) {
        let text_paragraph = Paragraph::new(text.to_string())
            .style(Style::default().fg(self.theme.get("text_primary")))
            .wrap(Wrap { trim: false });

        match &self.outcome.chart {
            None => text_paragraph.render(area, buf),
            Some(Ok(chart)) => {
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Fill(1), Constraint::Fill(2)])
                    .split(area);
                text_paragraph.render(parts[0], buf);
                LineChartView {
                    chart,
                    theme: self.theme,
                }
                .render(parts[1], buf);
            }
            Some(Err(e)) => {
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Fill(1), Constraint::Length(1)])
                    .split(area);
                text_paragraph.render(parts[0], buf);
                Paragraph::new(user_message_from_chart(e))
                    .style(Style::default().fg(self.theme.get("warning")))
                    .render(parts[1], buf);
            }
        }
    }
}

impl Widget for AnswerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Fill(1)])
            .split(inner);
        Paragraph::new(self.heading())
            .wrap(Wrap { trim: true })
            .render(layout[0], buf);

        match &self.outcome.result {
            Ok(Answer::TopSkus(top)) => self.render_top_skus(top, layout[1], buf),
            Ok(Answer::Text(text)) => self.render_text(text, layout[1], buf),
            Err(_) => {}
        }
    }
}
