use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::config::Theme;
use crate::dataset::{Dataset, TablePreview};

/// Width cap for a preview column, in characters
const MAX_COLUMN_WIDTH: usize = 24;

/// The first rows of the loaded dataset with its shape and load warnings
pub struct DatasetPreview<'a> {
    pub dataset: &'a Dataset,
    pub preview: &'a TablePreview,
    pub theme: &'a Theme,
}

impl DatasetPreview<'_> {
    /// Rows needed to draw a preview of `preview_rows` rows
    pub fn height(preview_rows: usize, has_warning: bool) -> u16 {
        // borders + header + rows + shape line
        preview_rows as u16 + 4 + u16::from(has_warning)
    }

    fn column_widths(&self) -> Vec<Constraint> {
        self.preview
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let widest = self
                    .preview
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(1);
                Constraint::Length(widest.min(MAX_COLUMN_WIDTH) as u16)
            })
            .collect()
    }
}

impl Widget for DatasetPreview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("modal_border")))
            .title(format!("Preview of Uploaded Data: {}", self.dataset.source()));
        let inner = block.inner(area);
        block.render(area, buf);

        let skipped = self.dataset.skipped_rows();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(u16::from(!skipped.is_empty())),
            ])
            .split(inner);

        let header = Row::new(
            self.preview
                .headers
                .iter()
                .map(|h| Cell::from(h.as_str())),
        )
        .style(
            Style::default()
                .fg(self.theme.get("table_header"))
                .add_modifier(Modifier::BOLD),
        );
        let rows = self.preview.rows.iter().map(|row| {
            Row::new(row.iter().map(|cell| Cell::from(cell.as_str())))
                .style(Style::default().fg(self.theme.get("text_primary")))
        });
        Table::new(rows, self.column_widths())
            .header(header)
            .column_spacing(2)
            .render(layout[0], buf);

        Paragraph::new(Line::from(format!(
            "{} rows x {} columns, {}",
            self.dataset.height(),
            self.dataset.width(),
            self.dataset.encoding()
        )))
        .style(Style::default().fg(self.theme.get("text_secondary")))
        .render(layout[1], buf);

        if let Some(first) = skipped.first() {
            Paragraph::new(format!(
                "Skipped {} malformed row(s); first at {}",
                skipped.len(),
                first
            ))
            .style(Style::default().fg(self.theme.get("warning")))
            .render(layout[2], buf);
        }
    }
}
