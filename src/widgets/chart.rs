use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    symbols,
    text::Span,
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, LegendPosition,
        Widget,
    },
};

use crate::chart_data::{axis_labels, bar_values, LineChart};
use crate::config::Theme;
use crate::fast_path::TopSkus;

/// Every numeric column of the dataset against row position
pub struct LineChartView<'a> {
    pub chart: &'a LineChart,
    pub theme: &'a Theme,
}

impl Widget for LineChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let datasets: Vec<Dataset> = self
            .chart
            .series
            .iter()
            .enumerate()
            .map(|(i, series)| {
                Dataset::default()
                    .name(series.name.as_str())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(theme.series(i)))
                    .data(&series.points)
            })
            .collect();

        let label_style = Style::default().fg(theme.get("text_primary"));
        let labels = |bounds| {
            axis_labels(bounds)
                .into_iter()
                .map(|label| Span::styled(label, label_style))
                .collect::<Vec<_>>()
        };

        let x_axis = Axis::default()
            .title("row")
            .bounds(self.chart.x_bounds)
            .style(Style::default().fg(theme.get("dimmed")))
            .labels(labels(self.chart.x_bounds));
        let y_axis = Axis::default()
            .bounds(self.chart.y_bounds)
            .style(Style::default().fg(theme.get("dimmed")))
            .labels(labels(self.chart.y_bounds));

        Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.get("modal_border")))
                    .title("Chart"),
            )
            .x_axis(x_axis)
            .y_axis(y_axis)
            .legend_position(Some(LegendPosition::TopRight))
            .render(area, buf);
    }
}

/// Fast-path ranking as vertical bars labelled by key
pub struct TopSkusBars<'a> {
    pub top: &'a TopSkus,
    pub theme: &'a Theme,
}

impl Widget for TopSkusBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let values = bar_values(self.top);
        let bars: Vec<Bar> = values
            .iter()
            .map(|(key, value)| {
                Bar::default()
                    .value(*value)
                    .label(key.as_str().into())
                    .style(Style::default().fg(theme.get("primary")))
                    .value_style(Style::default().fg(theme.get("text_primary")).reversed())
            })
            .collect();

        let inner_width = area.width.saturating_sub(2);
        let count = bars.len().max(1) as u16;
        let bar_width = (inner_width.saturating_sub(count) / count).clamp(3, 12);

        BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.get("modal_border")))
                    .title(format!(
                        "{} by {}",
                        self.top.quantity_column, self.top.key_column
                    )),
            )
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .render(area, buf);
    }
}
