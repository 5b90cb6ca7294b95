use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

use crate::Focus;

/// Key hints along the bottom of the screen, chosen by the focused panel
pub struct Controls {
    pub focus: Focus,
    pub row_count: Option<usize>,
    pub dimmed: bool,
    pub key_color: Color,
    pub bg_color: Color,
}

impl Controls {
    pub fn new(focus: Focus) -> Self {
        Self {
            focus,
            row_count: None,
            dimmed: false,
            key_color: Color::Reset,
            bg_color: Color::DarkGray,
        }
    }

    pub fn with_row_count(mut self, row_count: Option<usize>) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_colors(mut self, key_color: Color, bg_color: Color) -> Self {
        self.key_color = key_color;
        self.bg_color = bg_color;
        self
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        match self.focus {
            Focus::Samples => &[
                ("↑↓", "Select"),
                ("Space", "Use sample"),
                ("Tab", "Next"),
                ("^H", "Help"),
                ("q", "Quit"),
            ],
            Focus::Upload => &[
                ("Enter", "Load"),
                ("Esc", "Back"),
                ("Tab", "Next"),
                ("^H", "Help"),
                ("^C", "Quit"),
            ],
            Focus::Query => &[
                ("Enter", "Ask"),
                ("Esc", "Back"),
                ("Tab", "Next"),
                ("^H", "Help"),
                ("^C", "Quit"),
            ],
            Focus::History => &[
                ("↑↓", "Scroll"),
                ("Home", "Newest"),
                ("Tab", "Next"),
                ("^H", "Help"),
                ("q", "Quit"),
            ],
        }
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let hints = self.hints();

        let mut constraints = hints.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(15));
        }
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        for (i, (key, action)) in hints.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.fg(self.key_color).bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(self.bg_color))
                .render(layout[j + 1], buf);
        }

        let mut fill_start_idx = hints.len() * 2;
        if let Some(count) = self.row_count {
            Paragraph::new(format!("Rows: {}", count))
                .style(base_style.bg(self.bg_color))
                .right_aligned()
                .render(layout[fill_start_idx], buf);
            fill_start_idx += 1;
        }

        Paragraph::new("")
            .style(base_style.bg(self.bg_color))
            .render(layout[fill_start_idx], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_follow_focus() {
        let quit_outside_inputs = |focus| {
            Controls::new(focus)
                .hints()
                .iter()
                .any(|(key, action)| *key == "q" && *action == "Quit")
        };
        assert!(quit_outside_inputs(Focus::Samples));
        assert!(quit_outside_inputs(Focus::History));
        assert!(!quit_outside_inputs(Focus::Query));
        assert!(!quit_outside_inputs(Focus::Upload));
    }
}
