use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::config::Theme;

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    Submit,
    Cancel,
}

/// Single-line text input wrapping tui-textarea
pub struct TextInput {
    textarea: TextArea<'static>,
    placeholder: String,
    text_color: Option<Color>,
    placeholder_color: Option<Color>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut widget = Self {
            textarea: TextArea::default(),
            placeholder: String::new(),
            text_color: None,
            placeholder_color: None,
            focused: false,
        };
        widget.apply_style();
        widget
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self.apply_style();
        self
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_color = Some(theme.get("text_primary"));
        self.placeholder_color = Some(theme.get("text_secondary"));
        self.apply_style();
        self
    }

    /// Re-apply styling; a fresh TextArea forgets it
    fn apply_style(&mut self) {
        let mut style = Style::default();
        if let Some(color) = self.text_color {
            style = style.fg(color);
        }
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea.set_placeholder_text(self.placeholder.clone());
        if let Some(color) = self.placeholder_color {
            self.textarea
                .set_placeholder_style(Style::default().fg(color));
        }
        self.set_focused(self.focused);
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused {
            self.textarea
                .set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        } else {
            // Same style as the text hides the cursor
            let style = self.textarea.style();
            self.textarea.set_cursor_style(style);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn value(&self) -> &str {
        self.textarea
            .lines()
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, value: &str) {
        let single_line = value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![single_line]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear(&mut self) {
        self.textarea = TextArea::default();
        self.apply_style();
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => TextInputEvent::Submit,
            KeyCode::Esc => TextInputEvent::Cancel,
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab => TextInputEvent::None,
            _ => {
                let input = key_event_to_input(event);
                if !matches!(input.key, Key::Char('\n') | Key::Char('\r') | Key::Null) {
                    self.textarea.input(input);
                }
                TextInputEvent::None
            }
        }
    }
}

fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => Key::Null,
    };
    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut TextInput, code: KeyCode) -> TextInputEvent {
        input.handle_key(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_typing_and_editing() {
        let mut input = TextInput::new();
        for c in "top skus".chars() {
            press(&mut input, KeyCode::Char(c));
        }
        assert_eq!(input.value(), "top skus");
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.value(), "top sku");
        assert_eq!(press(&mut input, KeyCode::Enter), TextInputEvent::Submit);
        assert_eq!(input.value(), "top sku");
    }

    #[test]
    fn test_set_value_is_single_line() {
        let mut input = TextInput::new();
        input.set_value("a\nb");
        assert_eq!(input.value(), "a b");
        input.clear();
        assert!(input.is_empty());
    }

    #[test]
    fn test_escape_cancels() {
        let mut input = TextInput::new();
        assert_eq!(press(&mut input, KeyCode::Esc), TextInputEvent::Cancel);
    }
}
