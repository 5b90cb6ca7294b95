use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub last_key_event_name: String,
    /// Route taken by the last submitted question
    pub last_route: Option<String>,
    pub last_load_ms: Option<u128>,
    pub last_answer_ms: Option<u128>,
    pub enabled: bool,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let ms = |v: Option<u128>| v.map_or_else(|| "-".to_string(), |v| format!("{v}ms"));
        Paragraph::new(format!(
            "events={} keys={} last_key={} frames={} route={} load={} answer={}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.num_frames,
            self.last_route.as_deref().unwrap_or("-"),
            ms(self.last_load_ms),
            ms(self.last_answer_ms),
        ))
        .render(area, buf);
    }
}
