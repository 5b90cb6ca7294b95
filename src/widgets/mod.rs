pub mod answer;
pub mod chart;
pub mod controls;
pub mod debug;
pub mod history;
pub mod preview;
pub mod sidebar;
pub mod text_input;
