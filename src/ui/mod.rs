//! UI rendering module for Student Hub
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod assignments;
pub mod dashboard;
pub mod grades;
pub mod help_overlay;
pub mod status_bar;

pub use assignments::render as render_assignments;
pub use dashboard::render as render_dashboard;
pub use grades::render as render_grades;
pub use help_overlay::render as render_help_overlay;

/// Color scheme shared by every view
pub(crate) mod colors {
    use ratatui::style::Color;

    /// Section headers and borders
    pub const HEADER: Color = Color::Cyan;
    /// Primary text
    pub const PRIMARY: Color = Color::White;
    /// Secondary/dimmed text
    pub const SECONDARY: Color = Color::Gray;
    /// Missing data
    pub const UNKNOWN: Color = Color::DarkGray;
    /// Key hints and highlights
    pub const ACCENT: Color = Color::Yellow;
    pub const GOOD: Color = Color::Green;
    pub const WARN: Color = Color::Yellow;
    pub const BAD: Color = Color::Red;
}

/// Color for a percentage grade
pub(crate) fn grade_color(percentage: Option<f64>) -> ratatui::style::Color {
    match percentage {
        Some(p) if p >= 90.0 => colors::GOOD,
        Some(p) if p >= 70.0 => colors::WARN,
        Some(_) => colors::BAD,
        None => colors::UNKNOWN,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use ratatui::{backend::TestBackend, Frame, Terminal};

    /// Renders into an 100x30 test terminal and returns the buffer text
    pub fn render_to_string<F: FnOnce(&mut Frame)>(draw: F) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(draw).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }
}
