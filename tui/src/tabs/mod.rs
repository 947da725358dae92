pub mod findings;
pub mod summary;

use crossterm::event::KeyCode;
use ratatui::{layout::Rect, Frame};

/// A page of the report viewer.
pub trait Tab {
    /// Title shown in the tab bar.
    fn title(&self) -> &'static str;

    fn render(&mut self, f: &mut Frame, area: Rect);

    /// Handle a key press. Return `true` if the key was consumed.
    fn handle_key(&mut self, _key: KeyCode) -> bool {
        false
    }

    fn handle_click(&mut self, _col: u16, _row: u16) {}

    fn handle_scroll_down(&mut self) {}

    fn handle_scroll_up(&mut self) {}

    /// Called when the user switches away.
    fn on_blur(&mut self) {}
}
