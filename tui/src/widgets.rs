use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Return `true` when (`col`, `row`) falls inside `area`.
pub fn in_area(col: u16, row: u16, area: Rect) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

/// Index of the bordered-list row under `row`, if any.
pub fn row_index(row: u16, area: Rect, len: usize) -> Option<usize> {
    let first = area.y + 1;
    if row < first {
        return None;
    }
    let idx = (row - first) as usize;
    (idx < len).then_some(idx)
}

/// Advance the selection in a list, wrapping around.
pub fn list_next(state: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let i = state.selected().map_or(0, |i| (i + 1) % len);
    state.select(Some(i));
}

/// Move the selection backwards in a list, wrapping around.
pub fn list_previous(state: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let i = state.selected().map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
    state.select(Some(i));
}

/// `Label: value` with a bold label.
pub fn field<'a>(label: &'a str, value: impl Into<Span<'a>>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
        value.into(),
    ])
}

/// Single-line text input that filters a list as the user types.
#[derive(Default)]
pub struct SearchBox {
    input: String,
    pub focused: bool,
    pub area: Option<Rect>,
}

impl SearchBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop(&mut self) {
        self.input.pop();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Case-insensitive substring match against any of `haystacks`.
    /// An empty query matches everything.
    pub fn matches(&self, haystacks: &[&str]) -> bool {
        let query = self.input.trim().to_lowercase();
        query.is_empty() || haystacks.iter().any(|h| h.to_lowercase().contains(&query))
    }

    /// Render the box into `area`, saving the area for later hit-testing.
    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        self.area = Some(area);

        let (border, title, text) = if self.focused {
            (Color::Blue, " Search (typing...) ", format!("{}▌", self.input))
        } else {
            (Color::White, " Search (s or click) ", self.input.clone())
        };

        let widget = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border)).title(title))
            .style(Style::default().fg(Color::Blue));
        f.render_widget(widget, area);
    }
}

/// A dropdown entry: display label plus the colour used to tint it.
pub struct DropdownOption {
    pub label: &'static str,
    pub color: Color,
}

/// Open/closed state and cursor of a dropdown. The option list is passed in
/// by the owner on every call.
#[derive(Default)]
pub struct Dropdown {
    pub open: bool,
    pub cursor: usize,
    button_area: Option<Rect>,
    menu_area: Option<Rect>,
}

impl Dropdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open with the cursor on `current`, or close.
    pub fn toggle(&mut self, current: usize) {
        self.open = !self.open;
        if self.open {
            self.cursor = current;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn next(&mut self, count: usize) {
        if count > 0 {
            self.cursor = (self.cursor + 1) % count;
        }
    }

    pub fn previous(&mut self, count: usize) {
        if count > 0 {
            self.cursor = if self.cursor == 0 { count - 1 } else { self.cursor - 1 };
        }
    }

    pub fn button_hit(&self, col: u16, row: u16) -> bool {
        self.button_area.is_some_and(|a| in_area(col, row, a))
    }

    pub fn menu_hit(&self, col: u16, row: u16) -> bool {
        self.open && self.menu_area.is_some_and(|a| in_area(col, row, a))
    }

    /// Option under a click inside the open menu.
    pub fn clicked_option(&self, col: u16, row: u16, count: usize) -> Option<usize> {
        let area = self.menu_area.filter(|a| self.open && in_area(col, row, *a))?;
        row_index(row, area, count)
    }

    pub fn render_button(&mut self, f: &mut Frame, area: Rect, title: &str, selected: &DropdownOption) {
        self.button_area = Some(area);

        let arrow = if self.open { "▲" } else { "▼" };
        let border = if self.open { Color::Blue } else { Color::White };
        let button = Paragraph::new(format!(" {} {}", selected.label, arrow))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border)).title(title))
            .style(Style::default().fg(selected.color).add_modifier(Modifier::BOLD));
        f.render_widget(button, area);
    }

    /// Floating menu right below the button.
    pub fn render_menu(&mut self, f: &mut Frame, options: &[DropdownOption]) {
        let Some(button) = self.button_area else { return };
        let menu = Rect {
            x: button.x,
            y: button.y + button.height,
            width: button.width,
            height: options.len() as u16 + 2,
        }
        .intersection(f.area());
        self.menu_area = Some(menu);

        let items: Vec<ListItem> = options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                let style = if i == self.cursor {
                    Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(opt.color)
                };
                ListItem::new(format!(" {} ", opt.label)).style(style)
            })
            .collect();

        f.render_widget(Clear, menu);
        f.render_widget(List::new(items).block(Block::default().borders(Borders::ALL)), menu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_navigation_wraps() {
        let mut state = ListState::default();
        list_next(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
        list_previous(&mut state, 3);
        assert_eq!(state.selected(), Some(2));
        list_next(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
        list_next(&mut state, 0);
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn test_row_index_skips_border() {
        let area = Rect::new(0, 10, 20, 6);
        assert_eq!(row_index(10, area, 4), None);
        assert_eq!(row_index(11, area, 4), Some(0));
        assert_eq!(row_index(14, area, 4), Some(3));
        assert_eq!(row_index(15, area, 4), None);
    }

    #[test]
    fn test_search_matches_case_insensitively() {
        let mut search = SearchBox::new();
        assert!(search.matches(&["anything"]));
        for c in "SQL".chars() {
            search.push(c);
        }
        assert!(search.matches(&["XSS", "sql_injection"]));
        assert!(!search.matches(&["XSS"]));
        search.pop();
        assert_eq!(search.input(), "SQ");
    }
}
