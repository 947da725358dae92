use crossterm::event::KeyCode;
use models::{Severity, Vulnerability};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::tabs::Tab;
use crate::widgets::{field, in_area, list_next, list_previous, row_index, Dropdown, DropdownOption, SearchBox};

/// Severity filter choices; `None` shows everything.
const FILTERS: [Option<Severity>; 6] = [
    None,
    Some(Severity::Critical),
    Some(Severity::High),
    Some(Severity::Medium),
    Some(Severity::Low),
    Some(Severity::Unknown),
];

fn filter_option(filter: Option<Severity>) -> DropdownOption {
    match filter {
        None => DropdownOption { label: "ALL", color: Color::White },
        Some(sev) => DropdownOption { label: sev.as_str(), color: sev.color() },
    }
}

/// Searchable, filterable list of findings with a detail pane.
pub struct FindingsTab {
    findings: Vec<Vulnerability>,
    /// Indices into `findings` that pass the search and filter.
    visible: Vec<usize>,
    search: SearchBox,
    filter: usize,
    dropdown: Dropdown,
    list_state: ListState,
    list_area: Option<Rect>,
}

impl FindingsTab {
    /// `findings` are shown in the order given.
    pub fn new(findings: Vec<Vulnerability>) -> Self {
        let mut tab = Self {
            visible: Vec::new(),
            findings,
            search: SearchBox::new(),
            filter: 0,
            dropdown: Dropdown::new(),
            list_state: ListState::default(),
            list_area: None,
        };
        tab.refilter();
        tab
    }

    fn refilter(&mut self) {
        let severity = FILTERS[self.filter];
        self.visible = self
            .findings
            .iter()
            .enumerate()
            .filter(|(_, v)| severity.is_none_or(|s| v.severity == s))
            .filter(|(_, v)| {
                self.search.matches(&[v.kind.as_str(), v.kind.label(), &v.location, &v.details, &v.pattern])
            })
            .map(|(i, _)| i)
            .collect();
        self.list_state.select(if self.visible.is_empty() { None } else { Some(0) });
    }

    fn select_filter(&mut self, index: usize) {
        if index < FILTERS.len() {
            self.filter = index;
            self.refilter();
        }
        self.dropdown.close();
    }

    pub fn selected(&self) -> Option<&Vulnerability> {
        self.list_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .map(|&i| &self.findings[i])
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        self.list_area = Some(area);

        let items: Vec<ListItem> = self
            .visible
            .iter()
            .map(|&i| {
                let v = &self.findings[i];
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<8} ", v.severity.as_str()), Style::default().fg(v.severity.color())),
                    Span::raw(v.kind.label().to_string()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(format!(" Findings ({}) ", self.visible.len())))
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_details(&self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Details ");
        let Some(v) = self.selected() else {
            let empty = Paragraph::new("No finding selected").block(block).alignment(Alignment::Center);
            f.render_widget(empty, area);
            return;
        };

        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Min(4),
                Constraint::Length(v.kind.remediation().len() as u16 + 2),
            ])
            .split(inner);

        let heading = Paragraph::new(vec![
            field("Type", v.kind.label()),
            field("Severity", Span::styled(v.severity.as_str(), Style::default().fg(v.severity.color()))),
        ]);
        f.render_widget(heading, chunks[0]);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(v.severity.color()))
            .percent(v.confidence_percent().into())
            .label(format!("confidence {}%", v.confidence_percent()));
        f.render_widget(gauge, chunks[1]);

        let location = Paragraph::new(field("Location", Span::styled(v.location.as_str(), Style::default().fg(Color::Cyan))))
            .wrap(Wrap { trim: true });
        f.render_widget(location, chunks[2]);

        let body = Paragraph::new(vec![
            field("Pattern", v.pattern.as_str()),
            Line::from(""),
            Line::from(Span::styled("Details:", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(v.details.as_str()),
        ])
        .wrap(Wrap { trim: true });
        f.render_widget(body, chunks[3]);

        let steps: Vec<Line> = v
            .kind
            .remediation()
            .iter()
            .enumerate()
            .map(|(i, step)| Line::from(format!("{}. {step}", i + 1)))
            .collect();
        let remediation = Paragraph::new(steps)
            .block(Block::default().borders(Borders::TOP).title(" Remediation "))
            .wrap(Wrap { trim: true });
        f.render_widget(remediation, chunks[4]);
    }
}

impl Tab for FindingsTab {
    fn title(&self) -> &'static str {
        "Findings"
    }

    fn render(&mut self, f: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
            .split(halves[0]);

        self.search.render(f, left[0]);
        self.dropdown.render_button(f, left[1], " Severity (f or click) ", &filter_option(FILTERS[self.filter]));
        self.render_list(f, left[2]);
        self.render_details(f, halves[1]);

        if self.dropdown.open {
            let options: Vec<DropdownOption> = FILTERS.iter().map(|&s| filter_option(s)).collect();
            self.dropdown.render_menu(f, &options);
        }
    }

    fn handle_key(&mut self, key: KeyCode) -> bool {
        if self.dropdown.open {
            match key {
                KeyCode::Esc | KeyCode::Char('f') => self.dropdown.close(),
                KeyCode::Enter => self.select_filter(self.dropdown.cursor),
                KeyCode::Down => self.dropdown.next(FILTERS.len()),
                KeyCode::Up => self.dropdown.previous(FILTERS.len()),
                _ => return false,
            }
            return true;
        }

        if self.search.focused {
            match key {
                KeyCode::Esc | KeyCode::Enter => self.search.focused = false,
                KeyCode::Char(c) => {
                    self.search.push(c);
                    self.refilter();
                }
                KeyCode::Backspace => {
                    self.search.pop();
                    self.refilter();
                }
                KeyCode::Down => list_next(&mut self.list_state, self.visible.len()),
                KeyCode::Up => list_previous(&mut self.list_state, self.visible.len()),
                _ => return false,
            }
            return true;
        }

        match key {
            KeyCode::Char('s') => self.search.focused = true,
            KeyCode::Char('f') => self.dropdown.toggle(self.filter),
            KeyCode::Down => list_next(&mut self.list_state, self.visible.len()),
            KeyCode::Up => list_previous(&mut self.list_state, self.visible.len()),
            _ => return false,
        }
        true
    }

    fn handle_click(&mut self, col: u16, row: u16) {
        if self.dropdown.open {
            if let Some(idx) = self.dropdown.clicked_option(col, row, FILTERS.len()) {
                self.select_filter(idx);
                return;
            }
            let on_menu = self.dropdown.menu_hit(col, row);
            self.dropdown.close();
            if on_menu {
                return;
            }
        }

        if self.dropdown.button_hit(col, row) {
            self.search.focused = false;
            self.dropdown.toggle(self.filter);
            return;
        }

        if self.search.area.is_some_and(|a| in_area(col, row, a)) {
            self.search.focused = true;
            return;
        }

        self.search.focused = false;
        if let Some(area) = self.list_area.filter(|a| in_area(col, row, *a)) {
            if let Some(idx) = row_index(row, area, self.visible.len()) {
                self.list_state.select(Some(idx));
            }
        }
    }

    fn handle_scroll_down(&mut self) {
        list_next(&mut self.list_state, self.visible.len());
    }

    fn handle_scroll_up(&mut self) {
        list_previous(&mut self.list_state, self.visible.len());
    }

    fn on_blur(&mut self) {
        self.search.focused = false;
        self.dropdown.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab() -> FindingsTab {
        FindingsTab::new(vec![
            Vulnerability::new("SQL_INJECTION", Severity::Critical).with_location("https://a.example/search"),
            Vulnerability::new("XSS", Severity::High).with_details("reflected in the search page"),
            Vulnerability::new("CSP_MISSING", Severity::Medium),
            Vulnerability::new("CLICKJACKING", Severity::Unknown),
        ])
    }

    fn type_text(tab: &mut FindingsTab, text: &str) {
        for c in text.chars() {
            tab.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_starts_with_everything_selected_first() {
        let tab = tab();
        assert_eq!(tab.visible.len(), 4);
        assert_eq!(tab.selected().map(|v| v.kind.as_str()), Some("SQL_INJECTION"));
    }

    #[test]
    fn test_search_filters_on_type_location_and_details() {
        let mut tab = tab();
        assert!(tab.handle_key(KeyCode::Char('s')));
        type_text(&mut tab, "search");
        assert_eq!(tab.visible, vec![0, 1]);

        tab.handle_key(KeyCode::Enter);
        assert!(!tab.search.focused);
        // 'q' is no longer swallowed once the box loses focus.
        assert!(!tab.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_severity_filter_via_keys() {
        let mut tab = tab();
        tab.handle_key(KeyCode::Char('f'));
        assert!(tab.dropdown.open);
        tab.handle_key(KeyCode::Down);
        tab.handle_key(KeyCode::Down);
        tab.handle_key(KeyCode::Enter);
        assert!(!tab.dropdown.open);
        assert_eq!(FILTERS[tab.filter], Some(Severity::High));
        assert_eq!(tab.visible, vec![1]);

        tab.select_filter(5);
        assert_eq!(tab.selected().map(|v| v.kind.as_str()), Some("CLICKJACKING"));
    }

    #[test]
    fn test_no_match_clears_selection() {
        let mut tab = tab();
        tab.handle_key(KeyCode::Char('s'));
        type_text(&mut tab, "zzz");
        assert!(tab.visible.is_empty());
        assert!(tab.selected().is_none());
        tab.handle_key(KeyCode::Down);
        assert!(tab.selected().is_none());
    }
}
