use crossterm::event::KeyCode;
use models::{GraphData, ScanSession, Vulnerability};
use ratatui::{layout::Rect, Frame};

use crate::tabs::findings::FindingsTab;
use crate::tabs::summary::SummaryTab;
use crate::tabs::Tab;

/// Owns the tabs and routes input and rendering to the active one.
pub struct App {
    tabs: Vec<Box<dyn Tab>>,
    current: usize,
}

impl App {
    pub fn new(graph: GraphData, session: &ScanSession, findings: Vec<Vulnerability>) -> Self {
        let tabs: Vec<Box<dyn Tab>> = vec![
            Box::new(SummaryTab::new(graph, session)),
            Box::new(FindingsTab::new(findings)),
        ];
        Self { tabs, current: 0 }
    }

    pub fn tab_titles(&self) -> Vec<&'static str> {
        self.tabs.iter().map(|t| t.title()).collect()
    }

    pub fn current_tab_index(&self) -> usize {
        self.current
    }

    pub fn select_tab(&mut self, index: usize) {
        if index < self.tabs.len() && index != self.current {
            self.active().on_blur();
            self.current = index;
        }
    }

    pub fn next_tab(&mut self) {
        self.select_tab((self.current + 1) % self.tabs.len());
    }

    fn active(&mut self) -> &mut Box<dyn Tab> {
        &mut self.tabs[self.current]
    }

    pub fn render_current_tab(&mut self, f: &mut Frame, area: Rect) {
        self.active().render(f, area);
    }

    /// Returns `false` when neither the active tab nor the global bindings
    /// wanted the key.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        if self.active().handle_key(key) {
            return true;
        }
        let switch = matches!(key, KeyCode::Char('t') | KeyCode::Tab);
        if switch {
            self.next_tab();
        }
        switch
    }

    pub fn handle_click(&mut self, col: u16, row: u16) {
        self.active().handle_click(col, row);
    }

    pub fn handle_scroll_down(&mut self) {
        self.active().handle_scroll_down();
    }

    pub fn handle_scroll_up(&mut self) {
        self.active().handle_scroll_up();
    }
}
