use models::{GraphData, ScanSession};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::tabs::Tab;
use crate::widgets::field;

/// Scan metadata plus the severity distribution chart.
pub struct SummaryTab {
    graph: GraphData,
    meta: Vec<(&'static str, String)>,
    status: (String, Color),
}

impl SummaryTab {
    pub fn new(graph: GraphData, session: &ScanSession) -> Self {
        let mut meta = vec![
            ("URL", session.target_url().to_string()),
            ("Scan", session.id().to_string()),
            ("Started", session.started_at().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ];
        if let Some(done) = session.finished_at() {
            meta.push(("Finished", done.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
        }
        // Unknown severities have no bar but still count as findings.
        meta.push(("Findings", session.vulnerabilities().len().to_string()));

        let status = (session.status().to_string(), session.status().color());
        Self { graph, meta, status }
    }

    fn render_meta(&self, f: &mut Frame, area: Rect) {
        let mut lines = vec![field("Status", Span::styled(
            self.status.0.as_str(),
            Style::default().fg(self.status.1).add_modifier(Modifier::BOLD),
        ))];
        lines.extend(self.meta.iter().map(|(label, value)| field(label, value.as_str())));

        let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Scan "));
        f.render_widget(widget, area);
    }

    fn render_chart(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.graph.title));
        let inner = block.inner(area);
        f.render_widget(block, area);

        if self.graph.bars.iter().all(|b| b.value == 0) {
            let msg = Paragraph::new(Line::from("No vulnerabilities found")).alignment(Alignment::Center);
            f.render_widget(msg, inner);
            return;
        }

        let max_value = self.graph.bars.iter().map(|b| b.value).max().unwrap_or(1);
        let label_width = self.graph.bars.iter().map(|b| b.label.len()).max().unwrap_or(0) as u16 + 2;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(self.graph.bars.iter().map(|_| Constraint::Length(2)))
            .split(inner);

        for (bar, row) in self.graph.bars.iter().zip(rows.iter()) {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Length(label_width),
                    Constraint::Length(2),
                    Constraint::Min(10),
                    Constraint::Length(6),
                ])
                .split(*row);

            let label = Paragraph::new(bar.label.as_str())
                .style(Style::default().fg(bar.color).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Right);
            f.render_widget(label, cols[0]);

            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(bar.color))
                .ratio(bar.value as f64 / max_value as f64)
                .label("");
            f.render_widget(gauge, cols[2]);

            f.render_widget(
                Paragraph::new(format!(" {}", bar.value)).style(Style::default().fg(Color::White)),
                cols[3],
            );
        }
    }
}

impl Tab for SummaryTab {
    fn title(&self) -> &'static str {
        "Summary"
    }

    fn render(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(self.meta.len() as u16 + 3), Constraint::Min(0)])
            .split(area);

        self.render_meta(f, chunks[0]);
        self.render_chart(f, chunks[1]);
    }
}
