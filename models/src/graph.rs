use ratatui::style::Color;

use crate::{ReportSummary, Severity};

/// A single bar in a severity distribution graph.
#[derive(Clone, Debug)]
pub struct SeverityBar {
    pub label: String,
    pub value: u64,
    pub color: Color,
}

impl SeverityBar {
    pub fn new(label: impl Into<String>, value: u64, color: Color) -> Self {
        Self { label: label.into(), value, color }
    }

    /// Create a bar from a [`Severity`] variant, using its label and color.
    pub fn from_severity(severity: Severity, value: u64) -> Self {
        Self::new(severity.as_str(), value, severity.color())
    }
}

/// Data backing a severity distribution bar chart.
#[derive(Clone, Debug)]
pub struct GraphData {
    pub title: String,
    pub bars: Vec<SeverityBar>,
}

impl GraphData {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), bars: Vec::new() }
    }

    pub fn with_bar(mut self, bar: SeverityBar) -> Self {
        self.bars.push(bar);
        self
    }

    /// One bar per known severity, zero counts included.
    pub fn from_summary(summary: &ReportSummary) -> Self {
        Severity::ALL.iter().fold(Self::new("Severity Distribution"), |data, &sev| {
            data.with_bar(SeverityBar::from_severity(sev, summary.count(sev) as u64))
        })
    }
}
