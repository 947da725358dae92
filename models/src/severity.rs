use std::cmp::Ordering;

use ratatui::style::Color;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Severity level reported by the backend for a single vulnerability.
///
/// Ordering is by risk: `Critical > High > Medium > Low > Unknown`.
/// Anything the backend sends outside the four known labels becomes
/// `Unknown`, which sorts lowest and is left out of summary counts.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Severity {
    /// Known severity variants in descending order.
    pub const ALL: &[Severity] = &[
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Severity::Critical => Color::Red,
            Severity::High => Color::LightRed,
            Severity::Medium => Color::Yellow,
            Severity::Low => Color::Green,
            Severity::Unknown => Color::Gray,
        }
    }

    /// Position in the total display order, higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown => 0,
        }
    }

    /// Lenient parse used on ingestion: never fails.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Severity::Unknown)
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Severity::from_label(&value)
    }
}

/// Non-string values (null, numbers, objects) read as `Unknown`.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(label) => Severity::from_label(&label),
            _ => Severity::Unknown,
        })
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}
