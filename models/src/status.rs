use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a scan session.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "PENDING",
            ScanStatus::InProgress => "IN_PROGRESS",
            ScanStatus::Completed => "COMPLETED",
            ScanStatus::Failed => "FAILED",
        }
    }

    /// `Completed` and `Failed` admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }

    pub fn color(&self) -> Color {
        match self {
            ScanStatus::Pending => Color::Gray,
            ScanStatus::InProgress => Color::Yellow,
            ScanStatus::Completed => Color::Green,
            ScanStatus::Failed => Color::Red,
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "PENDING" => Ok(ScanStatus::Pending),
            "IN_PROGRESS" | "INPROGRESS" => Ok(ScanStatus::InProgress),
            "COMPLETED" => Ok(ScanStatus::Completed),
            "FAILED" => Ok(ScanStatus::Failed),
            other => Err(format!("unknown scan status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ScanStatus::Pending.is_terminal());
        assert!(!ScanStatus::InProgress.is_terminal());
        assert!(ScanStatus::Completed.is_terminal());
        assert!(ScanStatus::Failed.is_terminal());
    }

    #[test]
    fn test_parse_backend_labels() {
        assert_eq!("IN_PROGRESS".parse::<ScanStatus>().unwrap(), ScanStatus::InProgress);
        assert_eq!("completed".parse::<ScanStatus>().unwrap(), ScanStatus::Completed);
        assert!("DONE".parse::<ScanStatus>().is_err());
    }
}
