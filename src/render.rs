use models::{ScanRecord, Severity, Vulnerability, VulnerabilityType};
use workflow::Report;

const RULE: &str = "------------------------------------------------------------";

/// The whole report as plain text, one entry per line.
pub fn report_lines(report: &Report) -> Vec<String> {
    let session = report.session();
    let summary = report.summary();

    let mut lines = vec![
        format!("Scan report for {}", session.target_url()),
        format!("Status: {}    Findings: {}", session.status(), session.vulnerabilities().len()),
        Severity::ALL
            .iter()
            .map(|&sev| format!("{}: {}", sev, summary.count(sev)))
            .collect::<Vec<_>>()
            .join("  "),
        RULE.to_string(),
    ];

    let findings = report.ordered_findings();
    if findings.is_empty() {
        lines.push("No vulnerabilities found.".to_string());
        return lines;
    }

    for (i, v) in findings.into_iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(finding_lines(i + 1, v));
    }
    lines
}

fn finding_lines(n: usize, v: &Vulnerability) -> Vec<String> {
    let mut lines = vec![format!(
        "{n}. [{}] {} (confidence {}%)",
        v.severity,
        v.kind.label(),
        v.confidence_percent()
    )];
    for (label, value) in [("Location", &v.location), ("Pattern", &v.pattern), ("Details", &v.details)] {
        if !value.is_empty() {
            lines.push(format!("   {label}: {value}"));
        }
    }
    lines.push("   Remediation:".to_string());
    lines.extend(v.kind.remediation().iter().map(|step| format!("     - {step}")));
    lines
}

/// One history row: id, status, URL, timestamps, error.
pub fn history_line(record: &ScanRecord) -> String {
    let mut line = format!("#{:<6} {:<12} {}", record.id.as_str(), record.status, record.target_url);
    if let Some(started) = &record.started_at {
        line.push_str(&format!("  started {started}"));
    }
    if let Some(finished) = &record.finished_at {
        line.push_str(&format!("  finished {finished}"));
    }
    if let Some(err) = record.error_message.as_deref().filter(|e| !e.is_empty()) {
        line.push_str(&format!("  ({err})"));
    }
    line
}

pub fn remediation_lines(kind: &VulnerabilityType) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", kind.label(), kind.as_str())];
    lines.extend(kind.remediation().iter().enumerate().map(|(i, step)| format!("  {}. {step}", i + 1)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{ScanId, ScanSession, StatusEvent};
    use url::Url;

    fn report(findings: Vec<Vulnerability>) -> Report {
        let mut s = ScanSession::pending(ScanId::parse("3"), Url::parse("https://shop.example/").unwrap());
        s.apply(StatusEvent::Completed(findings));
        Report::from_session(s).unwrap()
    }

    #[test]
    fn test_report_header_and_order() {
        let lines = report_lines(&report(vec![
            Vulnerability::new("MIME_SNIFFING", Severity::Low).with_confidence(0.95),
            Vulnerability::new("SQL_INJECTION", Severity::Critical)
                .with_confidence(0.99)
                .with_pattern("' OR 1=1--"),
        ]));

        assert_eq!(lines[0], "Scan report for https://shop.example/");
        assert_eq!(lines[1], "Status: COMPLETED    Findings: 2");
        assert_eq!(lines[2], "CRITICAL: 1  HIGH: 0  MEDIUM: 0  LOW: 1");
        assert_eq!(lines[4], "1. [CRITICAL] SQL Injection (confidence 99%)");
        assert!(lines.contains(&"   Pattern: ' OR 1=1--".to_string()));
        assert!(lines.contains(&"     - Use prepared statements for every query".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("2. [LOW] MIME Sniffing")));
    }

    #[test]
    fn test_empty_report() {
        let lines = report_lines(&report(vec![]));
        assert_eq!(lines.last().map(String::as_str), Some("No vulnerabilities found."));
    }

    #[test]
    fn test_unknown_type_gets_generic_steps() {
        let lines = remediation_lines(&VulnerabilityType::from("CLICKJACKING"));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("security expert"));
    }

    #[test]
    fn test_history_line() {
        let record = ScanRecord {
            id: ScanId::parse("12"),
            target_url: "https://a.example".into(),
            status: "FAILED".into(),
            started_at: Some("2026-01-15T10:00:00".into()),
            finished_at: None,
            error_message: Some("timeout".into()),
        };
        let line = history_line(&record);
        assert!(line.starts_with("#12"));
        assert!(line.contains("FAILED"));
        assert!(line.ends_with("(timeout)"));
    }
}
