use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use models::{ReportSummary, ScanResult, ScanSession, ScanStatus, Vulnerability, VulnerabilityType};
use tracing::info;
use url::Url;

use crate::error::{Result, WorkflowError};

/// Count findings per severity in a single pass.
///
/// `Unknown` severities are skipped here but stay in the finding list.
pub fn summarize(vulnerabilities: &[Vulnerability]) -> ReportSummary {
    vulnerabilities.iter().fold(ReportSummary::default(), |mut summary, v| {
        summary.record(v.severity);
        summary
    })
}

/// Remediation steps for a backend type tag. Never empty, never fails.
pub fn remediation_for(kind: &str) -> &'static [&'static str] {
    VulnerabilityType::from(kind).remediation()
}

/// A completed scan plus its derived summary, ready to render.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    session: ScanSession,
    summary: ReportSummary,
}

impl Report {
    /// Only `COMPLETED` sessions make a report.
    pub fn from_session(session: ScanSession) -> Result<Self> {
        if session.status() != ScanStatus::Completed {
            return Err(WorkflowError::NotCompleted(session.status()));
        }
        let summary = summarize(session.vulnerabilities());
        Ok(Self { session, summary })
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn into_session(self) -> ScanSession {
        self.session
    }

    /// Findings in display order: most severe first, backend order within a band.
    pub fn ordered_findings(&self) -> Vec<&Vulnerability> {
        let mut findings: Vec<&Vulnerability> = self.session.vulnerabilities().iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        findings
    }

    /// The exportable result document.
    pub fn to_result(&self) -> ScanResult {
        ScanResult::from_session(&self.session)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_result())?)
    }

    /// Write `scan-report-<epoch millis>.json` into `dir` and return its path.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("scan-report-{}.json", Utc::now().timestamp_millis()));
        fs::write(&path, self.to_json()?)?;
        info!(path = %path.display(), "report exported");
        Ok(path)
    }

    /// Read a previously exported report back into a `latest` session.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let result: ScanResult = serde_json::from_str(&raw)?;
        let url = Url::parse(&result.url).map_err(|_| WorkflowError::InvalidUrl(result.url.clone()))?;
        Self::from_session(ScanSession::from_result(url, result))
    }
}
