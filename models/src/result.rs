use serde::{Deserialize, Serialize};

use crate::{ScanSession, ScanStatus, Vulnerability};

/// Synchronous scan result document.
///
/// This is both what `POST /api/analysis/start` returns when the backend
/// scans inline, and the shape of an exported report file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub success: bool,
    pub url: String,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub vulnerability_count: usize,
}

impl ScanResult {
    pub fn from_session(session: &ScanSession) -> Self {
        let vulnerabilities = session.vulnerabilities().to_vec();
        Self {
            success: session.status() == ScanStatus::Completed,
            url: session.target_url().to_string(),
            vulnerability_count: vulnerabilities.len(),
            vulnerabilities,
        }
    }
}
