use async_trait::async_trait;
use models::{Page, ScanId, ScanRecord, ScanResult, ScanStatus, StatusEvent, Vulnerability};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BackendError;

/// The remote service that actually runs scans.
///
/// Every call carries the bearer token explicitly; implementations must map
/// an HTTP 401 to [`BackendError::Unauthorized`].
#[async_trait]
pub trait ScanBackend: Send + Sync {
    /// `POST /api/analysis/start`
    async fn start_scan(&self, url: &Url, token: &str) -> Result<StartResponse, BackendError>;

    /// `GET /api/analysis/status/{id}`
    async fn scan_status(&self, id: &ScanId, token: &str) -> Result<StatusResponse, BackendError>;

    /// `GET /api/analysis?page&size`
    async fn list_scans(&self, page: u32, size: u32, token: &str) -> Result<Page<ScanRecord>, BackendError>;
}

/// Reply to a scan-start request.
///
/// Some backends scan inline and return the whole result; others accept the
/// job and hand back an id to poll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartResponse {
    Completed(ScanResult),
    Accepted(AcceptedScan),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptedScan {
    #[serde(alias = "analysisId")]
    pub id: ScanId,
    #[serde(default)]
    pub status: Option<String>,
}

/// Reply to a status poll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default, rename = "errorMessage", alias = "error_message", alias = "message")]
    pub error_message: Option<String>,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self { status: status.into(), vulnerabilities: Vec::new(), error_message: None }
    }

    pub fn with_vulnerabilities(mut self, vulnerabilities: Vec<Vulnerability>) -> Self {
        self.vulnerabilities = vulnerabilities;
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Interpret the reply. An unrecognised status counts as a failure.
    pub fn into_event(self) -> StatusEvent {
        match status_event(&self.status) {
            Some(StatusEvent::Completed(_)) => StatusEvent::Completed(self.vulnerabilities),
            Some(StatusEvent::Failed(_)) => StatusEvent::Failed(self.error_message.unwrap_or_default()),
            Some(event) => event,
            None => StatusEvent::Failed(format!("unrecognised scan status {:?}", self.status)),
        }
    }
}

/// Map a backend status label to an event without payload.
pub(crate) fn status_event(label: &str) -> Option<StatusEvent> {
    match label.parse::<ScanStatus>().ok()? {
        ScanStatus::Pending => Some(StatusEvent::Pending),
        ScanStatus::InProgress => Some(StatusEvent::InProgress),
        ScanStatus::Completed => Some(StatusEvent::Completed(Vec::new())),
        ScanStatus::Failed => Some(StatusEvent::Failed(String::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::Severity;

    #[test]
    fn test_start_response_sync_mode() {
        let raw = r#"{
            "success": true,
            "url": "https://example.com",
            "vulnerabilities": [{"type": "XSS", "severity": "HIGH", "confidence": 0.9}],
            "vulnerability_count": 1
        }"#;
        match serde_json::from_str::<StartResponse>(raw).unwrap() {
            StartResponse::Completed(result) => {
                assert!(result.success);
                assert_eq!(result.vulnerabilities[0].severity, Severity::High);
            }
            other => panic!("expected a completed result, got {other:?}"),
        }
    }

    #[test]
    fn test_start_response_async_mode() {
        let accepted: StartResponse = serde_json::from_str(r#"{"id": 12, "status": "IN_PROGRESS"}"#).unwrap();
        assert_eq!(
            accepted,
            StartResponse::Accepted(AcceptedScan { id: ScanId::Remote("12".into()), status: Some("IN_PROGRESS".into()) })
        );

        let aliased: StartResponse = serde_json::from_str(r#"{"analysisId": "abc"}"#).unwrap();
        assert!(matches!(aliased, StartResponse::Accepted(AcceptedScan { status: None, .. })));
    }

    #[test]
    fn test_status_reply_to_event() {
        assert_eq!(StatusResponse::new("IN_PROGRESS").into_event(), StatusEvent::InProgress);
        assert_eq!(StatusResponse::new("PENDING").into_event(), StatusEvent::Pending);
        assert_eq!(
            StatusResponse::new("FAILED").with_error("crawler blocked").into_event(),
            StatusEvent::Failed("crawler blocked".into())
        );
        let done = StatusResponse::new("COMPLETED")
            .with_vulnerabilities(vec![Vulnerability::new("XSS", Severity::Low)])
            .into_event();
        assert!(matches!(done, StatusEvent::Completed(v) if v.len() == 1));
    }

    #[test]
    fn test_malformed_finding_keeps_completed_reply() {
        let raw = r#"{
            "status": "COMPLETED",
            "vulnerabilities": [{"severity": null}, {"type": "XSS", "severity": "HIGH"}]
        }"#;
        let reply: StatusResponse = serde_json::from_str(raw).unwrap();
        match reply.into_event() {
            StatusEvent::Completed(found) => {
                assert_eq!(found.len(), 2);
                assert_eq!(found[0].severity, Severity::Unknown);
                assert_eq!(found[1].severity, Severity::High);
            }
            other => panic!("expected a completed scan, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_status_fails_closed() {
        let event = StatusResponse::new("EXPLODED").into_event();
        assert!(matches!(event, StatusEvent::Failed(msg) if msg.contains("EXPLODED")));
    }

    #[test]
    fn test_status_error_message_aliases() {
        let r: StatusResponse = serde_json::from_str(r#"{"status":"FAILED","message":"boom"}"#).unwrap();
        assert_eq!(r.error_message.as_deref(), Some("boom"));
        let r: StatusResponse = serde_json::from_str(r#"{"status":"FAILED","errorMessage":"bang"}"#).unwrap();
        assert_eq!(r.error_message.as_deref(), Some("bang"));
    }
}
