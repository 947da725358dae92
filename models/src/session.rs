use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::{ScanResult, ScanStatus, Vulnerability};

/// Message recorded when the backend fails a scan without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "the scan failed without an error message";

/// Identifier of a scan session.
///
/// Backends hand out strings or numbers; both are kept as text. `Latest`
/// names a result that only exists in memory (synchronous backend mode or a
/// reloaded report) and serializes as `"latest"`.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum ScanId {
    Remote(String),
    Latest,
}

impl ScanId {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("latest") {
            ScanId::Latest
        } else {
            ScanId::Remote(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScanId::Remote(id) => id,
            ScanId::Latest => "latest",
        }
    }

    /// `true` when the id refers to something the backend can be polled for.
    pub fn is_remote(&self) -> bool {
        matches!(self, ScanId::Remote(_))
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScanId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Integer(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Integer(n) => Ok(ScanId::Remote(n.to_string())),
            RawId::Text(s) => Ok(ScanId::parse(&s)),
        }
    }
}

/// A status observation fed into [`ScanSession::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum StatusEvent {
    Pending,
    InProgress,
    Completed(Vec<Vulnerability>),
    Failed(String),
}

/// Outcome of applying a [`StatusEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Advanced { from: ScanStatus, to: ScanStatus },
    Unchanged,
    /// The session was already terminal; the event was ignored.
    Discarded,
}

/// One scan lifecycle: `PENDING -> IN_PROGRESS -> COMPLETED | FAILED`.
///
/// Fields are private so that status only changes through [`apply`], which
/// refuses to touch a terminal session.
///
/// [`apply`]: ScanSession::apply
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSession {
    id: ScanId,
    target_url: Url,
    status: ScanStatus,
    #[serde(default)]
    vulnerabilities: Vec<Vulnerability>,
    started_at: DateTime<Utc>,
    #[serde(default)]
    finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    error_message: Option<String>,
}

impl ScanSession {
    /// A freshly submitted session, before any status response.
    pub fn pending(id: ScanId, target_url: Url) -> Self {
        Self {
            id,
            target_url,
            status: ScanStatus::Pending,
            vulnerabilities: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            error_message: None,
        }
    }

    /// Build a terminal `latest` session from a synchronous result document.
    pub fn from_result(target_url: Url, result: ScanResult) -> Self {
        let mut session = Self::pending(ScanId::Latest, target_url);
        let event = if result.success {
            StatusEvent::Completed(result.vulnerabilities)
        } else {
            StatusEvent::Failed("the backend reported an unsuccessful scan".into())
        };
        session.apply(event);
        session
    }

    pub fn id(&self) -> &ScanId {
        &self.id
    }

    pub fn target_url(&self) -> &Url {
        &self.target_url
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Findings, only populated once `COMPLETED`.
    pub fn vulnerabilities(&self) -> &[Vulnerability] {
        &self.vulnerabilities
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Feed one status observation into the state machine.
    pub fn apply(&mut self, event: StatusEvent) -> Transition {
        if self.status.is_terminal() {
            return Transition::Discarded;
        }

        let from = self.status;
        match event {
            StatusEvent::Pending => return Transition::Unchanged,
            StatusEvent::InProgress => {
                if from == ScanStatus::InProgress {
                    return Transition::Unchanged;
                }
                self.status = ScanStatus::InProgress;
            }
            StatusEvent::Completed(vulnerabilities) => {
                self.vulnerabilities = vulnerabilities;
                self.status = ScanStatus::Completed;
                self.finished_at = Some(Utc::now());
            }
            StatusEvent::Failed(message) => {
                let message = message.trim();
                self.error_message = Some(if message.is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    message.to_string()
                });
                self.status = ScanStatus::Failed;
                self.finished_at = Some(Utc::now());
            }
        }

        Transition::Advanced { from, to: self.status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    fn session() -> ScanSession {
        ScanSession::pending(ScanId::parse("42"), Url::parse("https://example.com").unwrap())
    }

    #[test]
    fn test_happy_path() {
        let mut s = session();
        assert_eq!(s.status(), ScanStatus::Pending);
        assert!(s.finished_at().is_none());

        assert_eq!(
            s.apply(StatusEvent::InProgress),
            Transition::Advanced { from: ScanStatus::Pending, to: ScanStatus::InProgress }
        );
        assert_eq!(s.apply(StatusEvent::InProgress), Transition::Unchanged);
        assert_eq!(s.apply(StatusEvent::Pending), Transition::Unchanged);
        assert_eq!(s.status(), ScanStatus::InProgress);

        let findings = vec![Vulnerability::new("XSS", Severity::High)];
        s.apply(StatusEvent::Completed(findings.clone()));
        assert_eq!(s.status(), ScanStatus::Completed);
        assert_eq!(s.vulnerabilities(), findings.as_slice());
        assert!(s.finished_at().is_some());
        assert!(s.error_message().is_none());
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut s = session();
        s.apply(StatusEvent::InProgress);
        s.apply(StatusEvent::Failed("backend exploded".into()));
        let snapshot = s.clone();

        assert_eq!(s.apply(StatusEvent::InProgress), Transition::Discarded);
        assert_eq!(s.apply(StatusEvent::Completed(vec![])), Transition::Discarded);
        assert_eq!(s.apply(StatusEvent::Failed("again".into())), Transition::Discarded);
        assert_eq!(s, snapshot);
        assert_eq!(s.error_message(), Some("backend exploded"));
    }

    #[test]
    fn test_failure_message_never_empty() {
        let mut s = session();
        s.apply(StatusEvent::Failed("   ".into()));
        assert_eq!(s.status(), ScanStatus::Failed);
        assert_eq!(s.error_message(), Some(DEFAULT_FAILURE_MESSAGE));
    }

    #[test]
    fn test_fast_scan_may_complete_from_pending() {
        let mut s = session();
        let t = s.apply(StatusEvent::Completed(vec![]));
        assert_eq!(t, Transition::Advanced { from: ScanStatus::Pending, to: ScanStatus::Completed });
    }

    #[test]
    fn test_scan_id_accepts_numbers_and_latest() {
        let id: ScanId = serde_json::from_str("17").unwrap();
        assert_eq!(id, ScanId::Remote("17".into()));
        let id: ScanId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(id.as_str(), "abc-1");
        let id: ScanId = serde_json::from_str("\"latest\"").unwrap();
        assert_eq!(id, ScanId::Latest);
        assert!(!id.is_remote());
        assert_eq!(serde_json::to_string(&ScanId::Latest).unwrap(), "\"latest\"");
    }

    #[test]
    fn test_from_result() {
        let url = Url::parse("https://example.com/").unwrap();
        let ok = ScanResult {
            success: true,
            url: url.to_string(),
            vulnerabilities: vec![Vulnerability::new("CSRF", Severity::Medium)],
            vulnerability_count: 1,
        };
        let s = ScanSession::from_result(url.clone(), ok);
        assert_eq!(s.id(), &ScanId::Latest);
        assert_eq!(s.status(), ScanStatus::Completed);
        assert_eq!(s.vulnerabilities().len(), 1);

        let failed = ScanResult { success: false, url: url.to_string(), vulnerabilities: vec![], vulnerability_count: 0 };
        let s = ScanSession::from_result(url, failed);
        assert_eq!(s.status(), ScanStatus::Failed);
        assert!(!s.error_message().unwrap_or_default().is_empty());
    }
}
