use std::sync::Arc;

use models::{ScanSession, StatusEvent};
use tracing::{info, warn};
use url::Url;

use crate::backend::{status_event, ScanBackend, StartResponse};
use crate::error::{BackendError, Result, WorkflowError};
use crate::events::{AuthEvent, EventBus};

/// Result of a successful submission.
///
/// Either a session waiting to be polled, or a terminal `latest` session
/// when the backend scanned synchronously.
#[derive(Clone, Debug)]
pub struct ScanHandle {
    session: ScanSession,
}

impl ScanHandle {
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn into_session(self) -> ScanSession {
        self.session
    }

    /// `true` when there is nothing left to poll.
    pub fn is_ready(&self) -> bool {
        self.session.is_terminal()
    }
}

/// Check that `input` is an absolute http(s) URL with a host.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|_| WorkflowError::InvalidUrl(input.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(WorkflowError::InvalidUrl(input.to_string())),
    }
}

/// Precondition layer in front of the scan-start call.
pub struct SubmissionGate {
    backend: Arc<dyn ScanBackend>,
    events: EventBus,
}

impl SubmissionGate {
    pub fn new(backend: Arc<dyn ScanBackend>, events: EventBus) -> Self {
        Self { backend, events }
    }

    /// Validate `url` and `auth_token`, then ask the backend to start a scan.
    ///
    /// Fails with `InvalidUrl` or `AuthRequired` before any network call.
    /// A 401 from the backend also yields `AuthRequired` and publishes
    /// [`AuthEvent::SessionExpired`].
    pub async fn submit(&self, url: &str, auth_token: Option<&str>) -> Result<ScanHandle> {
        let target = validate_url(url)?;
        let token = auth_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(WorkflowError::AuthRequired)?;

        let response = match self.backend.start_scan(&target, token).await {
            Ok(response) => response,
            Err(BackendError::Unauthorized) => {
                warn!("scan start rejected: credentials expired");
                self.events.publish(AuthEvent::SessionExpired);
                return Err(WorkflowError::AuthRequired);
            }
            Err(e) => {
                warn!(error = %e, "scan start failed");
                return Err(e.into());
            }
        };

        let session = match response {
            StartResponse::Completed(result) => {
                info!(target_url = %target, findings = result.vulnerabilities.len(), "backend returned a synchronous result");
                let reported = validate_url(&result.url).unwrap_or_else(|_| target.clone());
                ScanSession::from_result(reported, result)
            }
            StartResponse::Accepted(accepted) => {
                info!(id = %accepted.id, target_url = %target, "scan accepted");
                let mut session = ScanSession::pending(accepted.id, target);
                // The start reply may already carry a status; apply it so the
                // session reflects what the backend told us.
                if let Some(label) = accepted.status.as_deref() {
                    match status_event(label) {
                        Some(StatusEvent::Completed(_)) | None => {}
                        Some(event) => {
                            session.apply(event);
                        }
                    }
                }
                session
            }
        };

        Ok(ScanHandle { session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        for ok in ["https://example.com", "http://localhost:8080/path?q=1", "  https://a.b/  "] {
            assert!(validate_url(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_validate_url_rejects_everything_else() {
        for bad in ["not-a-url", "", "example.com", "ftp://example.com", "javascript:alert(1)", "file:///etc/passwd", "https://"] {
            assert!(matches!(validate_url(bad), Err(WorkflowError::InvalidUrl(_))), "{bad}");
        }
    }
}
