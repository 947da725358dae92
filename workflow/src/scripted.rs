use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use models::{Page, ScanId, ScanRecord, Severity, Vulnerability};
use url::Url;

use crate::backend::{AcceptedScan, ScanBackend, StartResponse, StatusResponse};
use crate::error::BackendError;

/// In-process [`ScanBackend`] that replays queued replies.
///
/// Used by tests and by `--demo`. Status replies are consumed in order; once
/// the queue is empty every further poll fails with a network error.
#[derive(Default)]
pub struct ScriptedBackend {
    start_reply: Mutex<Option<Result<StartResponse, BackendError>>>,
    status_replies: Mutex<VecDeque<Result<StatusResponse, BackendError>>>,
    history_reply: Mutex<Option<Result<Page<ScanRecord>, BackendError>>>,
    status_delay: Option<Duration>,
    start_calls: AtomicUsize,
    status_calls: AtomicUsize,
    history_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(self, reply: Result<StartResponse, BackendError>) -> Self {
        *lock(&self.start_reply) = Some(reply);
        self
    }

    /// Shorthand for an asynchronous start that hands back `id`.
    pub fn accepting(self, id: &str) -> Self {
        self.with_start(Ok(StartResponse::Accepted(AcceptedScan { id: ScanId::parse(id), status: None })))
    }

    pub fn with_status(self, reply: Result<StatusResponse, BackendError>) -> Self {
        lock(&self.status_replies).push_back(reply);
        self
    }

    pub fn with_history(self, reply: Result<Page<ScanRecord>, BackendError>) -> Self {
        *lock(&self.history_reply) = Some(reply);
        self
    }

    /// Make every status reply take `delay` to arrive.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Highest number of status requests that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// A canned scan: accepted, two progress polls, then seven findings.
    pub fn demo() -> Self {
        let location = "https://demo.example/ - Form #1 action: https://demo.example/search (GET)";
        let form = |kind: &str, severity: Severity, pattern: &str, confidence: f64| {
            Vulnerability::new(kind, severity)
                .with_pattern(pattern)
                .with_details(format!("Form input 'query' (type: search) may be vulnerable to {kind}"))
                .with_confidence(confidence)
                .with_location(location)
        };
        let findings = vec![
            form("SQL_INJECTION", Severity::Critical, "' OR 1=1--", 0.99),
            form("SSTI", Severity::Critical, "{{7*7}}", 0.98),
            form("COMMAND_INJECTION", Severity::Critical, "; whoami", 0.89),
            form("PATH_TRAVERSAL", Severity::High, "../../../etc/passwd", 0.98),
            form("XSS", Severity::High, "<script>alert('xss')</script>", 0.96),
            Vulnerability::new("CSP_MISSING", Severity::Medium)
                .with_pattern("No Content-Security-Policy header")
                .with_details("The CSP header that mitigates XSS is missing")
                .with_confidence(0.95)
                .with_location("https://demo.example/"),
            Vulnerability::new("MIME_SNIFFING", Severity::Low)
                .with_pattern("No X-Content-Type-Options header")
                .with_details("The header preventing MIME type sniffing is missing")
                .with_confidence(0.95)
                .with_location("https://demo.example/"),
        ];

        Self::new()
            .accepting("demo")
            .with_status(Ok(StatusResponse::new("IN_PROGRESS")))
            .with_status(Ok(StatusResponse::new("IN_PROGRESS")))
            .with_status(Ok(StatusResponse::new("COMPLETED").with_vulnerabilities(findings)))
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ScanBackend for ScriptedBackend {
    async fn start_scan(&self, _url: &Url, _token: &str) -> Result<StartResponse, BackendError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.start_reply)
            .clone()
            .unwrap_or_else(|| Err(BackendError::Network("no scripted start reply".into())))
    }

    async fn scan_status(&self, _id: &ScanId, _token: &str) -> Result<StatusResponse, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.status_replies)
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Network("no scripted status reply".into())))
    }

    async fn list_scans(&self, _page: u32, _size: u32, _token: &str) -> Result<Page<ScanRecord>, BackendError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.history_reply)
            .clone()
            .unwrap_or_else(|| Ok(Page { items: Vec::new(), total_pages: 0 }))
    }
}

/// Decrements the in-flight counter when a request finishes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
