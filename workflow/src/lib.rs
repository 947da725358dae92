pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod gate;
pub mod history;
pub mod http;
pub mod poller;
pub mod report;
pub mod scripted;

pub use backend::{AcceptedScan, ScanBackend, StartResponse, StatusResponse};
pub use config::{ConfigDir, Settings};
pub use context::SessionContext;
pub use error::{BackendError, Result, WorkflowError};
pub use events::{AuthEvent, EventBus, Subscription};
pub use gate::{validate_url, ScanHandle, SubmissionGate};
pub use history::{fetch_history, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use http::{HttpBackend, DEFAULT_TIMEOUT};
pub use poller::{PollHandle, PollUpdate, StatusPoller, DEFAULT_POLL_INTERVAL, PROGRESS_MESSAGES};
pub use report::{remediation_for, summarize, Report};
pub use scripted::ScriptedBackend;
