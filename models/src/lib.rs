mod severity;
mod kind;
mod status;
mod vulnerability;
mod session;
mod result;
mod summary;
mod record;
mod graph;

pub use severity::Severity;
pub use kind::{VulnerabilityType, GENERIC_REMEDIATION};
pub use status::ScanStatus;
pub use vulnerability::{clamp_confidence, Vulnerability};
pub use session::{ScanId, ScanSession, StatusEvent, Transition, DEFAULT_FAILURE_MESSAGE};
pub use result::ScanResult;
pub use summary::ReportSummary;
pub use record::{Page, ScanRecord};
pub use graph::{GraphData, SeverityBar};
