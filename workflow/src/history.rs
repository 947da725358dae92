use models::{Page, ScanRecord};
use tracing::warn;

use crate::backend::ScanBackend;
use crate::error::{BackendError, Result, WorkflowError};
use crate::events::{AuthEvent, EventBus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Fetch one page of the caller's scan history.
///
/// `size` is clamped to `1..=MAX_PAGE_SIZE`. Credentials are checked the
/// same way as for a scan submission.
pub async fn fetch_history(
    backend: &dyn ScanBackend,
    events: &EventBus,
    auth_token: Option<&str>,
    page: u32,
    size: u32,
) -> Result<Page<ScanRecord>> {
    let token = auth_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(WorkflowError::AuthRequired)?;

    match backend.list_scans(page, size.clamp(1, MAX_PAGE_SIZE), token).await {
        Ok(page) => Ok(page),
        Err(BackendError::Unauthorized) => {
            events.publish(AuthEvent::SessionExpired);
            Err(WorkflowError::AuthRequired)
        }
        Err(e) => {
            warn!(error = %e, "history request failed");
            Err(e.into())
        }
    }
}
