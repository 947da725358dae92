use serde::{Deserialize, Serialize};

use crate::{ScanId, ScanStatus};

/// One row of the scan history list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: ScanId,
    pub target_url: String,
    /// Raw status label; see [`ScanRecord::status`] for the parsed form.
    pub status: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ScanRecord {
    pub fn status(&self) -> Option<ScanStatus> {
        self.status.parse().ok()
    }
}

/// A page of results from a paged listing endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(alias = "content")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
}
