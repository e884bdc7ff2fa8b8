mod api;
pub mod progress;

pub use api::ScanApiClient;

use crate::error::ScanError;
use crate::model::{ScanResult, ScanStats};
use std::future::Future;

/// The scanner service as seen by the controller.
///
/// `scan` settles exactly once per call; there is no cancellation.
pub trait ScanBackend: Send + Sync {
    fn scan(&self, address: &str) -> impl Future<Output = Result<ScanResult, ScanError>> + Send;

    fn fetch_stats(&self) -> impl Future<Output = Result<ScanStats, ScanError>> + Send;
}
