//! The platform telephony stack, seen from the orchestrator.
//!
//! A [`CellScanSource`] answers three queries: start a multi-RAT network
//! scan, list the registered cells, and report the last known cell location.
//! Network scans run on the platform's own execution context and report back
//! through a [`ScanCallback`], which may be driven from any thread.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    config::ScanConfig,
    error::ScanError,
    model::{CellLocation, RawCellObservation},
};

pub mod replay;

pub use replay::ReplaySource;

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessNetwork {
    /// 2G
    Geran,
    /// 4G
    Eutran,
    /// 3G
    Utran,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkScanRequest {
    /// Orchestrator request this scan belongs to.
    pub request_id: RequestId,
    pub access_networks: Vec<AccessNetwork>,
    /// Restart period if no network is found. Unused for one-shot scans but
    /// still validated by the platform.
    pub periodicity: Duration,
    pub max_search_time: Duration,
    pub incremental_results: bool,
    pub incremental_periodicity: Duration,
}

impl NetworkScanRequest {
    /// A one-shot scan across GSM, LTE and WCDMA reporting only final results.
    pub fn one_shot(request_id: RequestId, config: &ScanConfig) -> Self {
        Self {
            request_id,
            access_networks: vec![AccessNetwork::Geran, AccessNetwork::Eutran, AccessNetwork::Utran],
            periodicity: config.periodicity(),
            max_search_time: config.max_search_time(),
            incremental_results: false,
            incremental_periodicity: config.incremental_periodicity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkScanEvent {
    /// Observations found so far. A later event replaces an earlier one.
    Results(Vec<RawCellObservation>),
    Complete,
    /// Scan-specific platform error code.
    Error(i32),
    /// The platform scan subsystem itself failed.
    Fault(String),
}

/// Best-effort cancellation of a running platform scan.
pub trait StopScan: Send + Sync {
    fn stop_scan(&self);
}

/// Sending half of a network scan, handed to the platform adapter.
///
/// Sends after the orchestrator stopped listening are dropped.
#[derive(Debug, Clone)]
pub struct ScanCallback {
    tx: mpsc::UnboundedSender<NetworkScanEvent>,
}

impl ScanCallback {
    pub fn on_results(&self, cells: Vec<RawCellObservation>) {
        self.send(NetworkScanEvent::Results(cells));
    }

    pub fn on_complete(&self) {
        self.send(NetworkScanEvent::Complete);
    }

    pub fn on_error(&self, code: i32) {
        self.send(NetworkScanEvent::Error(code));
    }

    pub fn on_fault(&self, message: impl Into<String>) {
        self.send(NetworkScanEvent::Fault(message.into()));
    }

    fn send(&self, event: NetworkScanEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("network scan event after request finished");
        }
    }
}

/// Receiving half of a network scan, returned to the orchestrator.
pub struct NetworkScan {
    events: mpsc::UnboundedReceiver<NetworkScanEvent>,
    control: Arc<dyn StopScan>,
}

impl NetworkScan {
    pub fn channel(control: Arc<dyn StopScan>) -> (ScanCallback, NetworkScan) {
        let (tx, events) = mpsc::unbounded_channel();
        (ScanCallback { tx }, NetworkScan { events, control })
    }

    /// `None` once every [`ScanCallback`] is gone.
    pub async fn next_event(&mut self) -> Option<NetworkScanEvent> {
        self.events.recv().await
    }

    pub fn control(&self) -> Arc<dyn StopScan> {
        Arc::clone(&self.control)
    }
}

/// The platform telephony stack.
pub trait CellScanSource: Send + Sync {
    /// Starts an asynchronous multi-RAT network scan.
    fn request_network_scan(&self, request: &NetworkScanRequest) -> Result<NetworkScan, ScanError>;

    /// Currently registered cells. `None` when the platform refused the query.
    fn registered_cells(&self) -> Option<Vec<RawCellObservation>>;

    fn last_known_location(&self) -> Option<CellLocation>;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[derive(Default)]
    struct Flag(AtomicBool);

    impl StopScan for Flag {
        fn stop_scan(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn one_shot_request_covers_three_networks() {
        let request = NetworkScanRequest::one_shot(4, &ScanConfig::default());
        assert_eq!(request.request_id, 4);
        assert_eq!(
            request.access_networks,
            [AccessNetwork::Geran, AccessNetwork::Eutran, AccessNetwork::Utran]
        );
        assert!(!request.incremental_results);
        assert!(request.periodicity > Duration::from_secs(5));
        assert!(request.max_search_time > Duration::from_secs(60));
    }

    #[tokio::test]
    async fn events_arrive_in_order_then_close() {
        let flag = Arc::new(Flag::default());
        let (callback, mut scan) = NetworkScan::channel(flag.clone());
        callback.on_results(Vec::new());
        callback.on_complete();
        drop(callback);

        assert_eq!(scan.next_event().await, Some(NetworkScanEvent::Results(Vec::new())));
        assert_eq!(scan.next_event().await, Some(NetworkScanEvent::Complete));
        assert_eq!(scan.next_event().await, None);

        scan.control().stop_scan();
        assert!(flag.0.load(Ordering::SeqCst));
    }

    #[test]
    fn sending_after_close_is_silent() {
        let (callback, scan) = NetworkScan::channel(Arc::new(Flag::default()));
        drop(scan);
        callback.on_fault("late");
    }
}
