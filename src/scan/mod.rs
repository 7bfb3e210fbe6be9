//! Scan orchestration.
//!
//! A request tries up to three data sources, each weaker than the last:
//!
//! 1. an active multi-RAT network scan, when the device is privileged enough,
//! 2. the registered-cell snapshot,
//! 3. the last known cell location.
//!
//! A failing network scan falls back to the snapshot, and a snapshot without
//! usable cells falls back to the last known location. Nothing is retried.

use std::{
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::{
    capability::DeviceCapability,
    config::ScanConfig,
    model::RawCellObservation,
    normalize,
    record::{ScanFailure, ScanOutcome},
    source::{CellScanSource, NetworkScanEvent, NetworkScanRequest, RequestId, StopScan},
};

mod pending;

pub use pending::FaultRelay;
use pending::{PendingSlot, Resolver};

/// Entry point for cell scans. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CellScanner {
    inner: Arc<Inner>,
}

struct Inner {
    source: Option<Arc<dyn CellScanSource>>,
    config: ScanConfig,
    pending: Arc<PendingSlot>,
    active_scan: Mutex<Option<ActiveScan>>,
    next_request: AtomicU64,
}

struct ActiveScan {
    request_id: RequestId,
    control: Arc<dyn StopScan>,
}

impl CellScanner {
    /// `source` is `None` on devices without a telephony stack.
    pub fn new(source: Option<Arc<dyn CellScanSource>>, config: ScanConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                pending: Arc::default(),
                active_scan: Mutex::new(None),
                next_request: AtomicU64::new(1),
            }),
        }
    }

    /// Runs one scan request to completion.
    ///
    /// Always resolves, exactly once. Failures are reported as
    /// [`ScanOutcome::Failed`], never as a panic or a hung future. The
    /// strategy itself runs on a spawned task, so this must be called from
    /// within a Tokio runtime.
    pub async fn get_cell_scan_results(&self, capability: DeviceCapability) -> ScanOutcome {
        let request_id = self.inner.next_request.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let resolver = Arc::new(Resolver::new(tx));
        self.inner.pending.install(request_id, Arc::clone(&resolver));

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(inner.run(request_id, capability)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(request_id, "cell scan strategy panicked");
                    ScanOutcome::Failed(ScanFailure::RuntimeFault)
                }
            };
            inner.finish(request_id);
            resolver.resolve(outcome);
        });

        rx.await.unwrap_or(ScanOutcome::Failed(ScanFailure::RuntimeFault))
    }

    /// Asks the running network scan, if any, to stop.
    pub fn stop_cell_scan(&self) {
        let control = self
            .inner
            .active_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|active| Arc::clone(&active.control));
        if let Some(control) = control {
            debug!("stopping cell scan");
            control.stop_scan();
        }
    }

    /// Handle for adapters that learn about scan faults out of band.
    pub fn fault_relay(&self) -> FaultRelay {
        FaultRelay::new(&self.inner.pending)
    }

    /// The request that out-of-band faults currently resolve.
    pub fn pending_request(&self) -> Option<RequestId> {
        self.inner.pending.current()
    }
}

impl Inner {
    async fn run(&self, request_id: RequestId, capability: DeviceCapability) -> ScanOutcome {
        if !capability.read_phone_state {
            debug!(request_id, "READ_PHONE_STATE permission not granted");
            return ScanOutcome::Failed(ScanFailure::PermissionDenied);
        }
        let Some(source) = self.source.as_deref() else {
            debug!(request_id, "telephony source is not available");
            return ScanOutcome::Failed(ScanFailure::SourceUnavailable);
        };

        if capability.supports_multi_rat_scan() {
            self.scan_all_networks(request_id, source, &capability).await
        } else {
            self.scan_registered_network(source, &capability)
        }
    }

    async fn scan_all_networks(
        &self,
        request_id: RequestId,
        source: &dyn CellScanSource,
        capability: &DeviceCapability,
    ) -> ScanOutcome {
        debug!(request_id, "performing network scan across all radio access networks");
        let request = NetworkScanRequest::one_shot(request_id, &self.config);
        let mut scan = match source.request_network_scan(&request) {
            Ok(scan) => scan,
            Err(e) => {
                debug!(request_id, error = %e, "network scan request failed, falling back to registered cells");
                return self.scan_registered_network(source, capability);
            }
        };
        self.set_active(request_id, scan.control());

        let mut cells = Vec::new();
        loop {
            match scan.next_event().await {
                Some(NetworkScanEvent::Results(results)) => {
                    debug!(request_id, count = results.len(), "received network scan results");
                    cells = results;
                }
                Some(NetworkScanEvent::Complete) => {
                    debug!(request_id, "network scan complete");
                    return self.process(source, capability, cells);
                }
                Some(NetworkScanEvent::Error(code)) => {
                    debug!(request_id, code, "network scan failed, falling back to registered cells");
                    return self.scan_registered_network(source, capability);
                }
                Some(NetworkScanEvent::Fault(message)) => {
                    warn!(request_id, fault = %message, "runtime fault in platform scan subsystem");
                    return ScanOutcome::Failed(ScanFailure::RuntimeFault);
                }
                None => {
                    debug!(request_id, "network scan ended without completing, falling back to registered cells");
                    return self.scan_registered_network(source, capability);
                }
            }
        }
    }

    fn scan_registered_network(&self, source: &dyn CellScanSource, capability: &DeviceCapability) -> ScanOutcome {
        debug!("performing network scan using registered cells");
        let mut cells = source.registered_cells().unwrap_or_else(|| {
            debug!("registered cell query was refused");
            Vec::new()
        });
        // the snapshot only counts cells it can identify
        cells.retain(|cell| {
            let known = !matches!(cell, RawCellObservation::Unknown);
            if !known {
                trace!("dropping registered cell of unknown type");
            }
            known
        });
        self.process(source, capability, cells)
    }

    fn process(
        &self,
        source: &dyn CellScanSource,
        capability: &DeviceCapability,
        cells: Vec<RawCellObservation>,
    ) -> ScanOutcome {
        let set = normalize::normalize(cells, capability.platform_version);
        if !set.is_empty() {
            debug!(count = set.len(), "cell scan found cells");
            return ScanOutcome::Cells(set);
        }

        debug!("cell scan found 0 cells, falling back to last known cell location");
        if !capability.fine_location {
            debug!("no location permission for last known cell location");
            return ScanOutcome::Failed(ScanFailure::NoData);
        }
        match source.last_known_location() {
            Some(location) => ScanOutcome::LastKnown(normalize::from_location(&location)),
            None => {
                debug!("last known cell location returned no results");
                ScanOutcome::Failed(ScanFailure::NoData)
            }
        }
    }

    fn set_active(&self, request_id: RequestId, control: Arc<dyn StopScan>) {
        *self.active_scan.lock().unwrap_or_else(PoisonError::into_inner) = Some(ActiveScan { request_id, control });
    }

    /// Forgets any state still tied to `request_id`.
    fn finish(&self, request_id: RequestId) {
        let mut active = self.active_scan.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|a| a.request_id == request_id) {
            *active = None;
        }
        drop(active);
        self.pending.take(request_id);
    }
}
