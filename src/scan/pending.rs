//! Single-slot bookkeeping for the request currently in flight.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    record::{ScanFailure, ScanOutcome},
    source::RequestId,
};

/// Resolves one request at most once, from whichever side gets there first.
pub(crate) struct Resolver {
    tx: Mutex<Option<oneshot::Sender<ScanOutcome>>>,
}

impl Resolver {
    pub(crate) fn new(tx: oneshot::Sender<ScanOutcome>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    /// Returns false if the request was already resolved.
    pub(crate) fn resolve(&self, outcome: ScanOutcome) -> bool {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        match tx {
            // the caller may have stopped waiting, which still counts
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

struct Pending {
    id: RequestId,
    resolver: Arc<Resolver>,
}

/// Holds the most recent request only. Installing a new one forgets the
/// previous one, which is then resolved only by its own strategy.
#[derive(Default)]
pub(crate) struct PendingSlot {
    current: Mutex<Option<Pending>>,
}

impl PendingSlot {
    pub(crate) fn install(&self, id: RequestId, resolver: Arc<Resolver>) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Pending { id, resolver });
        if let Some(previous) = previous {
            debug!(superseded = previous.id, request_id = id, "new cell scan request supersedes pending one");
        }
    }

    /// Takes the resolver out of the slot if `id` is still the pending request.
    pub(crate) fn take(&self, id: RequestId) -> Option<Arc<Resolver>> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|p| p.id == id) {
            current.take().map(|p| p.resolver)
        } else {
            None
        }
    }

    pub(crate) fn current(&self) -> Option<RequestId> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.id)
    }
}

/// Forwards faults caught by an ambient platform hook into the request they
/// belong to.
///
/// Adapters that can only observe scan subsystem failures through a
/// process-wide hook record the [`RequestId`] of the scan they started and
/// report against it. A fault for a request that is no longer pending is
/// ignored, so it can never resolve a newer request.
#[derive(Clone)]
pub struct FaultRelay {
    slot: Weak<PendingSlot>,
}

impl FaultRelay {
    pub(crate) fn new(slot: &Arc<PendingSlot>) -> Self {
        Self {
            slot: Arc::downgrade(slot),
        }
    }

    /// Returns true if the fault resolved the request.
    pub fn report(&self, request_id: RequestId, message: &str) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        match slot.take(request_id) {
            Some(resolver) => {
                warn!(request_id, fault = message, "runtime fault in platform scan subsystem");
                resolver.resolve(ScanOutcome::Failed(ScanFailure::RuntimeFault))
            }
            None => {
                debug!(request_id, fault = message, "ignoring fault for a request that is no longer pending");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> (Arc<Resolver>, oneshot::Receiver<ScanOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Arc::new(Resolver::new(tx)), rx)
    }

    #[test]
    fn resolves_once() {
        let (resolver, mut rx) = resolver();
        assert!(resolver.resolve(ScanOutcome::Failed(ScanFailure::NoData)));
        assert!(!resolver.resolve(ScanOutcome::Failed(ScanFailure::RuntimeFault)));
        assert_eq!(rx.try_recv().unwrap(), ScanOutcome::Failed(ScanFailure::NoData));
    }

    #[test]
    fn take_only_matches_current_request() {
        let slot = PendingSlot::default();
        let (first, _rx1) = resolver();
        let (second, _rx2) = resolver();
        slot.install(1, first);
        slot.install(2, second);

        assert!(slot.take(1).is_none());
        assert_eq!(slot.current(), Some(2));
        assert!(slot.take(2).is_some());
        assert_eq!(slot.current(), None);
        assert!(slot.take(2).is_none());
    }

    #[test]
    fn relay_ignores_stale_request() {
        let slot = Arc::new(PendingSlot::default());
        let relay = FaultRelay::new(&slot);
        let (first, mut rx1) = resolver();
        let (second, mut rx2) = resolver();
        slot.install(1, first);
        slot.install(2, second);

        assert!(!relay.report(1, "late fault"));
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_err());

        assert!(relay.report(2, "fault"));
        assert_eq!(rx2.try_recv().unwrap(), ScanOutcome::Failed(ScanFailure::RuntimeFault));
    }

    #[test]
    fn relay_outliving_scanner_is_inert() {
        let slot = Arc::new(PendingSlot::default());
        let relay = FaultRelay::new(&slot);
        drop(slot);
        assert!(!relay.report(1, "fault"));
    }
}
