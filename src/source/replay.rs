//! Scan source that replays a recorded platform session.
//!
//! A session file describes what the platform answered: the events of a
//! network scan (or its rejection), the registered-cell snapshot and the last
//! known location. JSON and TOML are both accepted.

use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::{CellScanSource, NetworkScan, NetworkScanRequest, StopScan};
use crate::{
    capability::DeviceCapability,
    error::ScanError,
    model::{CellLocation, RawCellObservation},
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub capability: DeviceCapability,
    /// Whether the device has a telephony stack at all.
    #[serde(default = "default_true")]
    pub telephony: bool,
    #[serde(default)]
    pub network_scan: Option<RecordedScan>,
    #[serde(default)]
    pub registered_cells: Option<Vec<RawCellObservation>>,
    #[serde(default)]
    pub last_known_location: Option<CellLocation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedScan {
    /// Set when the platform refused to start the scan.
    #[serde(default)]
    pub rejected: Option<String>,
    /// Set when the platform failed the request with an error code.
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub events: Vec<RecordedEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordedEvent {
    Results { cells: Vec<RawCellObservation> },
    Complete,
    Error { code: i32 },
    Fault { message: String },
}

#[derive(Default)]
struct StopCounter(AtomicUsize);

impl StopScan for StopCounter {
    fn stop_scan(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
        debug!("stop requested for replayed network scan");
    }
}

pub struct ReplaySource {
    session: Session,
    stops: Arc<StopCounter>,
}

impl ReplaySource {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            stops: Arc::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session {}", path.display()))?;
        let session = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&data).context("Failed to parse session")?
        } else {
            serde_json::from_str(&data).context("Failed to parse session")?
        };
        Ok(Self::new(session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// How many times a replayed scan was asked to stop.
    pub fn stop_count(&self) -> usize {
        self.stops.0.load(Ordering::SeqCst)
    }
}

impl CellScanSource for ReplaySource {
    fn request_network_scan(&self, request: &NetworkScanRequest) -> Result<NetworkScan, ScanError> {
        let recorded = self.session.network_scan.as_ref().ok_or(ScanError::Unsupported)?;
        if let Some(reason) = &recorded.rejected {
            return Err(ScanError::Rejected(reason.clone()));
        }
        if let Some(code) = recorded.error_code {
            return Err(ScanError::Platform(code));
        }

        debug!(request_id = request.request_id, events = recorded.events.len(), "replaying network scan");
        let (callback, scan) = NetworkScan::channel(self.stops.clone());
        for event in &recorded.events {
            match event {
                RecordedEvent::Results { cells } => callback.on_results(cells.clone()),
                RecordedEvent::Complete => callback.on_complete(),
                RecordedEvent::Error { code } => callback.on_error(*code),
                RecordedEvent::Fault { message } => callback.on_fault(message.clone()),
            }
        }
        // dropping the callback closes the scan after the recorded events
        Ok(scan)
    }

    fn registered_cells(&self) -> Option<Vec<RawCellObservation>> {
        self.session.registered_cells.clone()
    }

    fn last_known_location(&self) -> Option<CellLocation> {
        self.session.last_known_location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ScanConfig, source::NetworkScanEvent};

    const SESSION: &str = r#"{
        "capability": {"platformVersion": 29, "carrierPrivileges": true, "readPhoneState": true},
        "networkScan": {"events": [
            {"kind": "results", "cells": [{"type": "gsm", "cid": 5, "lac": 7, "mcc": 1, "mnc": 1}]},
            {"kind": "complete"}
        ]},
        "lastKnownLocation": {"type": "cdma", "baseStationId": 12, "networkId": 3, "systemId": 9}
    }"#;

    #[tokio::test]
    async fn replays_recorded_events() {
        let session: Session = serde_json::from_str(SESSION).unwrap();
        assert!(session.telephony);
        assert!(session.capability.supports_multi_rat_scan());

        let source = ReplaySource::new(session);
        let request = NetworkScanRequest::one_shot(1, &ScanConfig::default());
        let mut scan = source.request_network_scan(&request).unwrap();

        assert!(matches!(scan.next_event().await, Some(NetworkScanEvent::Results(cells)) if cells.len() == 1));
        assert_eq!(scan.next_event().await, Some(NetworkScanEvent::Complete));
        assert_eq!(scan.next_event().await, None);

        scan.control().stop_scan();
        assert_eq!(source.stop_count(), 1);
    }

    #[test]
    fn missing_scan_is_unsupported() {
        let session: Session = serde_json::from_str("{}").unwrap();
        let source = ReplaySource::new(session);
        let request = NetworkScanRequest::one_shot(1, &ScanConfig::default());
        assert_eq!(source.request_network_scan(&request).err(), Some(ScanError::Unsupported));
        assert_eq!(source.registered_cells(), None);
    }

    #[test]
    fn recorded_request_failures() {
        let session: Session =
            serde_json::from_str(r#"{"networkScan": {"errorCode": 2}}"#).unwrap();
        let request = NetworkScanRequest::one_shot(1, &ScanConfig::default());
        assert_eq!(
            ReplaySource::new(session).request_network_scan(&request).err(),
            Some(ScanError::Platform(2))
        );

        let session: Session =
            serde_json::from_str(r#"{"networkScan": {"rejected": "modem busy"}}"#).unwrap();
        assert_eq!(
            ReplaySource::new(session).request_network_scan(&request).err(),
            Some(ScanError::Rejected("modem busy".to_owned()))
        );
    }

    #[test]
    fn toml_session() {
        let session: Session = toml::from_str(
            r#"
            [capability]
            platformVersion = 27
            readPhoneState = true
            fineLocation = true

            [lastKnownLocation]
            type = "gsm"
            cid = 5
            lac = 7
            "#,
        )
        .unwrap();
        assert_eq!(session.last_known_location, Some(CellLocation::Gsm { cid: 5, lac: 7 }));
        assert!(!session.capability.supports_multi_rat_scan());
    }
}
