//! Radio-cell scan normalization.
//!
//! Takes raw GSM/CDMA/LTE/WCDMA observations from a platform telephony stack,
//! drops the ones carrying "not reported" sentinels and turns the rest into
//! one uniform record shape. The [`scan::CellScanner`] drives the platform
//! through three data sources, weakest last: an active multi-RAT scan, the
//! registered-cell snapshot and the last known cell location.

pub mod capability;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod output;
pub mod record;
pub mod scan;
pub mod source;
pub mod validity;
pub mod wifi;

pub use capability::{DeviceCapability, PlatformVersion};
pub use error::{ConfigError, ScanError};
pub use model::{CellLocation, RadioTechnology, RawCellObservation, UNAVAILABLE};
pub use record::{NormalizedCellRecord, ScanFailure, ScanOutcome, ScanResultSet, ERROR_KEY};
pub use scan::{CellScanner, FaultRelay};
pub use source::{CellScanSource, NetworkScan, NetworkScanEvent, NetworkScanRequest, ScanCallback};
