//! The uniform output schema and the outcome handed back to callers.

use serde::Serialize;
use serde_json::{Map, Value};
use strum::{EnumIter, IntoStaticStr};

use crate::model::RadioTechnology;

/// Key under which failure outcomes carry their code.
pub const ERROR_KEY: &str = "error";

/// Signal floor used when no power reading exists.
pub const MIN_SIGNAL_STRENGTH: i32 = -110;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCellRecord {
    pub network_type: RadioTechnology,
    #[serde(rename = "cellID")]
    pub cell_id: String,
    pub signal_strength: i32,
    #[serde(rename = "physicalCellID", skip_serializing_if = "Option::is_none")]
    pub physical_cell_id: Option<String>,
    #[serde(rename = "baseStationID", skip_serializing_if = "Option::is_none")]
    pub base_station_id: Option<String>,
    #[serde(rename = "networkID", skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(rename = "systemID", skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_network_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_scrambling_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arfcn: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earfcn: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uarfcn: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_advance: Option<i32>,
}

impl NormalizedCellRecord {
    /// A record with only the mandatory fields set.
    pub fn new(network_type: RadioTechnology, cell_id: impl Into<String>, signal_strength: i32) -> Self {
        Self {
            network_type,
            cell_id: cell_id.into(),
            signal_strength,
            physical_cell_id: None,
            base_station_id: None,
            network_id: None,
            system_id: None,
            mobile_country_code: None,
            mobile_network_code: None,
            location_area_code: None,
            tracking_area_code: None,
            primary_scrambling_code: None,
            arfcn: None,
            earfcn: None,
            uarfcn: None,
            timing_advance: None,
        }
    }

    /// The record emitted for a technology nothing is known about.
    pub fn unknown() -> Self {
        let mut record = Self::new(RadioTechnology::Unknown, "0", MIN_SIGNAL_STRENGTH);
        record.mobile_network_code = Some("0".to_owned());
        record
    }
}

/// Normalized records in scan order, indexed from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResultSet {
    records: Vec<NormalizedCellRecord>,
}

impl ScanResultSet {
    pub fn new(records: Vec<NormalizedCellRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NormalizedCellRecord] {
        &self.records
    }

    /// `{"0": {...}, "1": {...}}`
    pub fn to_map(&self) -> Map<String, Value> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (i.to_string(), record_value(record)))
            .collect()
    }
}

fn record_value(record: &NormalizedCellRecord) -> Value {
    // a struct of strings and integers always serializes
    serde_json::to_value(record).unwrap_or(Value::Null)
}

/// Caller-visible failure kinds. They are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter)]
pub enum ScanFailure {
    #[strum(serialize = "errorPermission")]
    PermissionDenied,
    #[strum(serialize = "errorTelephonyManager")]
    SourceUnavailable,
    #[strum(serialize = "errorNoData")]
    NoData,
    #[strum(serialize = "errorRuntimeEx")]
    RuntimeFault,
}

impl ScanFailure {
    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn description(self) -> &'static str {
        match self {
            ScanFailure::PermissionDenied => "READ_PHONE_STATE permission not granted",
            ScanFailure::SourceUnavailable => "telephony source is not available",
            ScanFailure::NoData => "no cell observation or cell location available",
            ScanFailure::RuntimeFault => "runtime fault in the platform scan subsystem",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Live observations, never empty.
    Cells(ScanResultSet),
    /// Synthesized from the last known cell location.
    LastKnown(NormalizedCellRecord),
    Failed(ScanFailure),
}

impl ScanOutcome {
    pub fn to_map(&self) -> Map<String, Value> {
        match self {
            ScanOutcome::Cells(set) => set.to_map(),
            ScanOutcome::LastKnown(record) => {
                let mut map = Map::new();
                map.insert("0".to_owned(), record_value(record));
                map
            }
            ScanOutcome::Failed(failure) => {
                let mut map = Map::new();
                map.insert(ERROR_KEY.to_owned(), Value::from(failure.code()));
                map
            }
        }
    }

    /// Records in output order; empty for a failure.
    pub fn records(&self) -> &[NormalizedCellRecord] {
        match self {
            ScanOutcome::Cells(set) => set.records(),
            ScanOutcome::LastKnown(record) => std::slice::from_ref(record),
            ScanOutcome::Failed(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<ScanFailure> {
        match self {
            ScanOutcome::Failed(failure) => Some(*failure),
            _ => None,
        }
    }
}
