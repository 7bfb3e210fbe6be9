use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Value the platform reports for an integer field it does not know.
pub const UNAVAILABLE: i32 = i32::MAX;

fn unavailable() -> i32 {
    UNAVAILABLE
}

/// Returns `None` when `value` is the "not reported" sentinel.
pub fn reported(value: i32) -> Option<i32> {
    (value != UNAVAILABLE).then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RadioTechnology {
    Gsm,
    Cdma,
    Lte,
    Wcdma,
    Unknown,
}

/// One radio cell as reported by the platform at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawCellObservation {
    Gsm(GsmCell),
    Cdma(CdmaCell),
    Lte(LteCell),
    Wcdma(WcdmaCell),
    /// Technology this crate has no projection for (NR, TD-SCDMA, ...).
    #[serde(other)]
    Unknown,
}

impl RawCellObservation {
    pub fn technology(&self) -> RadioTechnology {
        match self {
            RawCellObservation::Gsm(_) => RadioTechnology::Gsm,
            RawCellObservation::Cdma(_) => RadioTechnology::Cdma,
            RawCellObservation::Lte(_) => RadioTechnology::Lte,
            RawCellObservation::Wcdma(_) => RadioTechnology::Wcdma,
            RawCellObservation::Unknown => RadioTechnology::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GsmCell {
    #[serde(default = "unavailable")]
    pub cid: i32,
    #[serde(default = "unavailable")]
    pub lac: i32,
    #[serde(default = "unavailable")]
    pub mcc: i32,
    #[serde(default = "unavailable")]
    pub mnc: i32,
    // string forms keep leading zeros ("001"), only populated on newer platforms
    #[serde(default)]
    pub mcc_string: Option<String>,
    #[serde(default)]
    pub mnc_string: Option<String>,
    #[serde(default = "unavailable")]
    pub bsic: i32,
    #[serde(default = "unavailable")]
    pub arfcn: i32,
    #[serde(default = "unavailable")]
    pub dbm: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdmaCell {
    #[serde(default = "unavailable")]
    pub base_station_id: i32,
    #[serde(default = "unavailable")]
    pub network_id: i32,
    #[serde(default = "unavailable")]
    pub system_id: i32,
    #[serde(default = "unavailable")]
    pub dbm: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LteCell {
    #[serde(default = "unavailable")]
    pub ci: i32,
    #[serde(default = "unavailable")]
    pub pci: i32,
    #[serde(default = "unavailable")]
    pub tac: i32,
    #[serde(default = "unavailable")]
    pub mcc: i32,
    #[serde(default = "unavailable")]
    pub mnc: i32,
    #[serde(default)]
    pub mcc_string: Option<String>,
    #[serde(default)]
    pub mnc_string: Option<String>,
    #[serde(default = "unavailable")]
    pub earfcn: i32,
    #[serde(default = "unavailable")]
    pub dbm: i32,
    #[serde(default = "unavailable")]
    pub timing_advance: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WcdmaCell {
    #[serde(default = "unavailable")]
    pub cid: i32,
    #[serde(default = "unavailable")]
    pub lac: i32,
    #[serde(default = "unavailable")]
    pub psc: i32,
    #[serde(default = "unavailable")]
    pub mcc: i32,
    #[serde(default = "unavailable")]
    pub mnc: i32,
    #[serde(default)]
    pub mcc_string: Option<String>,
    #[serde(default)]
    pub mnc_string: Option<String>,
    #[serde(default = "unavailable")]
    pub uarfcn: i32,
    #[serde(default = "unavailable")]
    pub dbm: i32,
}

/// Coarse position fix from the platform's last known cell location.
///
/// Unlike [`RawCellObservation`] this carries no signal reading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellLocation {
    #[serde(rename_all = "camelCase")]
    Gsm { cid: i32, lac: i32 },
    #[serde(rename_all = "camelCase")]
    Cdma {
        base_station_id: i32,
        network_id: i32,
        system_id: i32,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_unavailable() {
        let obs: RawCellObservation =
            serde_json::from_str(r#"{"type": "lte", "ci": 42, "dbm": -90}"#).unwrap();
        let RawCellObservation::Lte(lte) = obs else {
            panic!("expected lte, got {obs:?}");
        };
        assert_eq!(lte.ci, 42);
        assert_eq!(lte.tac, UNAVAILABLE);
        assert_eq!(lte.mcc_string, None);
    }

    #[test]
    fn unrecognized_tag_is_unknown() {
        let obs: RawCellObservation =
            serde_json::from_str(r#"{"type": "nr", "nci": 7}"#).unwrap();
        assert_eq!(obs.technology(), RadioTechnology::Unknown);
    }

    #[test]
    fn technology_display() {
        assert_eq!(RadioTechnology::Wcdma.to_string(), "WCDMA");
        assert_eq!(RadioTechnology::Unknown.to_string(), "UNKNOWN");
    }
}
