//! Rejects observations carrying platform placeholder values.

use tracing::trace;

use crate::model::{RawCellObservation, UNAVAILABLE};

/// Identity fields a technology must report, plus its country/network code
/// pair when it has one.
struct Identity {
    fields: Vec<(&'static str, i32)>,
    codes: Option<(i32, i32)>,
}

fn identity(obs: &RawCellObservation) -> Identity {
    match obs {
        RawCellObservation::Gsm(c) => Identity {
            fields: vec![("cid", c.cid), ("lac", c.lac), ("mcc", c.mcc), ("mnc", c.mnc)],
            codes: Some((c.mcc, c.mnc)),
        },
        RawCellObservation::Cdma(c) => Identity {
            fields: vec![
                ("baseStationId", c.base_station_id),
                ("systemId", c.system_id),
                ("networkId", c.network_id),
            ],
            codes: None,
        },
        RawCellObservation::Lte(c) => Identity {
            fields: vec![("ci", c.ci), ("mcc", c.mcc), ("mnc", c.mnc)],
            codes: Some((c.mcc, c.mnc)),
        },
        RawCellObservation::Wcdma(c) => Identity {
            fields: vec![("cid", c.cid), ("lac", c.lac), ("mcc", c.mcc), ("mnc", c.mnc)],
            codes: Some((c.mcc, c.mnc)),
        },
        // nothing to check
        RawCellObservation::Unknown => Identity {
            fields: Vec::new(),
            codes: None,
        },
    }
}

/// Whether an observation identifies a real cell.
///
/// Every identity field must be reported, and a 0/0 country/network pair
/// means the radio is not camped on any network.
pub fn is_valid(obs: &RawCellObservation) -> bool {
    let Identity { fields, codes } = identity(obs);

    if let Some((name, _)) = fields.iter().find(|(_, value)| *value == UNAVAILABLE) {
        trace!(technology = %obs.technology(), field = *name, "dropping cell with unreported identity");
        return false;
    }
    if codes == Some((0, 0)) {
        trace!(technology = %obs.technology(), "dropping cell with 0/0 country and network code");
        return false;
    }
    true
}

/// Keeps the valid observations, in their original order.
pub fn retain_valid(mut cells: Vec<RawCellObservation>) -> Vec<RawCellObservation> {
    cells.retain(is_valid);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CdmaCell, GsmCell, LteCell, WcdmaCell};

    fn gsm(mcc: i32, mnc: i32) -> RawCellObservation {
        RawCellObservation::Gsm(GsmCell {
            cid: 5,
            lac: 7,
            mcc,
            mnc,
            mcc_string: None,
            mnc_string: None,
            bsic: 3,
            arfcn: 12,
            dbm: -80,
        })
    }

    fn cdma(base_station_id: i32, network_id: i32, system_id: i32) -> RawCellObservation {
        RawCellObservation::Cdma(CdmaCell {
            base_station_id,
            network_id,
            system_id,
            dbm: -70,
        })
    }

    fn lte(ci: i32) -> RawCellObservation {
        RawCellObservation::Lte(LteCell {
            ci,
            pci: UNAVAILABLE,
            tac: UNAVAILABLE,
            mcc: 310,
            mnc: 260,
            mcc_string: None,
            mnc_string: None,
            earfcn: UNAVAILABLE,
            dbm: -95,
            timing_advance: UNAVAILABLE,
        })
    }

    fn wcdma(lac: i32) -> RawCellObservation {
        RawCellObservation::Wcdma(WcdmaCell {
            cid: 99,
            lac,
            psc: 120,
            mcc: 234,
            mnc: 15,
            mcc_string: None,
            mnc_string: None,
            uarfcn: 10700,
            dbm: -101,
        })
    }

    #[test]
    fn zero_country_and_network_is_rejected() {
        assert!(!is_valid(&gsm(0, 0)));
        assert!(is_valid(&gsm(0, 1)));
        assert!(is_valid(&gsm(262, 0)));
    }

    #[test]
    fn zero_codes_are_rejected_for_lte_and_wcdma() {
        let lte_codes = |mcc, mnc| match lte(1234) {
            RawCellObservation::Lte(cell) => RawCellObservation::Lte(LteCell { mcc, mnc, ..cell }),
            other => other,
        };
        let wcdma_codes = |mcc, mnc| match wcdma(55) {
            RawCellObservation::Wcdma(cell) => RawCellObservation::Wcdma(WcdmaCell { mcc, mnc, ..cell }),
            other => other,
        };

        assert!(!is_valid(&lte_codes(0, 0)));
        assert!(is_valid(&lte_codes(0, 260)));
        assert!(is_valid(&lte_codes(310, 0)));

        assert!(!is_valid(&wcdma_codes(0, 0)));
        assert!(is_valid(&wcdma_codes(0, 15)));
        assert!(is_valid(&wcdma_codes(234, 0)));
    }

    #[test]
    fn unreported_identity_is_rejected() {
        assert!(!is_valid(&gsm(UNAVAILABLE, 1)));
        assert!(!is_valid(&cdma(12, UNAVAILABLE, 9)));
        assert!(!is_valid(&cdma(UNAVAILABLE, 3, 9)));
        assert!(!is_valid(&lte(UNAVAILABLE)));
        assert!(!is_valid(&wcdma(UNAVAILABLE)));
    }

    #[test]
    fn cdma_has_no_code_pair() {
        assert!(is_valid(&cdma(0, 0, 0)));
    }

    #[test]
    fn lte_only_needs_cell_identity_and_codes() {
        // physical cell id and tracking area are not identity fields
        assert!(is_valid(&lte(1234)));
    }

    #[test]
    fn unknown_technology_passes() {
        assert!(is_valid(&RawCellObservation::Unknown));
    }

    #[test]
    fn retain_keeps_order() {
        let cells = vec![lte(1), gsm(0, 0), wcdma(4), cdma(UNAVAILABLE, 1, 1), lte(2)];
        let kept = retain_valid(cells);
        assert_eq!(kept, vec![lte(1), wcdma(4), lte(2)]);
    }
}
