//! Projects raw per-technology observations onto [`NormalizedCellRecord`].

use tracing::debug;

use crate::{
    capability::PlatformVersion,
    model::{reported, CdmaCell, CellLocation, GsmCell, LteCell, RadioTechnology, RawCellObservation, WcdmaCell},
    record::{NormalizedCellRecord, ScanResultSet, MIN_SIGNAL_STRENGTH},
    validity,
};

/// Drops invalid observations and projects the rest, keeping input order.
pub fn normalize(cells: Vec<RawCellObservation>, version: PlatformVersion) -> ScanResultSet {
    let total = cells.len();
    let valid = validity::retain_valid(cells);
    debug!(total, valid = valid.len(), "normalizing cell observations");

    ScanResultSet::new(valid.iter().map(|cell| project(cell, version)).collect())
}

/// Projects one observation. Does not check validity.
pub fn project(cell: &RawCellObservation, version: PlatformVersion) -> NormalizedCellRecord {
    match cell {
        RawCellObservation::Gsm(gsm) => project_gsm(gsm, version),
        RawCellObservation::Cdma(cdma) => project_cdma(cdma),
        RawCellObservation::Lte(lte) => project_lte(lte, version),
        RawCellObservation::Wcdma(wcdma) => project_wcdma(wcdma, version),
        RawCellObservation::Unknown => {
            debug!("unknown cell type");
            NormalizedCellRecord::unknown()
        }
    }
}

/// Builds the single record for a last known cell location.
///
/// The location carries no power reading, so the signal is always the floor.
pub fn from_location(location: &CellLocation) -> NormalizedCellRecord {
    match location {
        CellLocation::Gsm { cid, lac } => {
            let mut record = NormalizedCellRecord::new(RadioTechnology::Gsm, cid.to_string(), MIN_SIGNAL_STRENGTH);
            record.location_area_code = Some(lac.to_string());
            record
        }
        CellLocation::Cdma {
            base_station_id,
            network_id,
            system_id,
        } => {
            let mut record =
                NormalizedCellRecord::new(RadioTechnology::Cdma, base_station_id.to_string(), MIN_SIGNAL_STRENGTH);
            record.base_station_id = Some(base_station_id.to_string());
            record.network_id = Some(network_id.to_string());
            record.system_id = Some(system_id.to_string());
            record
        }
        CellLocation::Other => {
            debug!("unknown cell location type");
            NormalizedCellRecord::unknown()
        }
    }
}

/// Signal strength in dBm, 0 when the platform had no reading.
fn signal(dbm: i32) -> i32 {
    reported(dbm).unwrap_or(0)
}

fn identifier(value: i32) -> String {
    reported(value).unwrap_or(0).to_string()
}

fn text(value: i32) -> Option<String> {
    reported(value).map(|v| v.to_string())
}

/// Numeric country/network codes, replaced by the string forms when the
/// platform is new enough to report them.
fn network_codes(
    record: &mut NormalizedCellRecord,
    version: PlatformVersion,
    (mcc, mnc): (i32, i32),
    (mcc_string, mnc_string): (&Option<String>, &Option<String>),
) {
    record.mobile_country_code = text(mcc);
    record.mobile_network_code = text(mnc);
    if version.has_string_codes() {
        if let Some(mcc) = mcc_string {
            record.mobile_country_code = Some(mcc.clone());
        }
        if let Some(mnc) = mnc_string {
            record.mobile_network_code = Some(mnc.clone());
        }
    }
}

fn project_gsm(cell: &GsmCell, version: PlatformVersion) -> NormalizedCellRecord {
    let mut record = NormalizedCellRecord::new(RadioTechnology::Gsm, identifier(cell.cid), signal(cell.dbm));
    record.location_area_code = text(cell.lac);
    network_codes(
        &mut record,
        version,
        (cell.mcc, cell.mnc),
        (&cell.mcc_string, &cell.mnc_string),
    );
    if version.has_channel_numbers() {
        record.base_station_id = text(cell.bsic);
        record.arfcn = reported(cell.arfcn);
    }
    record
}

fn project_cdma(cell: &CdmaCell) -> NormalizedCellRecord {
    let mut record =
        NormalizedCellRecord::new(RadioTechnology::Cdma, identifier(cell.base_station_id), signal(cell.dbm));
    record.base_station_id = text(cell.base_station_id);
    record.network_id = text(cell.network_id);
    record.system_id = text(cell.system_id);
    record
}

fn project_lte(cell: &LteCell, version: PlatformVersion) -> NormalizedCellRecord {
    let mut record = NormalizedCellRecord::new(RadioTechnology::Lte, identifier(cell.ci), signal(cell.dbm));
    record.physical_cell_id = text(cell.pci);
    record.tracking_area_code = text(cell.tac);
    record.timing_advance = reported(cell.timing_advance);
    network_codes(
        &mut record,
        version,
        (cell.mcc, cell.mnc),
        (&cell.mcc_string, &cell.mnc_string),
    );
    if version.has_channel_numbers() {
        record.earfcn = reported(cell.earfcn);
    }
    record
}

fn project_wcdma(cell: &WcdmaCell, version: PlatformVersion) -> NormalizedCellRecord {
    let mut record = NormalizedCellRecord::new(RadioTechnology::Wcdma, identifier(cell.cid), signal(cell.dbm));
    record.location_area_code = text(cell.lac);
    record.primary_scrambling_code = text(cell.psc);
    network_codes(
        &mut record,
        version,
        (cell.mcc, cell.mnc),
        (&cell.mcc_string, &cell.mnc_string),
    );
    if version.has_channel_numbers() {
        record.uarfcn = reported(cell.uarfcn);
    }
    record
}
