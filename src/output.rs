//! Rendering of scan outcomes for the command line.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use crate::{
    model::RadioTechnology,
    record::{NormalizedCellRecord, ScanOutcome, ERROR_KEY},
    wifi::WifiOutcome,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Index-keyed JSON object
    #[default]
    Json,
    /// One row per record
    Csv,
}

/// CSV representation of a record. Every column is always present.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Row<'a> {
    index: usize,
    network_type: RadioTechnology,
    #[serde(rename = "cellID")]
    cell_id: &'a str,
    signal_strength: i32,
    #[serde(rename = "physicalCellID")]
    physical_cell_id: Option<&'a str>,
    #[serde(rename = "baseStationID")]
    base_station_id: Option<&'a str>,
    #[serde(rename = "networkID")]
    network_id: Option<&'a str>,
    #[serde(rename = "systemID")]
    system_id: Option<&'a str>,
    mobile_country_code: Option<&'a str>,
    mobile_network_code: Option<&'a str>,
    location_area_code: Option<&'a str>,
    tracking_area_code: Option<&'a str>,
    primary_scrambling_code: Option<&'a str>,
    arfcn: Option<i32>,
    earfcn: Option<i32>,
    uarfcn: Option<i32>,
    timing_advance: Option<i32>,
}

impl<'a> Row<'a> {
    fn new(index: usize, r: &'a NormalizedCellRecord) -> Self {
        Self {
            index,
            network_type: r.network_type,
            cell_id: &r.cell_id,
            signal_strength: r.signal_strength,
            physical_cell_id: r.physical_cell_id.as_deref(),
            base_station_id: r.base_station_id.as_deref(),
            network_id: r.network_id.as_deref(),
            system_id: r.system_id.as_deref(),
            mobile_country_code: r.mobile_country_code.as_deref(),
            mobile_network_code: r.mobile_network_code.as_deref(),
            location_area_code: r.location_area_code.as_deref(),
            tracking_area_code: r.tracking_area_code.as_deref(),
            primary_scrambling_code: r.primary_scrambling_code.as_deref(),
            arfcn: r.arfcn,
            earfcn: r.earfcn,
            uarfcn: r.uarfcn,
            timing_advance: r.timing_advance,
        }
    }
}

pub fn write_outcome(outcome: &ScanOutcome, format: Format, out: impl Write) -> Result<()> {
    match format {
        Format::Json => write_json(&Value::Object(outcome.to_map()), out),
        Format::Csv => write_csv(outcome, out),
    }
}

pub fn write_wifi(outcome: &WifiOutcome, out: impl Write) -> Result<()> {
    write_json(&Value::Object(outcome.to_map()), out)
}

fn write_json(value: &Value, mut out: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv(outcome: &ScanOutcome, out: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if let Some(failure) = outcome.failure() {
        writer.write_record([ERROR_KEY])?;
        writer.write_record([failure.code()])?;
    } else {
        for (i, record) in outcome.records().iter().enumerate() {
            writer.serialize(Row::new(i, record))?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::record::{ScanFailure, ScanResultSet};

    fn render(outcome: &ScanOutcome, format: Format) -> String {
        let mut buf = Vec::new();
        write_outcome(outcome, format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn csv_rows_have_every_column() {
        let mut lte = NormalizedCellRecord::new(RadioTechnology::Lte, "17", -90);
        lte.tracking_area_code = Some("4012".to_owned());
        lte.earfcn = Some(5230);
        let outcome = ScanOutcome::Cells(ScanResultSet::new(vec![lte, NormalizedCellRecord::unknown()]));

        assert_eq!(
            render(&outcome, Format::Csv),
            "index,networkType,cellID,signalStrength,physicalCellID,baseStationID,networkID,systemID,\
             mobileCountryCode,mobileNetworkCode,locationAreaCode,trackingAreaCode,primaryScramblingCode,\
             arfcn,earfcn,uarfcn,timingAdvance\n\
             0,LTE,17,-90,,,,,,,,4012,,,5230,,\n\
             1,UNKNOWN,0,-110,,,,,,0,,,,,,,\n"
        );
    }

    #[test]
    fn csv_failure_is_a_single_error_column() {
        let outcome = ScanOutcome::Failed(ScanFailure::PermissionDenied);
        assert_eq!(render(&outcome, Format::Csv), "error\nerrorPermission\n");
    }

    #[test]
    fn json_matches_the_outcome_map() {
        let outcome = ScanOutcome::LastKnown(NormalizedCellRecord::new(RadioTechnology::Gsm, "5", -110));
        let rendered: Value = serde_json::from_str(&render(&outcome, Format::Json)).unwrap();
        assert_eq!(rendered, Value::Object(outcome.to_map()));
    }
}
