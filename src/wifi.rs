//! WiFi access point scan results.
//!
//! Access points are reported as last seen by the platform; no scan is
//! triggered here.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use mac_address::MacAddress;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{EnumIter, IntoStaticStr};
use tracing::debug;

use crate::{capability::DeviceCapability, record::ERROR_KEY};

const LOW_2_4GHZ: i32 = 2412;
const HIGH_2_4GHZ: i32 = 2484;
const LOW_3_65GHZ: i32 = 3655;
const HIGH_3_65GHZ: i32 = 3695;
const LOW_4_9GHZ: i32 = 4940;
const HIGH_4_9GHZ: i32 = 4990;
const LOW_5GHZ: i32 = 5030;
const HIGH_5GHZ: i32 = 5875;

const MIN_RSSI: i32 = -100;
const MAX_RSSI: i32 = -55;
/// Number of signal level buckets reported as `strength`.
pub const SIGNAL_LEVELS: i32 = 5;

/// One access point as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiScanResult {
    #[serde(default)]
    pub ssid: String,
    pub bssid: MacAddress,
    #[serde(default)]
    pub capabilities: String,
    /// RSSI in dBm.
    pub level: i32,
    /// MHz
    pub frequency: i32,
    #[serde(default)]
    pub channel_width: i32,
    /// Microseconds since boot when the access point was last seen.
    #[serde(default)]
    pub timestamp: u64,
}

pub trait WifiScanSource: Send + Sync {
    fn is_wifi_enabled(&self) -> bool;

    /// Results of the most recent platform scan.
    fn scan_results(&self) -> Vec<WifiScanResult>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPointRecord {
    pub ssid: String,
    pub strength: i32,
    pub bssid: String,
    pub capabilities: String,
    pub frequency: i32,
    pub channel: i32,
    pub band: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_width: Option<i32>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter)]
pub enum WifiBand {
    #[strum(serialize = "2.4GHz")]
    Band2_4GHz,
    #[strum(serialize = "3.65GHz")]
    Band3_65GHz,
    #[strum(serialize = "4.9GHz")]
    Band4_9GHz,
    #[strum(serialize = "5GHz")]
    Band5GHz,
}

impl WifiBand {
    pub fn from_frequency(frequency: i32) -> Option<Self> {
        match frequency {
            LOW_2_4GHZ..=HIGH_2_4GHZ => Some(Self::Band2_4GHz),
            LOW_3_65GHZ..=HIGH_3_65GHZ => Some(Self::Band3_65GHz),
            LOW_4_9GHZ..=HIGH_4_9GHZ => Some(Self::Band4_9GHz),
            LOW_5GHZ..=HIGH_5GHZ => Some(Self::Band5GHz),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// Band label for a frequency, empty when the band is unknown.
pub fn band_from_frequency(frequency: i32) -> &'static str {
    WifiBand::from_frequency(frequency).map_or("", WifiBand::label)
}

/// 802.11-2012 channel number. Zero outside the 2.4 and 5 GHz ranges.
pub fn channel_from_frequency(frequency: i32) -> i32 {
    // channel 14 is the Japanese one
    if frequency == HIGH_2_4GHZ {
        return 14;
    }
    if frequency < HIGH_2_4GHZ {
        return frequency.saturating_sub(LOW_2_4GHZ) / 5 + 1;
    }
    if frequency > LOW_5GHZ && frequency < HIGH_5GHZ {
        return frequency / 5 - 1000;
    }
    0
}

/// Buckets an RSSI into `levels` signal levels, from 0 to `levels - 1`.
pub fn signal_level(rssi: i32, levels: i32) -> i32 {
    if rssi <= MIN_RSSI {
        0
    } else if rssi >= MAX_RSSI {
        levels - 1
    } else {
        (rssi - MIN_RSSI) * (levels - 1) / (MAX_RSSI - MIN_RSSI)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter)]
pub enum WifiFailure {
    #[strum(serialize = "error_permission")]
    PermissionDenied,
    #[strum(serialize = "error_wifi_manager")]
    ManagerUnavailable,
    #[strum(serialize = "error_wifi_disabled")]
    Disabled,
}

impl WifiFailure {
    pub fn code(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiOutcome {
    /// Keyed by lowercase BSSID. A BSSID seen twice keeps its last result.
    AccessPoints(BTreeMap<String, AccessPointRecord>),
    Failed(WifiFailure),
}

impl WifiOutcome {
    pub fn to_map(&self) -> Map<String, Value> {
        match self {
            WifiOutcome::AccessPoints(aps) => aps
                .iter()
                .map(|(bssid, ap)| (bssid.clone(), serde_json::to_value(ap).unwrap_or(Value::Null)))
                .collect(),
            WifiOutcome::Failed(failure) => {
                let mut map = Map::new();
                map.insert(ERROR_KEY.to_owned(), Value::from(failure.code()));
                map
            }
        }
    }
}

pub fn get_network_scan_results(source: Option<&dyn WifiScanSource>, capability: &DeviceCapability) -> WifiOutcome {
    if !capability.fine_location {
        debug!("ACCESS_FINE_LOCATION permission not granted");
        return WifiOutcome::Failed(WifiFailure::PermissionDenied);
    }
    let Some(source) = source else {
        debug!("cannot get WiFi manager");
        return WifiOutcome::Failed(WifiFailure::ManagerUnavailable);
    };
    if !source.is_wifi_enabled() {
        debug!("WiFi disabled");
        return WifiOutcome::Failed(WifiFailure::Disabled);
    }

    let with_width = capability.platform_version.has_channel_width();
    let aps: BTreeMap<_, _> = source
        .scan_results()
        .into_iter()
        .map(|result| {
            let record = access_point(result, with_width);
            (record.bssid.clone(), record)
        })
        .collect();
    debug!(count = aps.len(), "WiFi scan results");
    WifiOutcome::AccessPoints(aps)
}

fn access_point(result: WifiScanResult, with_width: bool) -> AccessPointRecord {
    AccessPointRecord {
        strength: signal_level(result.level, SIGNAL_LEVELS),
        bssid: result.bssid.to_string().to_lowercase(),
        channel: channel_from_frequency(result.frequency),
        band: band_from_frequency(result.frequency),
        channel_width: with_width.then_some(result.channel_width),
        ssid: result.ssid,
        capabilities: result.capabilities,
        frequency: result.frequency,
        timestamp: result.timestamp,
    }
}

fn default_true() -> bool {
    true
}

/// A recorded WiFi scan, replayed as a [`WifiScanSource`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiSession {
    #[serde(default)]
    pub capability: DeviceCapability,
    #[serde(default = "default_true")]
    pub wifi_manager: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub results: Vec<WifiScanResult>,
}

impl WifiSession {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session {}", path.display()))?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&data).context("Failed to parse session")
        } else {
            serde_json::from_str(&data).context("Failed to parse session")
        }
    }

    /// `None` when the recorded device had no WiFi service.
    pub fn source(&self) -> Option<&dyn WifiScanSource> {
        self.wifi_manager.then_some(self as &dyn WifiScanSource)
    }
}

impl WifiScanSource for WifiSession {
    fn is_wifi_enabled(&self) -> bool {
        self.enabled
    }

    fn scan_results(&self) -> Vec<WifiScanResult> {
        self.results.clone()
    }
}
