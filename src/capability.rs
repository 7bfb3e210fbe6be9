//! What the calling device is able and allowed to do.
//!
//! Permission checks belong to the host; the results arrive here as plain
//! flags and are treated as preconditions.

use serde::Deserialize;

/// Platform API level of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct PlatformVersion(pub u32);

impl PlatformVersion {
    /// WiFi scan results carry a channel width from here on.
    pub const CHANNEL_WIDTH: PlatformVersion = PlatformVersion(23);
    /// BSIC and ARFCN/EARFCN/UARFCN are readable from here on.
    pub const EXTENDED_IDENTITY: PlatformVersion = PlatformVersion(24);
    /// String country/network codes and the multi-RAT network scan.
    pub const NETWORK_SCAN: PlatformVersion = PlatformVersion(28);

    pub fn has_channel_numbers(self) -> bool {
        self >= Self::EXTENDED_IDENTITY
    }

    pub fn has_string_codes(self) -> bool {
        self >= Self::NETWORK_SCAN
    }

    pub fn has_network_scan(self) -> bool {
        self >= Self::NETWORK_SCAN
    }

    pub fn has_channel_width(self) -> bool {
        self >= Self::CHANNEL_WIDTH
    }
}

impl Default for PlatformVersion {
    fn default() -> Self {
        Self::NETWORK_SCAN
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceCapability {
    pub platform_version: PlatformVersion,
    pub carrier_privileges: bool,
    pub modify_phone_state: bool,
    pub read_phone_state: bool,
    pub fine_location: bool,
}

impl DeviceCapability {
    /// An active scan needs both platform support and an elevated privilege.
    pub fn supports_multi_rat_scan(&self) -> bool {
        self.platform_version.has_network_scan()
            && (self.carrier_privileges || self.modify_phone_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_rat_scan_needs_privilege() {
        let mut cap = DeviceCapability {
            read_phone_state: true,
            ..Default::default()
        };
        assert!(!cap.supports_multi_rat_scan());

        cap.modify_phone_state = true;
        assert!(cap.supports_multi_rat_scan());

        cap.platform_version = PlatformVersion(27);
        assert!(!cap.supports_multi_rat_scan());
    }

    #[test]
    fn tiers() {
        assert!(!PlatformVersion(23).has_channel_numbers());
        assert!(PlatformVersion(24).has_channel_numbers());
        assert!(!PlatformVersion(27).has_string_codes());
        assert!(PlatformVersion(28).has_string_codes());
        assert!(PlatformVersion(23).has_channel_width());
    }

    #[test]
    fn session_keys_are_camel_case() {
        let cap: DeviceCapability = serde_json::from_str(
            r#"{"platformVersion": 29, "carrierPrivileges": true, "readPhoneState": true}"#,
        )
        .unwrap();
        assert_eq!(cap.platform_version, PlatformVersion(29));
        assert!(cap.read_phone_state);
        assert!(!cap.fine_location);
        assert!(cap.supports_multi_rat_scan());
    }
}
