use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Platform rejects scan requests with a periodicity at or below this.
pub const MIN_PERIODICITY_SECS: u64 = 5;
/// Platform rejects scan requests with a maximum search time at or below this.
pub const MIN_MAX_SEARCH_SECS: u64 = 60;

const CONFIG_ENV: &str = "CELLSCAN_CONFIG";
const DEFAULT_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
}

/// Tuning for the active multi-RAT scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub periodicity_secs: u64,
    pub max_search_secs: u64,
    // not used for one-shot scans but still sent to the platform
    pub incremental_periodicity_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            periodicity_secs: 6,
            max_search_secs: 61,
            incremental_periodicity_secs: 3,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periodicity_secs <= MIN_PERIODICITY_SECS {
            return Err(ConfigError::Periodicity {
                value: self.periodicity_secs,
                min: MIN_PERIODICITY_SECS,
            });
        }
        if self.max_search_secs <= MIN_MAX_SEARCH_SECS {
            return Err(ConfigError::MaxSearchTime {
                value: self.max_search_secs,
                min: MIN_MAX_SEARCH_SECS,
            });
        }
        if self.incremental_periodicity_secs == 0 {
            return Err(ConfigError::IncrementalPeriodicity);
        }
        Ok(())
    }

    pub fn periodicity(&self) -> Duration {
        Duration::from_secs(self.periodicity_secs)
    }

    pub fn max_search_time(&self) -> Duration {
        Duration::from_secs(self.max_search_secs)
    }

    pub fn incremental_periodicity(&self) -> Duration {
        Duration::from_secs(self.incremental_periodicity_secs)
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).context("Failed to read config")?;
    parse(&data)
}

pub fn parse(data: &str) -> Result<Config> {
    let config: Config = toml::from_str(data).context("Failed to parse config")?;
    config.scan.validate().context("Invalid scan config")?;
    Ok(config)
}

/// Explicit path first, then `CELLSCAN_CONFIG`, then `config.toml` when it
/// exists. Defaults otherwise.
pub fn resolve(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load(path);
    }
    if let Ok(path) = dotenvy::var(CONFIG_ENV) {
        return load(&PathBuf::from(path));
    }
    let path = Path::new(DEFAULT_PATH);
    if path.exists() {
        return load(path);
    }
    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_platform_validation() {
        assert_eq!(ScanConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse("[scan]\nmax_search_secs = 120\n").unwrap();
        assert_eq!(config.scan.max_search_secs, 120);
        assert_eq!(config.scan.periodicity_secs, 6);
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse("").unwrap();
        assert_eq!(config.scan, ScanConfig::default());
    }

    #[test]
    fn platform_minimums_are_exclusive() {
        let config = ScanConfig {
            periodicity_secs: 5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Periodicity { value: 5, min: 5 })
        );

        let config = ScanConfig {
            max_search_secs: 60,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MaxSearchTime { value: 60, min: 60 })
        );
    }

    #[test]
    fn invalid_file_is_rejected() {
        assert!(parse("[scan]\nperiodicity_secs = 1\n").is_err());
        assert!(parse("[scan]\nperiodicity_secs = \"six\"\n").is_err());
    }
}
