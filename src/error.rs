use thiserror::Error;

/// Failure reported by the Scan Source for a multi-RAT scan request.
///
/// None of these reach the caller; they push the orchestrator onto the
/// registered-cell snapshot instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("network scan is not supported by this scan source")]
    Unsupported,
    #[error("network scan request rejected: {0}")]
    Rejected(String),
    #[error("network scan failed with platform error {0}")]
    Platform(i32),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scan periodicity must be greater than {min}s, got {value}s")]
    Periodicity { value: u64, min: u64 },
    #[error("maximum search time must be greater than {min}s, got {value}s")]
    MaxSearchTime { value: u64, min: u64 },
    #[error("incremental result periodicity must be at least 1s")]
    IncrementalPeriodicity,
}
