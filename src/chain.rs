//! Beacon chain slot timing.
//!
//! Converts between slot numbers and wall-clock time for the networks Xatu
//! records relay data for.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::cache::Slot;
use crate::error::AppError;

/// Length of one slot in milliseconds
pub const SLOT_DURATION_MS: i64 = 12_000;

/// A beacon chain network with a known genesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Network {
    #[default]
    Mainnet,
    Sepolia,
    Holesky,
    Hoodi,
}

impl Network {
    /// Name used in the `meta_network_name` column.
    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Sepolia => "sepolia",
            Network::Holesky => "holesky",
            Network::Hoodi => "hoodi",
        }
    }

    /// Beacon genesis time, Unix milliseconds
    pub fn genesis_ms(self) -> i64 {
        match self {
            Network::Mainnet => 1_606_824_023_000,
            Network::Sepolia => 1_655_733_600_000,
            Network::Holesky => 1_695_902_400_000,
            Network::Hoodi => 1_742_213_400_000,
        }
    }

    /// Unix millisecond timestamp at which `slot` starts.
    pub fn slot_start_ms(self, slot: Slot) -> i64 {
        let slot = i64::try_from(slot).unwrap_or(i64::MAX);
        self.genesis_ms().saturating_add(slot.saturating_mul(SLOT_DURATION_MS))
    }

    /// Seconds between the start of `slot` and `timestamp_ms`.
    ///
    /// Negative for bids received before the slot began.
    pub fn seconds_in_slot(self, slot: Slot, timestamp_ms: i64) -> f64 {
        (timestamp_ms - self.slot_start_ms(slot)) as f64 / 1000.0
    }

    /// UTC calendar day on which `slot` starts, used for partition filters.
    pub fn slot_date(self, slot: Slot) -> NaiveDate {
        DateTime::from_timestamp_millis(self.slot_start_ms(slot))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .date_naive()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "sepolia" => Ok(Network::Sepolia),
            "holesky" => Ok(Network::Holesky),
            "hoodi" => Ok(Network::Hoodi),
            other => Err(AppError::InvalidConfig(format!(
                "NETWORK '{}' is not one of mainnet, sepolia, holesky, hoodi",
                other
            ))),
        }
    }
}
