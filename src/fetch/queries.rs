//! SQL sent to the Xatu ClickHouse HTTP interface.
//!
//! Every query filters on `slot_start_date_time` so ClickHouse only scans the
//! day partition the slot lives in.

use chrono::NaiveDate;

use crate::cache::Slot;
use crate::chain::Network;

const FORMAT: &str = "FORMAT JSONEachRow";

fn slot_filter(network: Network, slot: Slot, date: NaiveDate) -> String {
    format!(
        "WHERE meta_network_name = '{network}' \
         AND slot_start_date_time >= toDate('{date}') \
         AND slot_start_date_time < toDate('{date}') + INTERVAL 1 DAY \
         AND slot = {slot}"
    )
}

/// One row per unique bid (block hash), earliest sighting across relays.
pub fn bids(network: Network, slot: Slot, date: NaiveDate) -> String {
    format!(
        "SELECT builder_pubkey, block_hash, min(timestamp_ms) AS timestamp_ms, value \
         FROM mev_relay_bid_trace {} \
         GROUP BY slot, builder_pubkey, block_hash, value \
         ORDER BY timestamp_ms ASC {FORMAT}",
        slot_filter(network, slot, date)
    )
}

pub fn relays(network: Network, slot: Slot, date: NaiveDate) -> String {
    format!(
        "SELECT DISTINCT relay_name FROM mev_relay_bid_trace {} \
         ORDER BY relay_name {FORMAT}",
        slot_filter(network, slot, date)
    )
}

/// Block hash delivered to the proposer, if any relay delivered one.
pub fn winning_block(network: Network, slot: Slot, date: NaiveDate) -> String {
    format!(
        "SELECT block_hash FROM mev_relay_proposer_payload_delivered {} \
         LIMIT 1 {FORMAT}",
        slot_filter(network, slot, date)
    )
}

/// Highest slot with bids on `today`.
pub fn latest_slot(network: Network, today: NaiveDate) -> String {
    format!(
        "SELECT max(slot) AS slot FROM mev_relay_bid_trace \
         WHERE meta_network_name = '{network}' \
         AND slot_start_date_time >= toDate('{today}') {FORMAT}"
    )
}
