//! Slot auction payload
//!
//! The value cached per slot: every unique bid seen by relays, the relays
//! themselves, and the block that was finally delivered.

use serde::{Deserialize, Serialize};

use crate::cache::Slot;

/// One builder bid, deduplicated by block hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Earliest time any relay saw this bid (Unix ms)
    pub timestamp_ms: i64,
    /// Offset from slot start in seconds
    pub seconds_in_slot: f64,
    /// Bid value in ETH
    pub value_eth: f64,
    pub builder_pubkey: String,
    /// Known builder name, or an abbreviated pubkey
    pub builder_label: String,
    pub block_hash: String,
    /// Display color assigned to the builder
    pub color: String,
    /// True for the bid whose block was delivered to the proposer
    pub is_winner: bool,
}

/// All auction data for a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotBids {
    pub slot: Slot,
    /// Bids ordered by arrival time
    pub bids: Vec<Bid>,
    /// Relay names that reported bids, sorted
    pub relays: Vec<String>,
    pub winning_block_hash: Option<String>,
}

impl SlotBids {
    /// The delivered bid, if any bid matched the winning block.
    pub fn winning_bid(&self) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.is_winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(block_hash: &str, is_winner: bool) -> Bid {
        Bid {
            timestamp_ms: 1_700_000_000_000,
            seconds_in_slot: 1.0,
            value_eth: 0.05,
            builder_pubkey: "0xabc".to_string(),
            builder_label: "titan".to_string(),
            block_hash: block_hash.to_string(),
            color: "#38bdf8".to_string(),
            is_winner,
        }
    }

    #[test]
    fn test_winning_bid() {
        let bids = SlotBids {
            slot: 1,
            bids: vec![bid("0x01", false), bid("0x02", true)],
            relays: vec![],
            winning_block_hash: Some("0x02".to_string()),
        };

        assert_eq!(bids.winning_bid().map(|b| b.block_hash.as_str()), Some("0x02"));
    }

    #[test]
    fn test_no_winner() {
        let bids = SlotBids {
            slot: 1,
            bids: vec![bid("0x01", false)],
            relays: vec!["flashbots".to_string()],
            winning_block_hash: None,
        };

        assert!(bids.winning_bid().is_none());
        let json = serde_json::to_value(&bids).unwrap();
        assert!(json["winning_block_hash"].is_null());
    }
}
