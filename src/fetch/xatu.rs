//! Xatu ClickHouse fetcher
//!
//! Runs the slot queries over ClickHouse's HTTP interface and assembles the
//! rows into a [`SlotBids`] payload.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::cache::Slot;
use crate::chain::Network;
use crate::config::Config;
use crate::error::{FetchError, Result as AppResult};
use crate::fetch::{queries, SlotFetcher};
use crate::labels::BuilderDirectory;
use crate::models::{Bid, SlotBids};

const WEI_PER_ETH: f64 = 1e18;

// == Xatu Fetcher ==
#[derive(Clone)]
pub struct XatuFetcher {
    client: Client,
    url: String,
    credentials: Option<(String, Option<String>)>,
    network: Network,
    builders: Arc<BuilderDirectory>,
}

impl fmt::Debug for XatuFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XatuFetcher")
            .field("url", &self.url)
            .field("network", &self.network)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl XatuFetcher {
    pub fn new(config: &Config, builders: Arc<BuilderDirectory>) -> AppResult<Self> {
        let network = config.network()?;
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(FetchError::from)?;
        let credentials = config
            .xatu_username
            .clone()
            .map(|user| (user, config.xatu_password.clone()));

        Ok(Self {
            client,
            url: config.xatu_url.clone(),
            credentials,
            network,
            builders,
        })
    }

    /// Runs `sql` and decodes each JSONEachRow line as `T`.
    async fn query<T: DeserializeOwned>(&self, sql: String) -> Result<Vec<T>, FetchError> {
        debug!(sql = %sql, "Querying Xatu");

        let mut request = self.client.post(&self.url).body(sql);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_rows(&body)
    }
}

#[async_trait]
impl SlotFetcher for XatuFetcher {
    async fn fetch_slot(&self, slot: Slot) -> Result<SlotBids, FetchError> {
        let date = self.network.slot_date(slot);
        let (bids, relays, winning) = tokio::try_join!(
            self.query::<BidRow>(queries::bids(self.network, slot, date)),
            self.query::<RelayRow>(queries::relays(self.network, slot, date)),
            self.query::<WinningRow>(queries::winning_block(self.network, slot, date)),
        )?;

        let relays = relays.into_iter().map(|row| row.relay_name).collect();
        let winning = winning.into_iter().next().map(|row| row.block_hash);
        Ok(assemble(self.network, slot, bids, relays, winning, &self.builders))
    }

    async fn latest_slot(&self) -> Result<Slot, FetchError> {
        let today = chrono::Utc::now().date_naive();
        let rows = self
            .query::<LatestRow>(queries::latest_slot(self.network, today))
            .await?;

        // max() over an empty partition yields 0
        rows.into_iter()
            .next()
            .map(|row| row.slot)
            .filter(|slot| *slot > 0)
            .ok_or_else(|| FetchError::Empty(format!("no bids recorded on {}", today)))
    }
}

// == Rows ==
#[derive(Debug, Deserialize)]
struct BidRow {
    builder_pubkey: String,
    block_hash: String,
    #[serde(deserialize_with = "number")]
    timestamp_ms: i64,
    /// Wei; UInt256 in ClickHouse so always quoted
    #[serde(deserialize_with = "number")]
    value: u128,
}

#[derive(Debug, Deserialize)]
struct RelayRow {
    relay_name: String,
}

#[derive(Debug, Deserialize)]
struct WinningRow {
    block_hash: String,
}

#[derive(Debug, Deserialize)]
struct LatestRow {
    #[serde(deserialize_with = "number")]
    slot: u64,
}

/// ClickHouse quotes 64-bit and wider integers in JSON output by default.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(serde_json::Number),
}

fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let text = match RawNumber::deserialize(deserializer)? {
        RawNumber::Text(text) => text,
        RawNumber::Number(number) => number.to_string(),
    };
    text.parse().map_err(serde::de::Error::custom)
}

fn parse_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, FetchError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| FetchError::Decode(e.to_string())))
        .collect()
}

/// Builds the slot payload, labelling and coloring each bid in arrival order.
fn assemble(
    network: Network,
    slot: Slot,
    rows: Vec<BidRow>,
    relays: Vec<String>,
    winning_block_hash: Option<String>,
    builders: &BuilderDirectory,
) -> SlotBids {
    let bids = rows
        .into_iter()
        .map(|row| Bid {
            timestamp_ms: row.timestamp_ms,
            seconds_in_slot: network.seconds_in_slot(slot, row.timestamp_ms),
            value_eth: row.value as f64 / WEI_PER_ETH,
            builder_label: builders.label(&row.builder_pubkey),
            color: builders.color(&row.builder_pubkey).to_string(),
            is_winner: winning_block_hash.as_deref() == Some(row.block_hash.as_str()),
            builder_pubkey: row.builder_pubkey,
            block_hash: row.block_hash,
        })
        .collect();

    SlotBids {
        slot,
        bids,
        relays,
        winning_block_hash,
    }
}
