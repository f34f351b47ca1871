// src/holders.rs
use crate::config::{CHAIN, HTTP_TIMEOUT};
use crate::error::HolderError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

pub const DEFAULT_HOLDER_COUNT: usize = 10;
/// Rendered when a wallet's winrate can't be fetched
pub const WINRATE_UNAVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
struct HolderListResponse {
    #[serde(default)]
    data: Option<HolderListData>,
}

#[derive(Debug, Deserialize)]
struct HolderListData {
    #[serde(default)]
    list: Vec<HolderEntry>,
}

#[derive(Debug, Deserialize)]
struct HolderEntry {
    wallet: String,
}

/// Top-holder and trailing-winrate lookups. Not wired into alerting.
pub struct HolderClient {
    client: Client,
    base_url: String,
}

impl HolderClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, HolderError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Up to `count` holder wallets, largest first. `None` on any failure.
    pub async fn top_holders(&self, token_address: &str, count: usize) -> Option<Vec<String>> {
        match self.fetch_holders(token_address, count).await {
            Ok(wallets) => Some(wallets),
            Err(e) => {
                error!("Error fetching holders for {}: {}", token_address, e);
                None
            }
        }
    }

    /// 30-day winrate as reported, `"N/A"` when absent. `None` on request failure.
    pub async fn winrate(&self, wallet_address: &str) -> Option<String> {
        match self.fetch_winrate(wallet_address).await {
            Ok(rate) => Some(rate),
            Err(e) => {
                error!("Error fetching winrate for {}: {}", wallet_address, e);
                None
            }
        }
    }

    /// `"<wallet> - <winrate>%"` per holder, fetched one wallet at a time
    pub async fn holders_with_winrates(&self, token_address: &str, count: usize) -> Option<Vec<String>> {
        let holders = self.top_holders(token_address, count).await?;
        if holders.is_empty() {
            return None;
        }

        let mut lines = Vec::with_capacity(holders.len());
        for wallet in holders {
            let rate = self
                .winrate(&wallet)
                .await
                .unwrap_or_else(|| WINRATE_UNAVAILABLE.to_string());
            lines.push(holder_line(&wallet, &rate));
        }
        Some(lines)
    }

    async fn fetch_holders(&self, token_address: &str, count: usize) -> Result<Vec<String>, HolderError> {
        let page_size = count.to_string();
        let resp = self
            .client
            .get(format!("{}/token/profiler/tokenHolderList", self.base_url))
            .query(&[
                ("token", token_address),
                ("chain", CHAIN),
                ("page_size", page_size.as_str()),
                ("sort_order", "desc"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HolderError::Status(resp.status()));
        }

        let body: HolderListResponse = resp.json().await?;
        Ok(wallets_from(body, count))
    }

    async fn fetch_winrate(&self, wallet_address: &str) -> Result<String, HolderError> {
        // the stats endpoint takes the wallet under the `token` key
        let resp = self
            .client
            .get(format!("{}/dashboard/token/trading/stats", self.base_url))
            .query(&[("token", wallet_address), ("chain", CHAIN)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HolderError::Status(resp.status()));
        }

        let body: Value = resp.json().await?;
        Ok(winrate_from(&body))
    }
}

fn wallets_from(body: HolderListResponse, count: usize) -> Vec<String> {
    body.data
        .map(|d| d.list.into_iter().take(count).map(|h| h.wallet).collect())
        .unwrap_or_default()
}

fn winrate_from(body: &Value) -> String {
    match body.get("data").and_then(|d| d.get("winrate_30d")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => WINRATE_UNAVAILABLE.to_string(),
    }
}

pub fn holder_line(wallet: &str, winrate: &str) -> String {
    format!("{} - {}%", wallet, winrate)
}
