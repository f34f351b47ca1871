// src/fetcher.rs
use crate::config::{Config, CHAIN, HTTP_TIMEOUT};
use crate::error::FetchError;
use crate::models::TokenRecord;
use crate::parser::{self, TokenListResponse};
use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, warn};

/// Anything that can hand the monitor the newest token, once per tick
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self) -> Option<TokenRecord>;
}

/// HTTP client for the token-query endpoint
pub struct TokenFetcher {
    client: Client,
    url: String,
    tz: FixedOffset,
}

impl TokenFetcher {
    pub fn new(url: impl Into<String>, tz: FixedOffset) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            tz,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FetchError> {
        Self::new(cfg.token_api_url.clone(), cfg.timezone)
    }

    async fn fetch_latest(&self) -> Result<Option<TokenRecord>, FetchError> {
        let params = query_params();
        debug!("📡 GET {} {:?}", self.url, params);

        let resp = self.client.get(&self.url).query(&params).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        let text = resp.text().await?;
        let body: TokenListResponse = serde_json::from_str(&text)?;
        Ok(parser::decode_latest(body, &self.tz))
    }
}

#[async_trait]
impl TokenSource for TokenFetcher {
    async fn fetch(&self) -> Option<TokenRecord> {
        match self.fetch_latest().await {
            Ok(token) => token,
            Err(FetchError::Status(status)) => {
                warn!("API responded with status {}", status);
                None
            }
            Err(FetchError::Network(e)) => {
                error!("Network error: {}", e);
                None
            }
            Err(e) => {
                error!("Unexpected error: {}", e);
                None
            }
        }
    }
}

/// Fixed query: last minute of Solana listings, newest first,
/// bounded liquidity/market cap, floors on holders and volume, no honeypots
pub fn query_params() -> Vec<(&'static str, String)> {
    let filter = json!({
        "liquidity": [50000, 1000000],
        "mkt_cap": [200000, 1000000],
        "holders": [400, f64::MAX],
        "volume": [80000, f64::MAX],
    });

    vec![
        ("chain", CHAIN.to_string()),
        ("duration", "1m".to_string()),
        ("sort_field", "creation_timestamp".to_string()),
        ("sort_order", "desc".to_string()),
        ("filter", filter.to_string()),
        ("is_hide_honeypot", "true".to_string()),
    ]
}
