// src/parser.rs
use crate::models::TokenRecord;
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::error;

/// Envelope of the token-query response; `data` may be absent or null
#[derive(Debug, Deserialize)]
pub struct TokenListResponse {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

/// One element of `data`, exactly as the API sends it
#[derive(Debug, Deserialize)]
struct RawToken {
    address: String,
    symbol: String,
    creation_timestamp: f64, // epoch seconds
    market_info: MarketInfo,
    pair_summary_info: PairSummary,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketInfo {
    fdv: Decimal,
    price: Decimal,
    #[serde(deserialize_with = "whole_count")]
    holders: u64,
    volume: Decimal,
}

#[derive(Debug, Deserialize)]
struct PairSummary {
    liquidity: Decimal,
}

/// Counts sometimes arrive float-shaped (`450.0`); accept any whole, non-negative number
fn whole_count<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    let value = <Decimal as Deserialize>::deserialize(de)?;
    if !value.fract().is_zero() {
        return Err(serde::de::Error::custom(format!("holder count {} is not whole", value)));
    }
    value
        .to_u64()
        .ok_or_else(|| serde::de::Error::custom(format!("holder count {} out of range", value)))
}

/// Decode a single list element into a `TokenRecord`.
/// Missing or mistyped fields are logged and yield `None`.
pub fn decode_token(raw: Value, tz: &FixedOffset) -> Option<TokenRecord> {
    let token: RawToken = match serde_json::from_value(raw) {
        Ok(t) => t,
        Err(e) => {
            error!("Malformed token record: {}", e);
            return None;
        }
    };

    let created_at = match to_local(token.creation_timestamp, tz) {
        Some(ts) => ts,
        None => {
            error!(
                "Token {} has out-of-range creation_timestamp {}",
                token.address, token.creation_timestamp
            );
            return None;
        }
    };

    Some(TokenRecord {
        address: token.address,
        symbol: token.symbol,
        fdv: token.market_info.fdv,
        price: token.market_info.price,
        holders: token.market_info.holders,
        liquidity: token.pair_summary_info.liquidity,
        volume: token.market_info.volume,
        created_at,
        logo: token.logo,
    })
}

/// Head of the list only; later entries are ignored this tick
pub fn decode_latest(resp: TokenListResponse, tz: &FixedOffset) -> Option<TokenRecord> {
    let head = resp.data?.into_iter().next()?;
    decode_token(head, tz)
}

fn to_local(epoch_secs: f64, tz: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    if !epoch_secs.is_finite() {
        return None;
    }
    let secs = epoch_secs.floor();
    let nanos = ((epoch_secs - secs) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999)).map(|utc| utc.with_timezone(tz))
}
