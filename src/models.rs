// src/models.rs
use chrono::{DateTime, FixedOffset};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// A freshly listed token as reported by the token-query API.
///
/// Built once per tick and dropped after the filter pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenRecord {
    pub address: String,
    pub symbol: String,
    pub fdv: Decimal,
    pub price: Decimal,
    pub holders: u64,
    pub liquidity: Decimal,
    pub volume: Decimal,
    pub created_at: DateTime<FixedOffset>, // already in the alert timezone
    pub logo: Option<String>,
}

impl TokenRecord {
    /// Creation time as `HH:MM:SS` in the alert timezone
    pub fn detected_at(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }

    /// The logo, only when it is an absolute http(s) URL
    pub fn logo_url(&self) -> Option<&str> {
        self.logo
            .as_deref()
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
    }
}

/// `$1,234.57` style with `dp` decimals, rounded half-to-even
pub fn format_usd(value: Decimal, dp: u32) -> String {
    format!("${}", format_grouped(value, dp))
}

/// `$1234.5000` style: fixed decimals, no thousands separators
pub fn format_usd_plain(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven);
    format!("${:.*}", dp as usize, rounded)
}

/// Thousands-separated rendering with exactly `dp` decimals
pub fn format_grouped(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven);
    let plain = format!("{:.*}", dp as usize, rounded.abs());

    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn format_count(value: u64) -> String {
    group_digits(&value.to_string())
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(logo: Option<&str>) -> TokenRecord {
        let tz = FixedOffset::east_opt(3600).unwrap();
        TokenRecord {
            address: "abc123pump".into(),
            symbol: "ABC".into(),
            fdv: dec("250000"),
            price: dec("0.00025"),
            holders: 512,
            liquidity: dec("60000"),
            volume: dec("90000"),
            created_at: tz.timestamp_opt(1_700_000_000, 0).unwrap(),
            logo: logo.map(str::to_string),
        }
    }

    #[test]
    fn detected_at_uses_record_offset() {
        // 1_700_000_000 is 22:13:20 UTC
        assert_eq!(record(None).detected_at(), "23:13:20");
    }

    #[test]
    fn logo_requires_http_scheme() {
        assert_eq!(record(Some("https://cdn/x.png")).logo_url(), Some("https://cdn/x.png"));
        assert_eq!(record(Some("http://cdn/x.png")).logo_url(), Some("http://cdn/x.png"));
        assert_eq!(record(Some("ipfs://abc")).logo_url(), None);
        assert_eq!(record(Some("")).logo_url(), None);
        assert_eq!(record(None).logo_url(), None);
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(dec("1234567.891"), 2), "$1,234,567.89");
        assert_eq!(format_usd(dec("250000"), 2), "$250,000.00");
        assert_eq!(format_usd(dec("0.00025"), 4), "$0.0002");
        assert_eq!(format_usd(dec("0.00035"), 4), "$0.0004");
        assert_eq!(format_usd(dec("80000.5"), 0), "$80,000");
        assert_eq!(format_usd(dec("999.99"), 0), "$1,000");
        assert_eq!(format_usd(dec("12"), 0), "$12");
    }

    #[test]
    fn plain_usd_skips_grouping() {
        assert_eq!(format_usd_plain(dec("1234.5"), 4), "$1234.5000");
        assert_eq!(format_usd_plain(dec("0.00035"), 4), "$0.0004");
        assert_eq!(format_usd_plain(dec("0.00025"), 4), "$0.0002");
    }

    #[test]
    fn negative_values_keep_sign() {
        assert_eq!(format_grouped(dec("-1234.5"), 2), "-1,234.50");
    }

    #[test]
    fn counts_are_grouped() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
