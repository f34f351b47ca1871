use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;
use eyre::{eyre, Result};
use std::{env, fmt, time::Duration};
use tracing::info;

/// Pause between two polling ticks
pub const CHECK_INTERVAL: Duration = Duration::from_secs(15);
/// Pause after a tick failed unexpectedly
pub const ERROR_BACKOFF: Duration = Duration::from_secs(30);
/// Timeout applied to every outbound HTTP request
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub const CHAIN: &str = "solana";
pub const REQUIRED_SUFFIX: &str = "pump";
pub const BANNED_SUFFIX: &str = "moon";

#[derive(Clone)]
pub struct Config {
    pub discord_bot_token: String,
    pub channel_id: u64,
    pub discord_api_url: String,
    pub token_api_url: String,
    pub holder_api_base_url: Option<String>,
    pub seen_addresses_path: String,
    pub subscribed_users_path: String,
    pub timezone: FixedOffset,
    pub port: u16,
}

// keeps the bot token out of the logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_bot_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("discord_api_url", &self.discord_api_url)
            .field("token_api_url", &self.token_api_url)
            .field("holder_api_base_url", &self.holder_api_base_url)
            .field("seen_addresses_path", &self.seen_addresses_path)
            .field("subscribed_users_path", &self.subscribed_users_path)
            .field("timezone", &self.timezone)
            .field("port", &self.port)
            .finish()
    }
}

pub fn load() -> Result<Config> {
    dotenv().ok();

    let discord_bot_token = env::var("DISCORD_BOT_TOKEN").unwrap_or_default();

    let channel_id = env::var("CHANNEL_ID")
        .unwrap_or_else(|_| "0".to_string())
        .parse()
        .unwrap_or(0);

    let discord_api_url = env::var("DISCORD_API_URL")
        .unwrap_or_else(|_| "https://discord.com/api/v10".to_string())
        .trim_end_matches('/')
        .to_string();

    let token_api_url = env::var("TOKEN_API_URL")
        .map_err(|_| eyre!("TOKEN_API_URL must be set to the token-query endpoint"))?;

    // holder helper stays disabled without a base URL
    let holder_api_base_url = env::var("HOLDER_API_BASE_URL")
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty());

    let seen_addresses_path =
        env::var("SEEN_ADDRESSES_PATH").unwrap_or_else(|_| "seen_addresses.json".to_string());
    let subscribed_users_path =
        env::var("SUBSCRIBED_USERS_PATH").unwrap_or_else(|_| "subscribed_users.json".to_string());

    // Africa/Casablanca keeps UTC+01:00 outside Ramadan
    let offset_minutes: i32 = env::var("ALERT_UTC_OFFSET_MINUTES")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);
    let timezone = timezone_from_minutes(offset_minutes);

    let port = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let cfg = Config {
        discord_bot_token,
        channel_id,
        discord_api_url,
        token_api_url,
        holder_api_base_url,
        seen_addresses_path,
        subscribed_users_path,
        timezone,
        port,
    };

    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}

/// Offsets outside +/-24h fall back to UTC+01:00
pub fn timezone_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60))
        .or_else(|| FixedOffset::east_opt(3600))
        .unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_minutes_become_fixed_zone() {
        assert_eq!(timezone_from_minutes(60).local_minus_utc(), 3600);
        assert_eq!(timezone_from_minutes(-300).local_minus_utc(), -18_000);
    }

    #[test]
    fn out_of_range_offset_uses_default() {
        assert_eq!(timezone_from_minutes(100_000).local_minus_utc(), 3600);
    }

    #[test]
    fn debug_output_redacts_token() {
        let cfg = Config {
            discord_bot_token: "super-secret".into(),
            channel_id: 42,
            discord_api_url: "https://discord.com/api/v10".into(),
            token_api_url: "http://localhost/tokens".into(),
            holder_api_base_url: None,
            seen_addresses_path: "seen.json".into(),
            subscribed_users_path: "users.json".into(),
            timezone: timezone_from_minutes(60),
            port: 8080,
        };
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
