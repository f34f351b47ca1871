//! Alert delivery to a Discord channel over the REST API.

use crate::config::{Config, HTTP_TIMEOUT};
use crate::error::NotifyError;
use crate::models::{format_count, format_usd, format_usd_plain, TokenRecord};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

pub const ALERT_TITLE: &str = "🚀 **MASTODON SCAN ALERT** 🚀";
pub const ALERT_DESCRIPTION: &str = "Potential runner detected!";
/// Discord's stock green
pub const ALERT_COLOR: u32 = 0x2e_cc_71;

/// Channel kinds that accept plain messages: guild text and announcement
const TEXT_CHANNEL_TYPES: [u8; 2] = [0, 5];

/// Delivers a token alert somewhere. `Ok` means the alert went out.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_alert(&self, token: &TokenRecord) -> Result<(), NotifyError>;
}

#[derive(Debug, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "type")]
    kind: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: &'static str,
    pub value: String,
    pub inline: bool,
}

/// Posts embeds to one fixed channel with a static bot token
pub struct DiscordNotifier {
    http_client: Client,
    api_url: String,
    bot_token: String,
    channel_id: u64,
    tz: FixedOffset,
}

impl DiscordNotifier {
    pub fn new(
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        channel_id: u64,
        tz: FixedOffset,
    ) -> Result<Self, NotifyError> {
        let http_client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            api_url: api_url.into(),
            bot_token: bot_token.into(),
            channel_id,
            tz,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, NotifyError> {
        Self::new(
            cfg.discord_api_url.clone(),
            cfg.discord_bot_token.clone(),
            cfg.channel_id,
            cfg.timezone,
        )
    }

    /// Validate the credential and return the bot identity.
    pub async fn connect(&self) -> Result<BotUser, NotifyError> {
        let resp = self
            .http_client
            .get(format!("{}/users/@me", self.api_url))
            .header(header::AUTHORIZATION, self.auth())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(NotifyError::Status(resp.status()));
        }

        let user: BotUser = resp.json().await?;
        info!("Logged in as {} ({})", user.username, user.id);
        Ok(user)
    }

    async fn ensure_text_channel(&self) -> Result<(), NotifyError> {
        let resp = self
            .http_client
            .get(format!("{}/channels/{}", self.api_url, self.channel_id))
            .header(header::AUTHORIZATION, self.auth())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(NotifyError::Status(resp.status()));
        }

        let channel: Channel = resp.json().await?;
        if TEXT_CHANNEL_TYPES.contains(&channel.kind) {
            Ok(())
        } else {
            Err(NotifyError::NotTextChannel(self.channel_id))
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.bot_token)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_alert(&self, token: &TokenRecord) -> Result<(), NotifyError> {
        self.ensure_text_channel().await?;

        let now = Utc::now().with_timezone(&self.tz);
        let payload = json!({ "embeds": [build_embed(token, now)] });

        let resp = self
            .http_client
            .post(format!("{}/channels/{}/messages", self.api_url, self.channel_id))
            .header(header::AUTHORIZATION, self.auth())
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(NotifyError::Status(resp.status()));
        }
        Ok(())
    }
}

/// The eight labelled fields, in display order
pub fn alert_fields(token: &TokenRecord) -> Vec<EmbedField> {
    let field = |name, value, inline| EmbedField { name, value, inline };
    vec![
        field("✨ Symbol", token.symbol.clone(), true),
        field("🔗 Address", format!("`{}`", token.address), false),
        field("📊 Market Cap", format_usd(token.fdv, 2), true),
        field("💰 Price", format_usd_plain(token.price, 4), true),
        field("💸 24h Volume", format_usd(token.volume, 0), true),
        field("👥 Holders", format_count(token.holders), true),
        field("🏦 Liquidity", format_usd(token.liquidity, 0), true),
        field("⏰ Detected", token.detected_at(), true),
    ]
}

pub fn build_embed(token: &TokenRecord, now: DateTime<FixedOffset>) -> serde_json::Value {
    let mut embed = json!({
        "title": ALERT_TITLE,
        "description": ALERT_DESCRIPTION,
        "color": ALERT_COLOR,
        "timestamp": now.to_rfc3339(),
        "fields": alert_fields(token),
    });

    match token.logo_url() {
        Some(url) => embed["thumbnail"] = json!({ "url": url }),
        None => warn!(
            "Invalid or missing logo URL: {}",
            token.logo.as_deref().unwrap_or_default()
        ),
    }

    embed
}
