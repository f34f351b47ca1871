//! Subscribe / unsubscribe handling over the subscriber set.
//!
//! Subscribers are recorded but alerts still go to the single configured
//! channel; nothing in the alert path reads this set.

use crate::error::CommandError;
use crate::store::PersistentSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

pub const SUBSCRIBED_REPLY: &str = "✅ You've been subscribed to PUMP alerts!";
pub const UNSUBSCRIBED_REPLY: &str = "❌ You've been unsubscribed from PUMP alerts.";

/// Prefix the chat commands are typed with
pub const COMMAND_PREFIX: char = '!';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Subscribe,
    Unsubscribe,
}

impl Command {
    /// `None` for anything we don't handle; callers drop those silently
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim();
        let name = name.strip_prefix(COMMAND_PREFIX).unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "subscribe" => Some(Command::Subscribe),
            "unsubscribe" => Some(Command::Unsubscribe),
            _ => None,
        }
    }
}

/// Owns the subscriber set on behalf of all command handlers
#[derive(Clone)]
pub struct CommandHandler {
    subscribers: Arc<Mutex<PersistentSet>>,
}

impl CommandHandler {
    pub fn new(subscribers: PersistentSet) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(subscribers)),
        }
    }

    /// Run a command for `user_id` and return the reply text
    pub async fn handle(&self, user_id: &str, cmd: Command) -> Result<&'static str, CommandError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(CommandError::MissingUser);
        }

        let mut subscribers = self.subscribers.lock().await;
        match cmd {
            Command::Subscribe => {
                subscribers.insert(user_id)?;
                info!("User {} subscribed ({} total)", user_id, subscribers.len());
                Ok(SUBSCRIBED_REPLY)
            }
            Command::Unsubscribe => {
                subscribers.remove(user_id)?;
                info!("User {} unsubscribed ({} total)", user_id, subscribers.len());
                Ok(UNSUBSCRIBED_REPLY)
            }
        }
    }

    /// Parse and run raw command text. Unknown commands give `None`;
    /// failures are logged and echoed back.
    pub async fn dispatch(&self, user_id: &str, input: &str) -> Option<String> {
        let cmd = Command::parse(input)?;
        match self.handle(user_id, cmd).await {
            Ok(reply) => Some(reply.to_string()),
            Err(e) => {
                error!("Command error: {}", e);
                Some(error_reply(&e))
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn is_subscribed(&self, user_id: &str) -> bool {
        self.subscribers.lock().await.contains(user_id)
    }

    pub async fn flush(&self) -> Result<(), CommandError> {
        self.subscribers.lock().await.flush()?;
        Ok(())
    }
}

pub fn error_reply(err: &CommandError) -> String {
    format!("⚠️ Error: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;
    use tempfile::tempdir;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("subscribe"), Some(Command::Subscribe));
        assert_eq!(Command::parse("!subscribe"), Some(Command::Subscribe));
        assert_eq!(Command::parse("  !UnSubscribe "), Some(Command::Unsubscribe));
        assert_eq!(Command::parse("!help"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn subscribe_and_unsubscribe_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribed_users.json");
        let handler = CommandHandler::new(PersistentSet::open(&path));

        assert_eq!(handler.handle("1001", Command::Subscribe).await.unwrap(), SUBSCRIBED_REPLY);
        assert!(handler.is_subscribed("1001").await);
        assert!(store::load(&path).contains("1001"));

        assert_eq!(
            handler.handle("1001", Command::Unsubscribe).await.unwrap(),
            UNSUBSCRIBED_REPLY
        );
        assert!(!handler.is_subscribed("1001").await);
        assert!(store::load(&path).is_empty());
    }

    #[tokio::test]
    async fn unsubscribing_unknown_user_still_acknowledges() {
        let dir = tempdir().unwrap();
        let handler = CommandHandler::new(PersistentSet::open(dir.path().join("u.json")));
        assert_eq!(handler.handle("77", Command::Unsubscribe).await.unwrap(), UNSUBSCRIBED_REPLY);
        assert_eq!(handler.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_command_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("u.json");
        let handler = CommandHandler::new(PersistentSet::open(&path));

        assert_eq!(handler.dispatch("1001", "!ping").await, None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn errors_are_echoed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("u.json");
        let handler = CommandHandler::new(PersistentSet::open(&path));

        let reply = handler.dispatch("1001", "!subscribe").await.unwrap();
        assert!(reply.starts_with("⚠️ Error: "));

        let reply = handler.dispatch("   ", "subscribe").await.unwrap();
        assert_eq!(reply, "⚠️ Error: missing user id");
    }
}
