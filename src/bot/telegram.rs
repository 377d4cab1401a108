//! Telegram client using teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, ReplyMarkup};
use tracing::{info, warn};

use crate::bot::keyboard::Keyboard;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Outbound side of the chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<(), String>;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// The bot's own `@username`, used to tell apart commands meant for it.
    pub async fn bot_username(&self) -> Result<String, String> {
        let me = self.bot.get_me().await.map_err(|e| format!("Failed to get bot info: {e}"))?;
        Ok(me.username().to_string())
    }

    /// Point Telegram at our webhook URL.
    pub async fn register_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), String> {
        let url = reqwest::Url::parse(url).map_err(|e| format!("Invalid webhook URL {url}: {e}"))?;
        info!("Registering webhook {}", url);

        let mut request = self.bot.set_webhook(url);
        if let Some(secret) = secret {
            request = request.secret_token(secret.to_string());
        }

        request.await.map_err(|e| {
            let msg = format!("Failed to set webhook: {e}");
            warn!("{}", msg);
            msg
        })?;

        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<(), String> {
        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        let last = chunks.len() - 1;

        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut request = self.bot.send_message(ChatId(chat_id), chunk);

            if i == last
                && let Some(kb) = keyboard
            {
                request = request.reply_markup(ReplyMarkup::Keyboard(render_keyboard(kb)));
            }

            request.await.map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                msg
            })?;
        }

        Ok(())
    }
}

fn render_keyboard(keyboard: Keyboard) -> KeyboardMarkup {
    let rows = keyboard
        .rows()
        .into_iter()
        .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>());

    let markup = KeyboardMarkup::new(rows).resize_keyboard();
    if keyboard.one_time() {
        markup.one_time_keyboard()
    } else {
        markup
    }
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Always returns at least one piece so an empty reply still produces a message.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_message() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
        assert_eq!(split_message("", 10), vec![""]);
    }

    #[test]
    fn test_split_on_char_boundaries() {
        let text = "й".repeat(25);
        let parts = split_message(&text, 10);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].chars().count(), 10);
        assert_eq!(parts[2].chars().count(), 5);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_split_exact_limit() {
        let text = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(split_message(&text, MAX_MESSAGE_CHARS).len(), 1);
    }

    #[test]
    fn test_render_language_keyboard() {
        let json = serde_json::to_value(render_keyboard(Keyboard::Languages)).unwrap();
        assert_eq!(json["keyboard"].as_array().unwrap().len(), 1);
        assert_eq!(json["keyboard"][0][1]["text"], "🇷🇺 Русский");
        assert_eq!(json["resize_keyboard"], true);
        assert_eq!(json["one_time_keyboard"], true);
    }

    #[test]
    fn test_render_admin_keyboard() {
        let json = serde_json::to_value(render_keyboard(Keyboard::Admin)).unwrap();
        assert_eq!(json["keyboard"].as_array().unwrap().len(), 2);
        assert_eq!(json["keyboard"][1][0]["text"], "🌐 Обрати мову");
        assert_eq!(json["resize_keyboard"], true);
        assert_ne!(json["one_time_keyboard"], true);
        assert_ne!(json["is_persistent"], true);
    }
}
