//! Inbound and outbound message types, independent of the chat platform.

use crate::bot::keyboard::Keyboard;

/// A plain-text message from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    /// Chat to reply into (equals `user_id` in private chats).
    pub chat_id: i64,
    pub user_id: i64,
    pub username: String,
    pub text: String,
}

impl IncomingText {
    /// Whether the text is a bot command such as `/start`.
    pub fn is_command(&self) -> bool {
        self.text.starts_with('/')
    }

    /// Command name without the leading slash, `@botname` suffix and arguments.
    pub fn command(&self) -> Option<&str> {
        self.command_for(None)
    }

    /// Like [`command`](Self::command), but `None` when the command is
    /// addressed to a bot other than `bot_username`.
    pub fn command_for(&self, bot_username: Option<&str>) -> Option<&str> {
        let rest = self.text.strip_prefix('/')?;
        let word = rest.split_whitespace().next().unwrap_or("");
        match word.split_once('@') {
            Some((name, target)) => match bot_username {
                Some(me) if !target.eq_ignore_ascii_case(me) => None,
                _ => Some(name),
            },
            None => Some(word),
        }
    }
}

/// What the router wants sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> IncomingText {
        IncomingText {
            chat_id: 1,
            user_id: 1,
            username: "alice".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(msg("/start").command(), Some("start"));
        assert_eq!(msg("/start@relay_bot").command(), Some("start"));
        assert_eq!(msg("/start ref42").command(), Some("start"));
        assert_eq!(msg("/help").command(), Some("help"));
        assert_eq!(msg("hello /start").command(), None);
    }

    #[test]
    fn test_command_for_other_bot() {
        assert_eq!(msg("/start").command_for(Some("relay_bot")), Some("start"));
        assert_eq!(msg("/start@relay_bot").command_for(Some("relay_bot")), Some("start"));
        assert_eq!(msg("/start@Relay_Bot x").command_for(Some("relay_bot")), Some("start"));
        assert_eq!(msg("/start@otherbot").command_for(Some("relay_bot")), None);
    }

    #[test]
    fn test_is_command() {
        assert!(msg("/start").is_command());
        assert!(!msg("📊 Статистика").is_command());
    }
}
