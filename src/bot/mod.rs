//! Bot module - relays Telegram messages to the completion endpoint.

pub mod history;
pub mod keyboard;
pub mod language;
pub mod message;
pub mod prompt;
pub mod router;
pub mod telegram;


pub use history::{HistoryError, HistoryStore};
pub use keyboard::Keyboard;
pub use language::{Language, PreferenceRegistry};
pub use message::{IncomingText, Reply};
pub use router::MessageRouter;
pub use telegram::{Messenger, TelegramClient};
