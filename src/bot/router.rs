//! Message router - decides what to do with each incoming text.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::bot::history::{HistoryStore, format_turn};
use crate::bot::keyboard::{self, Keyboard};
use crate::bot::language::{Language, PreferenceRegistry};
use crate::bot::message::{IncomingText, Reply};
use crate::bot::prompt::build_prompt;
use crate::bot::telegram::Messenger;
use crate::groq::{Completer, CompletionError};

/// How many turns the admin history command shows.
pub const HISTORY_LIMIT: usize = 10;

pub const GREETING: &str = "Привіт! Обери мову для спілкування:";
pub const CHOOSE_LANGUAGE: &str = "Обери мову:";
pub const EMPTY_HISTORY: &str = "Історія порожня.";

/// Routes messages to language selection, admin commands or the model.
pub struct MessageRouter {
    admin_id: i64,
    preferences: PreferenceRegistry,
    history: Mutex<HistoryStore>,
    /// Serializes each user's chat turns so they land in arrival order.
    user_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
    bot_username: Option<String>,
    messenger: Arc<dyn Messenger>,
    completer: Arc<dyn Completer>,
}

impl MessageRouter {
    pub fn new(
        admin_id: i64,
        history: HistoryStore,
        messenger: Arc<dyn Messenger>,
        completer: Arc<dyn Completer>,
    ) -> Self {
        Self {
            admin_id,
            preferences: PreferenceRegistry::new(),
            history: Mutex::new(history),
            user_locks: Mutex::new(HashMap::new()),
            bot_username: None,
            messenger,
            completer,
        }
    }

    /// Only accept `/command@name` when `name` is this bot.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_id
    }

    pub fn preferences(&self) -> &PreferenceRegistry {
        &self.preferences
    }

    pub fn history(&self) -> &Mutex<HistoryStore> {
        &self.history
    }

    /// Handle one message and send the reply, if any.
    pub async fn handle(&self, msg: &IncomingText) {
        info!(
            "📨 {} ({}): \"{}\"",
            msg.username,
            msg.user_id,
            msg.text.chars().take(50).collect::<String>()
        );

        let Some(reply) = self.respond(msg).await else {
            return;
        };

        if let Err(e) = self.messenger.send_text(msg.chat_id, &reply.text, reply.keyboard).await {
            warn!("Reply to {} not delivered: {}", msg.user_id, e);
        }
    }

    /// Work out the reply for `msg`, applying any state changes on the way.
    ///
    /// Checks run in a fixed order: commands, language labels, the
    /// change-language label, admin commands, then the model.
    pub async fn respond(&self, msg: &IncomingText) -> Option<Reply> {
        if msg.is_command() {
            return self.respond_to_command(msg).await;
        }

        if let Some(language) = Language::from_label(&msg.text) {
            self.preferences.set(msg.user_id, language).await;
            info!("🌐 {} switched to {}", msg.user_id, language.code());
            return Some(Reply::text(language.confirmation()));
        }

        if msg.text == keyboard::CHANGE_LANGUAGE {
            return Some(Reply::with_keyboard(CHOOSE_LANGUAGE, Keyboard::Languages));
        }

        let is_admin = self.is_admin(msg.user_id);
        if is_admin {
            match msg.text.as_str() {
                keyboard::STATISTICS => {
                    let users = self.preferences.len().await;
                    return Some(Reply::text(format!("👥 Користувачів: {users}")));
                }
                keyboard::HISTORY => return Some(self.history_reply(msg.user_id).await),
                _ => {}
            }
        }

        let answer = self.chat(msg).await;
        Some(Reply {
            text: answer,
            keyboard: is_admin.then_some(Keyboard::Admin),
        })
    }

    async fn respond_to_command(&self, msg: &IncomingText) -> Option<Reply> {
        match msg.command_for(self.bot_username.as_deref()) {
            Some("start") => {
                self.preferences.set(msg.user_id, Language::Ukrainian).await;
                Some(Reply::with_keyboard(GREETING, Keyboard::Languages))
            }
            _ => None,
        }
    }

    async fn history_reply(&self, user_id: i64) -> Reply {
        let history = self.history.lock().await;
        let turns = history.recent(&user_id.to_string(), HISTORY_LIMIT);
        if turns.is_empty() {
            Reply::text(EMPTY_HISTORY)
        } else {
            Reply::text(turns.join("\n\n"))
        }
    }

    async fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.user_locks.lock().await.entry(user_id).or_default().clone()
    }

    /// Ask the model, record the turn, return the answer text.
    async fn chat(&self, msg: &IncomingText) -> String {
        let lock = self.user_lock(msg.user_id).await;
        let _turn = lock.lock().await;

        let language = self.preferences.get(msg.user_id).await;
        let prompt = build_prompt(&msg.text, language.code());

        let answer = match self.completer.complete(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Completion failed for {}: {}", msg.user_id, e);
                failure_text(&e)
            }
        };

        let turn = format_turn(&msg.text, &answer);
        let mut history = self.history.lock().await;
        if let Err(e) = history.append(&msg.user_id.to_string(), turn) {
            error!("Failed to save history: {}", e);
        }

        answer
    }
}

/// User-facing text for a failed completion.
pub fn failure_text(err: &CompletionError) -> String {
    match err {
        CompletionError::Timeout => "❌ Помилка: сервіс не відповів вчасно.".to_string(),
        other => format!("❌ Помилка: {other}"),
    }
}
