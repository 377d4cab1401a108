//! Supported reply languages and the per-user preference registry.

use std::collections::HashMap;

use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    Ukrainian,
    Russian,
    English,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Ukrainian, Language::Russian, Language::English];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ukrainian => "uk",
            Language::Russian => "ru",
            Language::English => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Keyboard button text that selects this language.
    pub fn label(self) -> &'static str {
        match self {
            Language::Ukrainian => "🇺🇦 Українська",
            Language::Russian => "🇷🇺 Русский",
            Language::English => "🇬🇧 English",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.label() == text)
    }

    /// Confirmation sent after switching, written in the new language.
    pub fn confirmation(self) -> &'static str {
        match self {
            Language::Ukrainian => "✅ Мову змінено на українську.",
            Language::Russian => "✅ Язык переключен на русский.",
            Language::English => "✅ Language changed to English.",
        }
    }
}

/// In-memory map of user ID to selected language. Lost on restart.
#[derive(Default)]
pub struct PreferenceRegistry {
    languages: RwLock<HashMap<i64, Language>>,
}

impl PreferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored preference, or the default when the user never chose one.
    pub async fn get(&self, user_id: i64) -> Language {
        self.languages
            .read()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set(&self, user_id: i64, language: Language) {
        self.languages.write().await.insert(user_id, language);
    }

    /// Number of users with a recorded preference.
    pub async fn len(&self) -> usize {
        self.languages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
