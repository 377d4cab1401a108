//! Reply keyboards and the fixed button labels the router matches on.

use crate::bot::language::Language;

pub const CHANGE_LANGUAGE: &str = "🌐 Обрати мову";
pub const STATISTICS: &str = "📊 Статистика";
pub const HISTORY: &str = "📁 Історія";

/// A reply keyboard attached to an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    /// One row with the three language buttons; hides after a tap.
    Languages,
    /// Admin menu; stays open.
    Admin,
}

impl Keyboard {
    /// Button labels, row by row.
    pub fn rows(self) -> Vec<Vec<&'static str>> {
        match self {
            Keyboard::Languages => vec![Language::ALL.iter().map(|l| l.label()).collect()],
            Keyboard::Admin => vec![vec![STATISTICS, HISTORY], vec![CHANGE_LANGUAGE]],
        }
    }

    pub fn one_time(self) -> bool {
        matches!(self, Keyboard::Languages)
    }
}
