//! Turns raw user text into the prompt sent to the model.

use crate::bot::language::Language;

/// Prefix `text` with an instruction to answer in the language `code`.
///
/// English and unknown codes pass the text through unchanged.
pub fn build_prompt(text: &str, code: &str) -> String {
    match Language::from_code(code) {
        Some(Language::Ukrainian) => format!("Відповідай українською: {text}"),
        Some(Language::Russian) => format!("Отвечай по-русски: {text}"),
        Some(Language::English) | None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ukrainian_prefix() {
        assert_eq!(build_prompt("як справи?", "uk"), "Відповідай українською: як справи?");
    }

    #[test]
    fn test_russian_prefix() {
        assert_eq!(build_prompt("hello", "ru"), "Отвечай по-русски: hello");
    }

    #[test]
    fn test_english_passthrough() {
        assert_eq!(build_prompt("hello", "en"), "hello");
    }

    #[test]
    fn test_unknown_code_passthrough() {
        assert_eq!(build_prompt("hallo", "de"), "hallo");
        assert_eq!(build_prompt("", ""), "");
    }
}
