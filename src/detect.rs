//! Language detection and per-channel majority tracking.
//!
//! The rolling window is fed normalized plain text (emote codes stripped) so
//! a wall of `catJAM` never skews the majority; per-message detection sees
//! the raw message text.

use std::collections::VecDeque;

/// Ring-buffer capacity for the rolling language window.
pub const WINDOW_CAPACITY: usize = 60;
/// Entries shorter than this (trimmed) carry too little signal to classify.
pub const MIN_SAMPLE_CHARS: usize = 10;

/// Detect the ISO 639-1 code of a text, or `None` when unclassifiable.
pub fn detect_iso1(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let lang = whatlang::detect_lang(text)?;
    iso3_to_iso1(lang).map(|c| c.to_string())
}

/// Map a whatlang language to ISO 639-1 (best effort).
///
/// whatlang reports individual-language 639-3 codes that isolang cannot
/// always invert (cmn/arb/pes/nob), so those are matched by hand.
fn iso3_to_iso1(lang: whatlang::Lang) -> Option<&'static str> {
    use whatlang::Lang;
    match lang {
        Lang::Cmn => Some("zh"),
        Lang::Ara => Some("ar"),
        Lang::Pes => Some("fa"),
        Lang::Nob => Some("no"),
        other => isolang::Language::from_639_3(other.code()).and_then(|l| l.to_639_1()),
    }
}

/// Bounded window of recent message texts used to infer a channel's
/// dominant language.
#[derive(Debug)]
pub struct LanguageWindow {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for LanguageWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageWindow {
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a message text, evicting the oldest entry when full.
    pub fn push(&mut self, text: &str) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(text.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Plurality language over qualifying entries; first-seen wins ties,
    /// `None` when nothing qualifies.
    pub fn majority_language(&self) -> Option<String> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for entry in &self.entries {
            let trimmed = entry.trim();
            if trimmed.chars().count() < MIN_SAMPLE_CHARS {
                continue;
            }
            let Some(iso1) = detect_iso1(trimmed) else {
                continue;
            };
            match counts.iter_mut().find(|(code, _)| *code == iso1) {
                Some((_, n)) => *n += 1,
                None => counts.push((iso1, 1)),
            }
        }
        let mut best: Option<(String, usize)> = None;
        for (code, n) in counts {
            match &best {
                Some((_, best_n)) if n <= *best_n => {}
                _ => best = Some((code, n)),
            }
        }
        best.map(|(code, _)| code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPANISH: &str = "hola buenas tardes a todos, como estamos esta noche amigos";
    const ENGLISH: &str = "hello everyone, how are things going in the chat tonight";

    #[test]
    fn detects_common_languages() {
        assert_eq!(detect_iso1(SPANISH).as_deref(), Some("es"));
        assert_eq!(detect_iso1(ENGLISH).as_deref(), Some("en"));
    }

    #[test]
    fn empty_text_is_unclassified() {
        assert_eq!(detect_iso1(""), None);
        assert_eq!(detect_iso1("   "), None);
    }

    #[test]
    fn window_is_bounded() {
        let mut w = LanguageWindow::with_capacity(3);
        for i in 0..5 {
            w.push(&format!("message {}", i));
        }
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn short_entries_never_qualify() {
        let mut w = LanguageWindow::new();
        for _ in 0..40 {
            w.push("lol");
        }
        assert_eq!(w.majority_language(), None);
    }

    #[test]
    fn single_long_entry_decides() {
        let mut w = LanguageWindow::new();
        for _ in 0..40 {
            w.push("gg");
        }
        w.push(SPANISH);
        assert_eq!(w.majority_language().as_deref(), Some("es"));
    }

    #[test]
    fn plurality_wins() {
        let mut w = LanguageWindow::with_capacity(60);
        for _ in 0..30 {
            w.push(SPANISH);
        }
        for _ in 0..20 {
            w.push(ENGLISH);
        }
        assert_eq!(w.majority_language().as_deref(), Some("es"));
    }

    #[test]
    fn clear_resets_the_window() {
        let mut w = LanguageWindow::new();
        w.push(SPANISH);
        w.clear();
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.majority_language(), None);
    }
}
