//! Bounded, insertion-ordered chat history with dedupe.

use std::collections::{HashSet, VecDeque};

use crate::emotes::Token;
use crate::irc::ChatMessage;

/// Messages kept per channel view; the oldest is evicted first.
pub const HISTORY_CAPACITY: usize = 300;

/// A chat message after tokenization, detection, and (eventually)
/// translation alignment.
#[derive(Clone, Debug)]
pub struct ProcessedMessage {
    pub message: ChatMessage,
    pub key: String,
    pub tokens: Vec<Token>,
    /// Tokens with the translation redistributed over the text spans;
    /// identical to `tokens` until a translation arrives.
    pub translation_tokens: Vec<Token>,
    /// Normalized plain text (emote codes stripped), the translation payload.
    pub plain_text: String,
    pub language: Option<String>,
    pub translation_text: Option<String>,
}

#[derive(Debug)]
pub struct ChatHistory {
    messages: VecDeque<ProcessedMessage>,
    seen: HashSet<String>,
    capacity: usize,
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            seen: HashSet::new(),
            capacity,
        }
    }

    /// Append a message, evicting the oldest at capacity.
    ///
    /// Returns `false` for duplicates (by key). The dedupe set outlives
    /// evicted messages on purpose: a re-delivered line must stay
    /// suppressed even after its original scrolled out of the buffer.
    pub fn push(&mut self, message: ProcessedMessage) -> bool {
        if !self.seen.insert(message.key.clone()) {
            return false;
        }
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Attach a late-arriving translation to a stored message.
    ///
    /// Returns `false` when the message has already been evicted.
    pub fn apply_translation(&mut self, key: &str, text: &str, tokens: Vec<Token>) -> bool {
        match self.messages.iter_mut().find(|m| m.key == key) {
            Some(entry) => {
                entry.translation_text = Some(text.to_string());
                entry.translation_tokens = tokens;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessedMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all messages and the dedupe set. Idempotent.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn processed(key: &str) -> ProcessedMessage {
        ProcessedMessage {
            message: ChatMessage {
                id: Some(key.to_string()),
                channel: "chan".into(),
                user: "u".into(),
                text: "text".into(),
                timestamp_ms: 0,
                tags: HashMap::new(),
            },
            key: key.to_string(),
            tokens: vec![Token::Text { value: "text".into() }],
            translation_tokens: vec![Token::Text { value: "text".into() }],
            plain_text: "text".into(),
            language: None,
            translation_text: None,
        }
    }

    #[test]
    fn capacity_evicts_oldest_preserving_order() {
        let mut h = ChatHistory::with_capacity(3);
        for i in 0..5 {
            assert!(h.push(processed(&format!("m{}", i))));
        }
        let keys: Vec<&str> = h.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn duplicates_are_rejected_even_after_eviction() {
        let mut h = ChatHistory::with_capacity(2);
        assert!(h.push(processed("a")));
        assert!(h.push(processed("b")));
        assert!(h.push(processed("c"))); // evicts "a"
        assert!(!h.push(processed("a")));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn translation_applies_to_stored_messages_only() {
        let mut h = ChatHistory::new();
        h.push(processed("a"));
        assert!(h.apply_translation("a", "hello", vec![Token::Text { value: "hello".into() }]));
        assert!(!h.apply_translation("ghost", "x", vec![]));
        let entry = h.iter().next().unwrap();
        assert_eq!(entry.translation_text.as_deref(), Some("hello"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut h = ChatHistory::new();
        h.push(processed("a"));
        h.clear();
        h.clear();
        assert!(h.is_empty());
        assert!(!h.contains("a"));
        assert!(h.push(processed("a")));
    }
}
