//! Message tokenizer: split chat text into literal-text and emote spans.
//!
//! Two modes. When the protocol supplies byte-range emote metadata (the
//! `emotes` tag) the ranges drive the split; otherwise each whitespace-
//! delimited chunk is tested against the merged emote catalog. Both modes
//! also compute a normalized plain-text value with emote codes removed, used
//! for language detection and as the translation payload.

use super::catalog::{emote_from_cdn, Emote, EmoteCatalog};

/// A contiguous span of a message: literal text or an emote reference.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Text { value: String },
    Emote { value: String, emote: Emote },
}

impl Token {
    /// The covered source text. Concatenating values in order reproduces the
    /// original message.
    pub fn value(&self) -> &str {
        match self {
            Token::Text { value } => value,
            Token::Emote { value, .. } => value,
        }
    }

    pub fn is_emote(&self) -> bool {
        matches!(self, Token::Emote { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenizedMessage {
    pub tokens: Vec<Token>,
    /// Text-token concatenation with whitespace runs collapsed and trimmed.
    pub text_value: String,
}

/// One protocol-supplied emote range. Offsets are inclusive UTF-16 code
/// units, as sent on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmoteRange {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

/// Parse the `emotes` tag value: `id:start-end,start-end/id:start-end`.
///
/// Malformed groups and ranges are skipped, never fatal.
pub fn parse_emote_ranges(tag: &str) -> Vec<EmoteRange> {
    let mut ranges = Vec::new();
    for group in tag.split('/') {
        let Some((id, spans)) = group.split_once(':') else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        for span in spans.split(',') {
            let Some((start, end)) = span.split_once('-') else {
                continue;
            };
            let (Ok(start), Ok(end)) = (start.parse::<usize>(), end.parse::<usize>()) else {
                continue;
            };
            if end < start {
                continue;
            }
            ranges.push(EmoteRange {
                id: id.to_string(),
                start,
                end,
            });
        }
    }
    ranges
}

/// Range-mode tokenization driven by protocol metadata.
///
/// Ranges are sorted ascending, clamped to the message bounds, and applied
/// left to right; overlapping ranges after the sort are dropped. Emote
/// metadata is resolved by covered-substring code lookup, then id lookup,
/// then synthesized from the default CDN template.
pub fn tokenize_with_ranges(
    message: &str,
    ranges: &[EmoteRange],
    catalog: &EmoteCatalog,
) -> TokenizedMessage {
    if message.is_empty() {
        return TokenizedMessage::default();
    }
    let units: Vec<u16> = message.encode_utf16().collect();
    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| r.start);

    let mut tokens = Vec::new();
    let mut cursor = 0usize;
    for range in &sorted {
        let start = range.start.min(units.len());
        let end = range.end.saturating_add(1).min(units.len());
        if start >= end || start < cursor {
            continue;
        }
        if start > cursor {
            tokens.push(Token::Text {
                value: String::from_utf16_lossy(&units[cursor..start]),
            });
        }
        let code = String::from_utf16_lossy(&units[start..end]);
        let emote = catalog
            .get(&code)
            .cloned()
            .or_else(|| catalog.find_by_id(&range.id).cloned())
            .unwrap_or_else(|| emote_from_cdn(&range.id, &code));
        tokens.push(Token::Emote { value: code, emote });
        cursor = end;
    }
    if cursor < units.len() {
        tokens.push(Token::Text {
            value: String::from_utf16_lossy(&units[cursor..]),
        });
    }

    let text_value = normalized_text(&tokens);
    TokenizedMessage { tokens, text_value }
}

/// Catalog-mode tokenization: exact code match per whitespace-delimited
/// chunk; runs of non-matching chunks coalesce into one text token with
/// whitespace preserved verbatim.
pub fn tokenize_with_catalog(message: &str, catalog: &EmoteCatalog) -> TokenizedMessage {
    if message.is_empty() {
        return TokenizedMessage::default();
    }
    let mut tokens = Vec::new();
    let mut buffer = String::new();

    for chunk in split_preserving_whitespace(message) {
        match catalog.get(chunk) {
            Some(emote) if !chunk.chars().next().unwrap_or(' ').is_whitespace() => {
                if !buffer.is_empty() {
                    tokens.push(Token::Text {
                        value: std::mem::take(&mut buffer),
                    });
                }
                tokens.push(Token::Emote {
                    value: chunk.to_string(),
                    emote: emote.clone(),
                });
            }
            _ => buffer.push_str(chunk),
        }
    }
    if !buffer.is_empty() {
        tokens.push(Token::Text { value: buffer });
    }

    let text_value = normalized_text(&tokens);
    TokenizedMessage { tokens, text_value }
}

/// Alternating runs of whitespace and non-whitespace, in order.
fn split_preserving_whitespace(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut run_start = 0;
    let mut run_is_ws = None;
    for (i, c) in s.char_indices() {
        let is_ws = c.is_whitespace();
        match run_is_ws {
            Some(prev) if prev == is_ws => {}
            Some(_) => {
                parts.push(&s[run_start..i]);
                run_start = i;
                run_is_ws = Some(is_ws);
            }
            None => run_is_ws = Some(is_ws),
        }
    }
    if run_start < s.len() {
        parts.push(&s[run_start..]);
    }
    parts
}

fn normalized_text(tokens: &[Token]) -> String {
    let joined: String = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Text { value } => Some(value.as_str()),
            Token::Emote { .. } => None,
        })
        .collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
