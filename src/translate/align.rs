//! Map a translated string back onto the original token boundaries.
//!
//! The translation comes back as one flat string, but the message renders as
//! interleaved text and emote tokens. The translated text is redistributed
//! across the original text tokens proportionally to their character
//! lengths; emote tokens keep their position and value. This is a rendering
//! heuristic, not a word alignment: token boundaries inside the translation
//! are approximate, particularly across languages with different token
//! density.

use crate::emotes::Token;

/// Redistribute `translation` over the text tokens of `tokens`.
///
/// The concatenation of the resulting text-token values equals `translation`
/// exactly; the last contributing text token absorbs the remainder so no
/// characters are lost to rounding. When no non-empty text token exists, the
/// whole translation becomes a single leading text token followed by the
/// original emote tokens.
pub fn merge_translation_tokens(tokens: &[Token], translation: &str) -> Vec<Token> {
    if translation.is_empty() {
        return tokens.to_vec();
    }

    let text_entries: Vec<(usize, usize)> = tokens
        .iter()
        .enumerate()
        .filter_map(|(idx, token)| match token {
            Token::Text { value } if !value.trim().is_empty() => {
                Some((idx, value.chars().count()))
            }
            _ => None,
        })
        .collect();

    if text_entries.is_empty() {
        let mut out = vec![Token::Text {
            value: translation.to_string(),
        }];
        out.extend(tokens.iter().filter(|t| t.is_emote()).cloned());
        return out;
    }

    let mut result = tokens.to_vec();
    let mut remaining_original: usize = text_entries.iter().map(|(_, len)| len).sum();
    let mut remaining: Vec<char> = translation.chars().collect();
    let last = text_entries.len() - 1;

    for (position, &(idx, original_len)) in text_entries.iter().enumerate() {
        let new_value = if position == last {
            remaining.drain(..).collect()
        } else if remaining_original == 0 || remaining.is_empty() {
            String::new()
        } else {
            let share =
                (original_len as f64 / remaining_original as f64) * remaining.len() as f64;
            let take = (share.round().max(0.0) as usize).min(remaining.len());
            remaining.drain(..take).collect()
        };
        if let Token::Text { value } = &mut result[idx] {
            *value = new_value;
        }
        remaining_original = remaining_original.saturating_sub(original_len);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotes::catalog::emote_from_cdn;
    use proptest::prelude::*;

    fn text(value: &str) -> Token {
        Token::Text {
            value: value.to_string(),
        }
    }

    fn emote(code: &str) -> Token {
        Token::Emote {
            value: code.to_string(),
            emote: emote_from_cdn("1", code),
        }
    }

    fn text_concat(tokens: &[Token]) -> String {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Text { value } => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_translation_returns_tokens_unchanged() {
        let tokens = vec![text("hola"), emote("Kappa")];
        assert_eq!(merge_translation_tokens(&tokens, ""), tokens);
    }

    #[test]
    fn single_text_token_takes_everything() {
        let tokens = vec![text("hola amigos")];
        let merged = merge_translation_tokens(&tokens, "hello friends");
        assert_eq!(merged, vec![text("hello friends")]);
    }

    #[test]
    fn emotes_keep_position_and_value() {
        let tokens = vec![text("hola "), emote("Kappa"), text(" amigos")];
        let merged = merge_translation_tokens(&tokens, "hello friends");
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1], tokens[1]);
        assert_eq!(text_concat(&merged), "hello friends");
    }

    #[test]
    fn emote_only_messages_get_a_leading_text_token() {
        let tokens = vec![emote("Kappa"), emote("catJAM")];
        let merged = merge_translation_tokens(&tokens, "nice emotes");
        assert_eq!(merged[0], text("nice emotes"));
        assert_eq!(&merged[1..], &tokens[..]);
    }

    #[test]
    fn whitespace_only_text_tokens_do_not_contribute() {
        let tokens = vec![text("  "), emote("Kappa")];
        let merged = merge_translation_tokens(&tokens, "hey");
        assert_eq!(merged[0], text("hey"));
        assert!(merged[1].is_emote());
    }

    #[test]
    fn last_token_absorbs_rounding_remainder() {
        let tokens = vec![text("ab "), emote("K"), text(" cdefghij")];
        let merged = merge_translation_tokens(&tokens, "xyz");
        assert_eq!(text_concat(&merged), "xyz");
    }

    #[test]
    fn multibyte_translation_splits_on_char_boundaries() {
        let tokens = vec![text("hello "), emote("K"), text(" world")];
        let merged = merge_translation_tokens(&tokens, "こんにちは世界のみんな");
        assert_eq!(text_concat(&merged), "こんにちは世界のみんな");
    }

    proptest! {
        #[test]
        fn prop_text_concat_equals_translation(
            translation in "\\PC{1,80}",
            lens in proptest::collection::vec(0usize..12, 1..6),
        ) {
            let mut tokens = Vec::new();
            for (i, len) in lens.iter().enumerate() {
                tokens.push(text(&"a".repeat(*len)));
                if i % 2 == 0 {
                    tokens.push(emote("Kappa"));
                }
            }
            let merged = merge_translation_tokens(&tokens, &translation);
            prop_assert_eq!(text_concat(&merged), translation);
        }

        #[test]
        fn prop_emote_tokens_are_untouched(
            translation in "\\PC{1,40}",
        ) {
            let tokens = vec![text("uno"), emote("A"), text("dos tres"), emote("B")];
            let merged = merge_translation_tokens(&tokens, &translation);
            let before: Vec<&Token> = tokens.iter().filter(|t| t.is_emote()).collect();
            let after: Vec<&Token> = merged.iter().filter(|t| t.is_emote()).collect();
            prop_assert_eq!(before, after);
        }
    }
}
