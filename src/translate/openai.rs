//! OpenAI chat-completions translation adapter.
//!
//! The user supplies their own API key (held in the credential vault); a
//! missing key, a non-success status, or a malformed body all degrade to
//! "no translation available".

use serde_json::json;

use crate::http::UREQ_AGENT;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug, Default)]
pub struct OpenAiOptions {
    pub api_key: String,
    pub model: String,
}

impl OpenAiOptions {
    fn model(&self) -> &str {
        if self.model.is_empty() {
            DEFAULT_MODEL
        } else {
            &self.model
        }
    }
}

/// Translate `text` into `target_iso1`, or `None` when unavailable.
pub fn translate_to_target(
    text: &str,
    source_iso1: Option<&str>,
    target_iso1: &str,
    opts: &OpenAiOptions,
) -> Option<String> {
    if opts.api_key.is_empty() || text.is_empty() || target_iso1.is_empty() {
        return None;
    }

    let payload = json!({
        "model": opts.model(),
        "messages": [
            {
                "role": "system",
                "content": format!(
                    "You are a precise translator. Output only the translation into the language with ISO 639-1 code \"{}\". No commentary.",
                    target_iso1
                ),
            },
            {
                "role": "user",
                "content": format!(
                    "Source language: {}\nTarget language: {}\nText: {}",
                    source_iso1.unwrap_or("unknown"),
                    target_iso1,
                    text
                ),
            }
        ],
        "temperature": 0.2,
    });

    let resp = match UREQ_AGENT
        .post(CHAT_COMPLETIONS_URL)
        .header("Authorization", &format!("Bearer {}", opts.api_key))
        .header("Content-Type", "application/json")
        .send_json(payload)
    {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(error = %e, "openai translation request failed");
            return None;
        }
    };

    let body: serde_json::Value = match resp.into_body().read_json() {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "openai response body unreadable");
            return None;
        }
    };

    body.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|f| f.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_short_circuits() {
        let opts = OpenAiOptions::default();
        assert_eq!(translate_to_target("hola", Some("es"), "en", &opts), None);
    }

    #[test]
    fn default_model_applies_when_unset() {
        let opts = OpenAiOptions {
            api_key: "k".into(),
            model: String::new(),
        };
        assert_eq!(opts.model(), DEFAULT_MODEL);
    }
}
