//! LibreTranslate adapter. Endpoint and optional API key are user-supplied;
//! the public instance is the default.

use serde_json::json;

use crate::http::UREQ_AGENT;

pub const DEFAULT_ENDPOINT: &str = "https://libretranslate.com";

#[derive(Clone, Debug)]
pub struct LibreOptions {
    pub endpoint: String,
    pub api_key: String,
}

impl Default for LibreOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
        }
    }
}

impl LibreOptions {
    fn translate_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/translate", base)
    }
}

/// Translate `text` into `target_iso1`, or `None` when unavailable.
pub fn translate_to_target(
    text: &str,
    source_iso1: Option<&str>,
    target_iso1: &str,
    opts: &LibreOptions,
) -> Option<String> {
    if text.is_empty() || target_iso1.is_empty() {
        return None;
    }

    let mut payload = json!({
        "q": text,
        "source": source_iso1.unwrap_or("auto"),
        "target": target_iso1,
        "format": "text",
    });
    if !opts.api_key.is_empty() {
        payload["api_key"] = json!(opts.api_key);
    }

    let resp = match UREQ_AGENT
        .post(&opts.translate_url())
        .header("Content-Type", "application/json")
        .send_json(payload)
    {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(error = %e, "libretranslate request failed");
            return None;
        }
    };

    let body: serde_json::Value = match resp.into_body().read_json() {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "libretranslate response body unreadable");
            return None;
        }
    };

    body.get("translatedText")
        .and_then(|t| t.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
