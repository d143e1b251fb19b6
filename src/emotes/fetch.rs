//! Third-party emote provider fetchers (BTTV, 7TV).
//!
//! Every failure path degrades to an empty list; missing emote images fall
//! back to literal text rendering downstream, so a dead provider must never
//! take chat down with it.

use serde_json::Value;

use crate::http::UREQ_AGENT;

const BTTV_GLOBAL_URL: &str = "https://api.betterttv.net/3/cached/emotes/global";
const BTTV_USER_URL: &str = "https://api.betterttv.net/3/cached/users/twitch/";
const SEVENTV_GLOBAL_URL: &str = "https://7tv.io/v3/emote-sets/global";
const SEVENTV_USER_URL: &str = "https://7tv.io/v3/users/twitch/";

fn fetch_json(url: &str) -> Option<Value> {
    match UREQ_AGENT.get(url).header("Accept", "application/json").call() {
        Ok(resp) => resp.into_body().read_json::<Value>().ok(),
        Err(e) => {
            tracing::warn!(url, error = %e, "emote fetch failed");
            None
        }
    }
}

fn as_array(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(|v| v.as_array())
        .map(|a| a.to_vec())
        .unwrap_or_default()
}

/// BTTV global emote list (a bare JSON array).
pub fn fetch_bttv_global_emotes() -> Vec<Value> {
    match fetch_json(BTTV_GLOBAL_URL) {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    }
}

/// BTTV channel + shared emotes for a Twitch user id.
pub fn fetch_bttv_channel_emotes(twitch_id: &str) -> Vec<Value> {
    if twitch_id.is_empty() {
        return Vec::new();
    }
    let Some(data) = fetch_json(&format!("{}{}", BTTV_USER_URL, twitch_id)) else {
        return Vec::new();
    };
    let mut emotes = as_array(data.get("channelEmotes"));
    emotes.extend(as_array(data.get("sharedEmotes")));
    emotes
}

/// 7TV global emote set.
pub fn fetch_seventv_global_emotes() -> Vec<Value> {
    let Some(data) = fetch_json(SEVENTV_GLOBAL_URL) else {
        return Vec::new();
    };
    let direct = as_array(data.get("emotes"));
    if !direct.is_empty() {
        return direct;
    }
    as_array(data.get("emote_set").and_then(|s| s.get("emotes")))
}

/// 7TV channel emote set for a Twitch user id.
pub fn fetch_seventv_channel_emotes(twitch_id: &str) -> Vec<Value> {
    if twitch_id.is_empty() {
        return Vec::new();
    }
    let Some(data) = fetch_json(&format!("{}{}", SEVENTV_USER_URL, twitch_id)) else {
        return Vec::new();
    };
    let nested = as_array(data.get("emote_set").and_then(|s| s.get("emotes")));
    if !nested.is_empty() {
        return nested;
    }
    as_array(data.get("emotes"))
}
