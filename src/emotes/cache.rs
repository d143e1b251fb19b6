//! On-device emote cache with a TTL, one JSON file per provider scope.
//!
//! Writes are whole-file replacements so a torn cache entry can never mix
//! two generations; unreadable or expired entries are simply dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Cache entries older than this are refetched.
pub const EMOTE_TTL: chrono::Duration = chrono::Duration::days(7);

/// Provider scope for a cached emote list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheScope {
    TwitchGlobal,
    BttvGlobal,
    BttvChannel,
    SevenTvGlobal,
    SevenTvChannel,
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    generated_at: DateTime<Utc>,
    emotes: Vec<Value>,
}

fn cache_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join("stream-chat-translator")
        .join("emote_cache")
}

fn cache_path_in(dir: &Path, scope: CacheScope, channel_id: Option<&str>) -> Option<PathBuf> {
    let name = match (scope, channel_id) {
        (CacheScope::TwitchGlobal, _) => "twitch_global.json".to_string(),
        (CacheScope::BttvGlobal, _) => "bttv_global.json".to_string(),
        (CacheScope::SevenTvGlobal, _) => "7tv_global.json".to_string(),
        (CacheScope::BttvChannel, Some(id)) if !id.is_empty() => {
            format!("bttv_channel_{}.json", id)
        }
        (CacheScope::SevenTvChannel, Some(id)) if !id.is_empty() => {
            format!("7tv_channel_{}.json", id)
        }
        _ => return None,
    };
    Some(dir.join(name))
}

/// Read a cached emote list from `dir`, dropping it when stale or unreadable.
pub fn get_cached_emotes_in(
    dir: &Path,
    scope: CacheScope,
    channel_id: Option<&str>,
) -> Option<Vec<Value>> {
    let path = cache_path_in(dir, scope, channel_id)?;
    let data = std::fs::read_to_string(&path).ok()?;
    let entry: CacheEntry = match serde_json::from_str(&data) {
        Ok(e) => e,
        Err(_) => {
            let _ = std::fs::remove_file(&path);
            return None;
        }
    };
    if Utc::now() - entry.generated_at > EMOTE_TTL {
        let _ = std::fs::remove_file(&path);
        return None;
    }
    Some(entry.emotes)
}

/// Replace the cached emote list for a scope under `dir`.
pub fn set_cached_emotes_in(dir: &Path, scope: CacheScope, channel_id: Option<&str>, emotes: &[Value]) {
    let Some(path) = cache_path_in(dir, scope, channel_id) else {
        return;
    };
    let _ = std::fs::create_dir_all(dir);
    let entry = CacheEntry {
        generated_at: Utc::now(),
        emotes: emotes.to_vec(),
    };
    if let Ok(data) = serde_json::to_string(&entry) {
        let _ = std::fs::write(path, data);
    }
}

/// Read a cached emote list from the default cache directory.
pub fn get_cached_emotes(scope: CacheScope, channel_id: Option<&str>) -> Option<Vec<Value>> {
    get_cached_emotes_in(&cache_dir(), scope, channel_id)
}

/// Replace the cached emote list for a scope in the default cache directory.
pub fn set_cached_emotes(scope: CacheScope, channel_id: Option<&str>, emotes: &[Value]) {
    set_cached_emotes_in(&cache_dir(), scope, channel_id, emotes)
}

/// Whether a scope has no fresh cache entry.
pub fn needs_refresh(scope: CacheScope, channel_id: Option<&str>) -> bool {
    get_cached_emotes(scope, channel_id).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_cache_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "emote-cache-{}-{}",
            label,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn channel_scopes_require_an_id() {
        let dir = PathBuf::from("x");
        assert!(cache_path_in(&dir, CacheScope::BttvChannel, None).is_none());
        assert!(cache_path_in(&dir, CacheScope::BttvChannel, Some("")).is_none());
        assert!(cache_path_in(&dir, CacheScope::BttvChannel, Some("123")).is_some());
    }

    #[test]
    fn global_scopes_ignore_the_id() {
        let dir = PathBuf::from("x");
        let a = cache_path_in(&dir, CacheScope::BttvGlobal, None).unwrap();
        let b = cache_path_in(&dir, CacheScope::BttvGlobal, Some("123")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fresh_entries_round_trip() {
        let dir = temp_cache_dir("fresh");
        let emotes = vec![json!({ "id": "1", "code": "Kappa" })];
        set_cached_emotes_in(&dir, CacheScope::BttvGlobal, None, &emotes);
        assert_eq!(
            get_cached_emotes_in(&dir, CacheScope::BttvGlobal, None),
            Some(emotes)
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn expired_entries_are_dropped_and_removed() {
        let dir = temp_cache_dir("expired");
        let path = cache_path_in(&dir, CacheScope::SevenTvGlobal, None).unwrap();
        let stale = CacheEntry {
            generated_at: Utc::now() - chrono::Duration::days(8),
            emotes: vec![json!({ "id": "1", "name": "EZ" })],
        };
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        assert_eq!(get_cached_emotes_in(&dir, CacheScope::SevenTvGlobal, None), None);
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unparseable_entries_are_dropped_and_removed() {
        let dir = temp_cache_dir("garbage");
        let path = cache_path_in(&dir, CacheScope::BttvGlobal, None).unwrap();
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(get_cached_emotes_in(&dir, CacheScope::BttvGlobal, None), None);
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
