//! Emote catalog: per-provider normalization and ordered layer merge.
//!
//! Each provider ships a differently shaped emote list; everything is
//! normalized to [`Emote`] before merging. Precedence is encoded as an
//! explicit ordered list of layers rather than call-order mutation, so later
//! layers (channel- and viewer-scoped sets) overwrite earlier ones on code
//! collision.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Image URLs per render scale. Missing scales are empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteImages {
    #[serde(default)]
    pub url_1x: String,
    #[serde(default)]
    pub url_2x: String,
    #[serde(default)]
    pub url_3x: String,
    #[serde(default)]
    pub url_4x: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmoteProvider {
    #[serde(rename = "twitch")]
    Twitch,
    #[serde(rename = "bttv")]
    Bttv,
    #[serde(rename = "7tv")]
    SevenTv,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emote {
    pub provider: EmoteProvider,
    pub code: String,
    pub id: String,
    pub images: EmoteImages,
}

/// One named slice of the merge order: a provider plus its normalized emotes.
#[derive(Clone, Debug)]
pub struct CatalogLayer {
    pub provider: EmoteProvider,
    pub emotes: Vec<Emote>,
}

impl CatalogLayer {
    /// Normalize a raw provider payload into a layer, dropping malformed
    /// entries.
    pub fn from_raw(provider: EmoteProvider, raw: &[Value]) -> Self {
        let emotes = raw
            .iter()
            .filter_map(|entry| normalize_emote(entry, provider))
            .collect();
        Self { provider, emotes }
    }
}

/// Code-keyed emote lookup produced by merging layers in precedence order.
#[derive(Clone, Debug, Default)]
pub struct EmoteCatalog {
    by_code: HashMap<String, Emote>,
}

impl EmoteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge layers in order; later layers win on code collision.
    ///
    /// Callers build the canonical order: twitch-global, twitch-channel,
    /// twitch-user, bttv-global, bttv-channel, 7tv-global, 7tv-channel.
    pub fn from_layers(layers: &[CatalogLayer]) -> Self {
        let mut by_code = HashMap::new();
        for layer in layers {
            for emote in &layer.emotes {
                by_code.insert(emote.code.clone(), emote.clone());
            }
        }
        Self { by_code }
    }

    pub fn get(&self, code: &str) -> Option<&Emote> {
        self.by_code.get(code)
    }

    /// Linear id lookup, used when a protocol-supplied range id has no code
    /// match (the covered substring may differ from the catalog code).
    pub fn find_by_id(&self, id: &str) -> Option<&Emote> {
        self.by_code.values().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Synthesize a Twitch emote from the default CDN template, keyed by id.
pub fn emote_from_cdn(id: &str, code: &str) -> Emote {
    let url = |scale: &str| {
        format!(
            "https://static-cdn.jtvnw.net/emoticons/v2/{}/default/dark/{}",
            id, scale
        )
    };
    Emote {
        provider: EmoteProvider::Twitch,
        code: code.to_string(),
        id: id.to_string(),
        images: EmoteImages {
            url_1x: url("1.0"),
            url_2x: url("2.0"),
            url_3x: url("3.0"),
            url_4x: String::new(),
        },
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn normalize_emote(raw: &Value, provider: EmoteProvider) -> Option<Emote> {
    match provider {
        EmoteProvider::Twitch => normalize_twitch(raw),
        EmoteProvider::Bttv => normalize_bttv(raw),
        EmoteProvider::SevenTv => normalize_seventv(raw),
    }
}

/// Twitch (Helix) emotes carry an explicit `images` object.
fn normalize_twitch(raw: &Value) -> Option<Emote> {
    let code = string_field(raw, "name").or_else(|| string_field(raw, "code"))?;
    let id = string_field(raw, "id").unwrap_or_else(|| code.clone());
    let images = raw.get("images").cloned().unwrap_or(Value::Null);
    let pick = |a: &str, b: &str| {
        string_field(&images, a)
            .or_else(|| string_field(&images, b))
            .unwrap_or_default()
    };
    Some(Emote {
        provider: EmoteProvider::Twitch,
        code,
        id,
        images: EmoteImages {
            url_1x: pick("url_1x", "1x"),
            url_2x: pick("url_2x", "2x"),
            url_3x: pick("url_3x", "3x"),
            url_4x: pick("url_4x", "4x"),
        },
    })
}

/// BTTV images are derived from a templated CDN path.
fn normalize_bttv(raw: &Value) -> Option<Emote> {
    let code = string_field(raw, "code").or_else(|| string_field(raw, "name"))?;
    let id = string_field(raw, "id")?;
    let url = |scale: u8| format!("https://cdn.betterttv.net/emote/{}/{}x", id, scale);
    let images = EmoteImages {
        url_1x: url(1),
        url_2x: url(2),
        url_3x: url(3),
        url_4x: String::new(),
    };
    Some(Emote {
        provider: EmoteProvider::Bttv,
        code,
        id,
        images,
    })
}

/// 7TV nests the emote under `data` for channel sets and lists per-scale
/// files under `host`; URLs are protocol-relative and need an `https:` fixup.
fn normalize_seventv(raw: &Value) -> Option<Emote> {
    let base = raw.get("data").unwrap_or(raw);
    let code = string_field(base, "name").or_else(|| string_field(raw, "name"))?;
    let id = string_field(base, "id").or_else(|| string_field(raw, "id"))?;

    let host = base.get("host").or_else(|| raw.get("host"));
    let mut images = EmoteImages::default();
    if let Some(host) = host {
        let base_url = host
            .get("url")
            .and_then(|u| u.as_str())
            .map(fix_protocol_relative)
            .unwrap_or_default();

        let files = host.get("files").and_then(|f| f.as_array());
        let mut found_any = false;
        for scale in 1u64..=4 {
            let file_name = files.and_then(|files| {
                files
                    .iter()
                    .find(|f| f.get("scale").and_then(|s| s.as_u64()) == Some(scale))
                    .and_then(|f| string_field(f, "url").or_else(|| string_field(f, "name")))
            });
            if let Some(name) = file_name {
                let full = if name.starts_with("http") || name.starts_with("//") {
                    fix_protocol_relative(&name)
                } else if base_url.is_empty() {
                    continue;
                } else {
                    format!("{}/{}", base_url, name)
                };
                found_any = true;
                set_scale(&mut images, scale, full);
            }
        }
        // Templated fallback when the file list gave us nothing.
        if !found_any && !base_url.is_empty() {
            for scale in 1u64..=4 {
                set_scale(&mut images, scale, format!("{}/{}x.webp", base_url, scale));
            }
        }
    }

    Some(Emote {
        provider: EmoteProvider::SevenTv,
        code,
        id,
        images,
    })
}

fn fix_protocol_relative(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

fn set_scale(images: &mut EmoteImages, scale: u64, url: String) {
    match scale {
        1 => images.url_1x = url,
        2 => images.url_2x = url,
        3 => images.url_3x = url,
        _ => images.url_4x = url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(provider: EmoteProvider, raw: Vec<Value>) -> CatalogLayer {
        CatalogLayer::from_raw(provider, &raw)
    }

    #[test]
    fn twitch_images_are_read_verbatim() {
        let raw = json!({
            "id": "25",
            "name": "Kappa",
            "images": { "url_1x": "https://a/1", "url_2x": "https://a/2" }
        });
        let emote = normalize_twitch(&raw).unwrap();
        assert_eq!(emote.code, "Kappa");
        assert_eq!(emote.images.url_1x, "https://a/1");
        assert_eq!(emote.images.url_4x, "");
    }

    #[test]
    fn bttv_urls_are_templated() {
        let raw = json!({ "id": "abc123", "code": "catJAM" });
        let emote = normalize_bttv(&raw).unwrap();
        assert_eq!(
            emote.images.url_2x,
            "https://cdn.betterttv.net/emote/abc123/2x"
        );
    }

    #[test]
    fn seventv_protocol_relative_urls_are_fixed_up() {
        let raw = json!({
            "id": "x1",
            "name": "PETTHE",
            "data": {
                "id": "x1",
                "name": "PETTHE",
                "host": {
                    "url": "//cdn.7tv.app/emote/x1",
                    "files": [
                        { "name": "1x.webp", "scale": 1 },
                        { "name": "4x.webp", "scale": 4 }
                    ]
                }
            }
        });
        let emote = normalize_seventv(&raw).unwrap();
        assert_eq!(emote.images.url_1x, "https://cdn.7tv.app/emote/x1/1x.webp");
        assert_eq!(emote.images.url_4x, "https://cdn.7tv.app/emote/x1/4x.webp");
        assert_eq!(emote.images.url_2x, "");
    }

    #[test]
    fn seventv_falls_back_to_template_when_no_files() {
        let raw = json!({
            "id": "x2",
            "name": "EZ",
            "host": { "url": "//cdn.7tv.app/emote/x2", "files": [] }
        });
        let emote = normalize_seventv(&raw).unwrap();
        assert_eq!(emote.images.url_3x, "https://cdn.7tv.app/emote/x2/3x.webp");
    }

    #[test]
    fn later_layers_win_on_code_collision() {
        let global = layer(
            EmoteProvider::Twitch,
            vec![json!({ "id": "1", "name": "Pog", "images": {} })],
        );
        let channel = layer(EmoteProvider::Bttv, vec![json!({ "id": "2", "code": "Pog" })]);
        let catalog = EmoteCatalog::from_layers(&[global, channel]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Pog").unwrap().provider, EmoteProvider::Bttv);
        assert_eq!(catalog.get("Pog").unwrap().id, "2");
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let l = layer(
            EmoteProvider::Bttv,
            vec![json!({ "code": "NoId" }), json!({ "id": "3", "code": "Ok" })],
        );
        assert_eq!(l.emotes.len(), 1);
        assert_eq!(l.emotes[0].code, "Ok");
    }

    #[test]
    fn find_by_id_scans_the_catalog() {
        let catalog = EmoteCatalog::from_layers(&[layer(
            EmoteProvider::Bttv,
            vec![json!({ "id": "42", "code": "monkaS" })],
        )]);
        assert_eq!(catalog.find_by_id("42").unwrap().code, "monkaS");
        assert!(catalog.find_by_id("43").is_none());
    }

    #[test]
    fn cdn_fallback_emote_is_keyed_by_id() {
        let emote = emote_from_cdn("305954156", "PogChamp");
        assert_eq!(emote.code, "PogChamp");
        assert!(emote.images.url_1x.contains("305954156"));
        assert!(emote.images.url_1x.ends_with("1.0"));
    }
}
