//! Translation orchestration: decide per message whether to translate, and
//! through which back-end.
//!
//! The policy optimizes for the stream's dominant non-target language: a
//! message is translated only when the channel's primary language is known,
//! differs from the viewer's target, and the message itself is in that
//! primary language. Everything else passes through untranslated.

pub mod align;
pub mod libre;
pub mod openai;
pub mod target;

pub use align::merge_translation_tokens;
pub use libre::LibreOptions;
pub use openai::OpenAiOptions;
pub use target::{normalize_target, TARGET_LANGUAGES};

use serde::{Deserialize, Serialize};

/// Which translation back-end to call. Runtime-selected by the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "libre")]
    Libre,
}

impl TranslationProvider {
    pub fn from_name(name: &str) -> Self {
        match name {
            "libre" => Self::Libre,
            _ => Self::OpenAi,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Libre => "libre",
        }
    }
}

/// Everything the orchestrator needs for one translation decision.
#[derive(Clone, Debug, Default)]
pub struct TranslateOptions {
    pub provider: TranslationProvider,
    pub target_language: String,
    pub openai: OpenAiOptions,
    pub libre: LibreOptions,
}

/// Pure policy gate: translate only when the primary language is known,
/// differs from the target, and the message is in the primary language.
pub fn should_translate(
    source_iso1: Option<&str>,
    primary_iso1: Option<&str>,
    target_iso1: &str,
) -> bool {
    let Some(primary) = primary_iso1.map(str::to_lowercase).filter(|p| !p.is_empty()) else {
        return false;
    };
    if primary == target_iso1 {
        return false;
    }
    match source_iso1.map(str::to_lowercase) {
        Some(source) => source == primary,
        None => false,
    }
}

/// Translate `text` when the channel policy calls for it.
///
/// Returns `None` for every pass-through case: unknown primary language,
/// primary already equals the target, message not in the primary language,
/// or a provider failure. The caller renders the original text whenever this
/// returns `None`.
pub fn translate_if_needed(
    text: &str,
    source_iso1: Option<&str>,
    primary_iso1: Option<&str>,
    opts: &TranslateOptions,
) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    let target = normalize_target(&opts.target_language);
    if !should_translate(source_iso1, primary_iso1, &target) {
        return None;
    }
    let source = source_iso1.map(|s| s.to_lowercase())?;

    match opts.provider {
        TranslationProvider::OpenAi => {
            openai::translate_to_target(text, Some(&source), &target, &opts.openai)
        }
        TranslationProvider::Libre => {
            libre::translate_to_target(text, Some(&source), &target, &opts.libre)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> TranslateOptions {
        // No credentials: a policy hit would fall through to the provider
        // and come back None, so tests that must NOT call a provider are
        // distinguishable only by policy short-circuits below.
        TranslateOptions {
            provider: TranslationProvider::Libre,
            target_language: "en".into(),
            ..Default::default()
        }
    }

    #[test]
    fn no_primary_language_passes_through() {
        assert_eq!(translate_if_needed("hola amigos", Some("es"), None, &opts()), None);
    }

    #[test]
    fn primary_equal_to_target_passes_through() {
        assert_eq!(
            translate_if_needed("hello there", Some("en"), Some("en"), &opts()),
            None
        );
    }

    #[test]
    fn off_primary_message_passes_through() {
        // Primary es, target en, message detected fr: by design untouched.
        assert_eq!(
            translate_if_needed("bonjour à tous", Some("fr"), Some("es"), &opts()),
            None
        );
    }

    #[test]
    fn undetected_source_passes_through() {
        assert_eq!(translate_if_needed("???", None, Some("es"), &opts()), None);
    }

    #[test]
    fn on_primary_message_triggers_translation() {
        assert!(should_translate(Some("es"), Some("es"), "en"));
        assert!(!should_translate(Some("fr"), Some("es"), "en"));
    }

    #[test]
    fn provider_names_round_trip() {
        assert_eq!(TranslationProvider::from_name("libre"), TranslationProvider::Libre);
        assert_eq!(TranslationProvider::from_name("openai"), TranslationProvider::OpenAi);
        assert_eq!(TranslationProvider::from_name("anything"), TranslationProvider::OpenAi);
        assert_eq!(TranslationProvider::Libre.name(), "libre");
    }
}
