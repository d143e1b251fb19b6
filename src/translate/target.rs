//! Target-language table: every language with an ISO 639-1 code, with
//! English display names, plus validation that falls back to English.

use lazy_static::lazy_static;

lazy_static! {
    /// `(label, iso1)` pairs for all languages with an ISO 639-1 code,
    /// sorted by label.
    pub static ref TARGET_LANGUAGES: Vec<(String, String)> = {
        let mut languages = Vec::new();
        for i in 0..10000 {
            if let Some(lang) = isolang::Language::from_usize(i) {
                if let Some(iso1) = lang.to_639_1() {
                    languages.push((lang.to_name().to_string(), iso1.to_string()));
                }
            }
        }
        languages.sort();
        languages.dedup();
        languages
    };
}

pub fn is_supported_target(iso1: &str) -> bool {
    TARGET_LANGUAGES.iter().any(|(_, code)| code == iso1)
}

/// Normalize a requested target code, defaulting to English when unknown.
pub fn normalize_target(iso1: &str) -> String {
    let lower = iso1.trim().to_lowercase();
    if is_supported_target(&lower) {
        lower
    } else {
        "en".to_string()
    }
}

/// English display name for a target code, when known.
pub fn target_language_name(iso1: &str) -> Option<&'static str> {
    isolang::Language::from_639_1(iso1).map(|l| l.to_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_codes_are_supported() {
        for code in ["en", "es", "ja", "de", "vi"] {
            assert!(is_supported_target(code), "{code} should be supported");
        }
        assert!(!is_supported_target("xx"));
    }

    #[test]
    fn normalize_falls_back_to_english() {
        assert_eq!(normalize_target("ES"), "es");
        assert_eq!(normalize_target("klingon"), "en");
        assert_eq!(normalize_target(""), "en");
    }

    #[test]
    fn names_resolve() {
        assert_eq!(target_language_name("es"), Some("Spanish"));
        assert_eq!(target_language_name("zz"), None);
    }
}
