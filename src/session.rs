//! Per-channel session: wires the protocol client's messages through
//! tokenization, language detection, and the translation orchestrator.
//!
//! Translation is fire-and-forget per message: the untranslated message is
//! emitted immediately and a worker thread delivers the aligned translation
//! later as its own event. A cancelled flag set by `teardown` suppresses
//! late results after the view has moved to another channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::detect::{detect_iso1, LanguageWindow};
use crate::emotes::{parse_emote_ranges, tokenize_with_catalog, tokenize_with_ranges, EmoteCatalog};
use crate::history::{ChatHistory, ProcessedMessage};
use crate::irc::ChatMessage;
use crate::translate::{
    merge_translation_tokens, translate_if_needed, LibreOptions, OpenAiOptions, TranslateOptions,
    TranslationProvider,
};
use crate::vault::Vault;

/// Viewer-facing knobs; credentials come from the vault.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub provider: TranslationProvider,
    pub target_language: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            target_language: "en".to_string(),
        }
    }
}

/// Resolve settings plus vault secrets into concrete translate options.
///
/// A locked vault yields empty credentials, which the providers treat as
/// "feature unavailable".
pub fn resolve_translate_options(settings: &SessionSettings, vault: &Vault) -> TranslateOptions {
    let secret = |key: &str| vault.secret(key).unwrap_or_default();
    let mut libre = LibreOptions::default();
    let endpoint = secret("libreEndpoint");
    if !endpoint.is_empty() {
        libre.endpoint = endpoint;
    }
    libre.api_key = secret("libreKey");
    TranslateOptions {
        provider: settings.provider,
        target_language: settings.target_language.clone(),
        openai: OpenAiOptions {
            api_key: secret("openaiKey"),
            model: secret("openaiModel"),
        },
        libre,
    }
}

#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// A new message, untranslated; rendering should not wait for more.
    Message(ProcessedMessage),
    /// A translation for an earlier message, already aligned onto its
    /// token boundaries.
    Translation {
        key: String,
        text: String,
        tokens: Vec<crate::emotes::Token>,
    },
}

pub struct ChannelSession {
    channel: String,
    catalog: Arc<EmoteCatalog>,
    options: Arc<Mutex<TranslateOptions>>,
    history: Arc<Mutex<ChatHistory>>,
    window: Arc<Mutex<LanguageWindow>>,
    primary_language: Arc<Mutex<Option<String>>>,
    cancelled: Arc<AtomicBool>,
    events: Sender<SessionEvent>,
}

impl ChannelSession {
    pub fn new(
        channel: &str,
        catalog: Arc<EmoteCatalog>,
        options: TranslateOptions,
    ) -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (
            Self {
                channel: channel.to_string(),
                catalog,
                options: Arc::new(Mutex::new(options)),
                history: Arc::new(Mutex::new(ChatHistory::new())),
                window: Arc::new(Mutex::new(LanguageWindow::new())),
                primary_language: Arc::new(Mutex::new(None)),
                cancelled: Arc::new(AtomicBool::new(false)),
                events: tx,
            },
            rx,
        )
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Seed the primary language from out-of-band data (the stream's
    /// reported broadcast language), before chat volume can decide.
    pub fn seed_primary_language(&self, iso1: &str) {
        let lower = iso1.trim().to_lowercase();
        if lower.is_empty() {
            return;
        }
        *self.primary_language.lock().unwrap() = Some(lower);
    }

    pub fn primary_language(&self) -> Option<String> {
        self.primary_language.lock().unwrap().clone()
    }

    /// Swap the translation options (provider/target change mid-session).
    pub fn set_options(&self, options: TranslateOptions) {
        *self.options.lock().unwrap() = options;
    }

    pub fn history_snapshot(&self) -> Vec<ProcessedMessage> {
        self.history.lock().unwrap().iter().cloned().collect()
    }

    /// Process one inbound chat message end to end.
    pub fn handle_message(&self, msg: ChatMessage) {
        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }

        // Range metadata from the protocol wins over catalog matching.
        let ranges = msg
            .tags
            .get("emotes")
            .filter(|v| !v.is_empty())
            .map(|v| parse_emote_ranges(v))
            .unwrap_or_default();
        let tokenized = if ranges.is_empty() {
            tokenize_with_catalog(&msg.text, &self.catalog)
        } else {
            tokenize_with_ranges(&msg.text, &ranges, &self.catalog)
        };

        let language = detect_iso1(&msg.text);
        let key = msg.key();
        let processed = ProcessedMessage {
            key: key.clone(),
            tokens: tokenized.tokens.clone(),
            translation_tokens: tokenized.tokens.clone(),
            plain_text: tokenized.text_value.clone(),
            language: language.clone(),
            translation_text: None,
            message: msg,
        };

        if !self.history.lock().unwrap().push(processed.clone()) {
            return;
        }
        let _ = self.events.send(SessionEvent::Message(processed));

        // The rolling window prefers the emote-stripped text so emote walls
        // do not skew the majority.
        {
            let mut window = self.window.lock().unwrap();
            if !tokenized.text_value.is_empty() {
                window.push(&tokenized.text_value);
            }
            let mut primary = self.primary_language.lock().unwrap();
            if primary.is_none() {
                *primary = window.majority_language();
            }
        }

        if tokenized.text_value.is_empty() {
            return;
        }

        // Fire-and-forget translation; rendering never waits on it.
        let cancelled = self.cancelled.clone();
        let options = self.options.lock().unwrap().clone();
        let primary = self.primary_language.lock().unwrap().clone();
        let history = self.history.clone();
        let events = self.events.clone();
        let plain_text = tokenized.text_value;
        let tokens = tokenized.tokens;
        thread::spawn(move || {
            let translated = translate_if_needed(
                &plain_text,
                language.as_deref(),
                primary.as_deref(),
                &options,
            );
            let Some(text) = translated else {
                return;
            };
            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            let aligned = merge_translation_tokens(&tokens, &text);
            history
                .lock()
                .unwrap()
                .apply_translation(&key, &text, aligned.clone());
            let _ = events.send(SessionEvent::Translation {
                key,
                text,
                tokens: aligned,
            });
        });
    }

    /// Tear the session down: suppress in-flight translations and clear the
    /// history, dedupe set, and language window. Idempotent; the caller
    /// parts and disconnects the protocol client.
    pub fn teardown(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.history.lock().unwrap().clear();
        self.window.lock().unwrap().clear();
        *self.primary_language.lock().unwrap() = None;
    }
}
