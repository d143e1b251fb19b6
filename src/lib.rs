//! Twitch chat client with inline emote tokenization and live machine
//! translation overlay.
//!
//! The crate exposes in-process building blocks only: an IRC-over-WebSocket
//! chat client, an emote catalog with per-provider normalization, a message
//! tokenizer, a translation orchestrator with two pluggable back-ends, a
//! majority-language tracker, and an encrypted credential vault for the
//! user-supplied API keys the translation layer needs.

pub mod detect;
pub mod emotes;
pub mod history;
pub mod http;
pub mod irc;
pub mod session;
pub mod translate;
pub mod vault;

pub use detect::{detect_iso1, LanguageWindow};
pub use emotes::{
    parse_emote_ranges, tokenize_with_catalog, tokenize_with_ranges, CatalogLayer, Emote,
    EmoteCatalog, EmoteImages, EmoteProvider, Token, TokenizedMessage,
};
pub use history::{ChatHistory, ProcessedMessage};
pub use irc::{ChatEvent, ChatMessage, ConnectionState, IrcClient};
pub use session::{ChannelSession, SessionEvent, SessionSettings};
pub use translate::{
    merge_translation_tokens, should_translate, translate_if_needed, TranslateOptions,
    TranslationProvider,
};
pub use vault::{FileSecretStore, MemorySecretStore, SecretStore, Vault, VaultRecord};
