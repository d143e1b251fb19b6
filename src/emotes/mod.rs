pub mod cache;
pub mod catalog;
pub mod fetch;
pub mod tokenize;

pub use catalog::{CatalogLayer, Emote, EmoteCatalog, EmoteImages, EmoteProvider};
pub use tokenize::{
    parse_emote_ranges, tokenize_with_catalog, tokenize_with_ranges, EmoteRange, Token,
    TokenizedMessage,
};
