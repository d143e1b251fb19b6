pub mod client;
pub mod parser;

pub use client::{ChatEvent, ConnectionState, IrcClient};
pub use parser::{chat_message_from, parse_line, ChatMessage, IrcLine};
