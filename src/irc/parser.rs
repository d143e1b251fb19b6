//! IRCv3 line parsing for the Twitch chat wire format.

use std::collections::HashMap;

/// One parsed IRC line: optional tag block, optional prefix, command, params.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IrcLine {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

/// A single chat message extracted from a PRIVMSG line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Option<String>,
    pub channel: String,
    pub user: String,
    pub text: String,
    pub timestamp_ms: i64,
    pub tags: HashMap<String, String>,
}

impl ChatMessage {
    /// Stable dedupe key: the provider-supplied id, or a composite when absent.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!(
                "{}:{}:{}:{}",
                self.channel, self.timestamp_ms, self.user, self.text
            ),
        }
    }
}

/// Unescape an IRCv3 tag value (`\s`, `\:`, `\\`, `\r`, `\n`).
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some(':') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn parse_tags(block: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    for kv in block.split(';') {
        if kv.is_empty() {
            continue;
        }
        let (key, value) = match kv.split_once('=') {
            Some((k, v)) => (k, unescape_tag_value(v)),
            None => (kv, String::new()),
        };
        tags.insert(key.to_string(), value);
    }
    tags
}

/// Parse a single CRLF-stripped IRC line into its structural parts.
///
/// Returns `None` for lines with no command token; malformed lines are
/// skipped by the caller rather than treated as fatal.
pub fn parse_line(line: &str) -> Option<IrcLine> {
    let mut rest = line;
    let mut tags = HashMap::new();
    let mut prefix = None;

    if let Some(tag_block) = rest.strip_prefix('@') {
        let i = tag_block.find(' ')?;
        tags = parse_tags(&tag_block[..i]);
        rest = tag_block[i + 1..].trim_start_matches(' ');
    }
    if let Some(prefix_block) = rest.strip_prefix(':') {
        let i = prefix_block.find(' ')?;
        prefix = Some(prefix_block[..i].to_string());
        rest = prefix_block[i + 1..].trim_start_matches(' ');
    }

    let command;
    match rest.find(' ') {
        Some(i) => {
            command = &rest[..i];
            rest = &rest[i + 1..];
        }
        None => {
            command = rest;
            rest = "";
        }
    }
    if command.is_empty() {
        return None;
    }

    let mut params = Vec::new();
    while !rest.is_empty() {
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_string());
            break;
        }
        match rest.find(' ') {
            Some(i) => {
                params.push(rest[..i].to_string());
                rest = &rest[i + 1..];
            }
            None => {
                params.push(rest.to_string());
                break;
            }
        }
    }

    Some(IrcLine {
        tags,
        prefix,
        command: command.to_string(),
        params,
    })
}

/// Build a [`ChatMessage`] from a parsed PRIVMSG line.
pub fn chat_message_from(line: &IrcLine) -> Option<ChatMessage> {
    if line.command != "PRIVMSG" {
        return None;
    }
    let channel = line.params.first()?.trim_start_matches('#').to_string();
    let text = line.params.get(1).cloned().unwrap_or_default();
    let user = line
        .prefix
        .as_deref()
        .and_then(|p| p.split('!').next())
        .filter(|u| !u.is_empty())
        .unwrap_or("user")
        .to_string();
    let id = line.tags.get("id").filter(|v| !v.is_empty()).cloned();
    let timestamp_ms = line
        .tags
        .get("tmi-sent-ts")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

    Some(ChatMessage {
        id,
        channel,
        user,
        text,
        timestamp_ms,
        tags: line.tags.clone(),
    })
}
