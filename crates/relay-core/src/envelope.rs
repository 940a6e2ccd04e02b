//! Owner-facing rendering of relayed messages.
//!
//! The envelope embeds `ID: <user id>` in plain text. When the owner replies to
//! a relayed message, that line is the only thing tying the reply back to its
//! sender (see [`parse_user_id`]). It breaks if the line is edited away; an
//! explicit message-to-user index would be sturdier.

use std::sync::OnceLock;

use regex::Regex;

use crate::{domain::UserId, messaging::types::Sender};

/// Replace characters that corrupt the owner's rendering.
pub fn clean_text(text: &str) -> String {
    text.replace('`', "'")
}

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Length as Telegram counts it: UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Cut `text` to at most `max_units` UTF-16 code units, marking the cut with
/// `…`. Never splits a character.
pub fn truncate_utf16(text: &str, max_units: usize) -> String {
    if utf16_len(text) <= max_units {
        return text.to_string();
    }
    let budget = max_units.saturating_sub('…'.len_utf16());
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

/// What the owner sees for one relayed message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayEnvelope {
    pub display_name: String,
    pub username: Option<String>,
    pub user_id: UserId,
}

impl RelayEnvelope {
    pub fn from_sender(sender: &Sender) -> Self {
        let first = if sender.first_name.trim().is_empty() {
            "User".to_string()
        } else {
            clean_text(&sender.first_name)
        };
        let display_name = match sender.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{first} {}", clean_text(last)),
            _ => first,
        };
        Self {
            display_name,
            username: sender.username.as_deref().map(clean_text),
            user_id: sender.id,
        }
    }

    /// `👤 Name (@username)` + `🆔 ID: <id>`.
    pub fn header(&self) -> String {
        let username = self.username.as_deref().unwrap_or("no_username");
        format!(
            "👤 {} (@{username})\n🆔 ID: {}",
            self.display_name, self.user_id
        )
    }

    pub fn render_text(&self, text: &str) -> String {
        format!("{}\n\n💬 {}", self.header(), clean_text(text))
    }

    /// Caption for relayed media: header plus the original caption, if any.
    pub fn render_caption(&self, caption: Option<&str>) -> String {
        match caption {
            Some(c) if !c.is_empty() => format!("{}\n\n{}", self.header(), clean_text(c)),
            _ => self.header(),
        }
    }

    /// Companion text for content that was forwarded as-is.
    pub fn render_forwarded(&self) -> String {
        format!("{}\n\n📨 Forwarded message", self.header())
    }
}

/// Recover the sender id from a relayed message (`ID: <digits>`).
pub fn parse_user_id(text: &str) -> Option<UserId> {
    static ID_RE: OnceLock<Regex> = OnceLock::new();
    let re = ID_RE.get_or_init(|| Regex::new(r"ID: (\d+)").expect("valid regex"));
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(UserId)
}

/// First `@username` token in `text`, best effort.
pub fn first_mention(text: &str) -> Option<&str> {
    static MENTION_RE: OnceLock<Regex> = OnceLock::new();
    let re = MENTION_RE.get_or_init(|| Regex::new(r"@[A-Za-z0-9_]+").expect("valid regex"));
    re.find(text).map(|m| m.as_str())
}
