//! Link classifier for group moderation.
//!
//! A message is flagged when any link-like token in it is not an authorized
//! referral link to the bot itself. Link-like tokens come from a fixed set of
//! pattern categories; the result does not depend on their order.

use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

/// Pattern categories scanned for link-like tokens.
const CATEGORY_PATTERNS: &[&str] = &[
    // http/https URLs
    r#"(?i)https?://[^\s<>"]+"#,
    // Any t.me link
    r#"(?i)t\.me/[^\s<>"]+"#,
    // @handle mentions
    r"@[A-Za-z0-9_]{3,}",
    // Domain-like tokens (www.anything.in, short.link, ...)
    r#"(?i)(?:[a-z0-9-]+\.)+[a-z]{2,}(?:/[^\s<>"]*)?"#,
    // URL shorteners
    r#"(?i)(?:bit\.ly|goo\.gl|tinyurl|t\.co|ow\.ly|is\.gd|buff\.ly|adf\.ly|shorte\.st|bc\.vc|tr\.im|prettylink|qr\.net|v\.gd|cur\.lv|tiny\.cc|cli\.gs|u\.to|j\.mp|buzurl|cutt\.us|u\.bb|yourls|xo\.at|scrnch\.me|viralurl|1url\.com|tweez\.me|v\.ht|link\.zip|url\.rs)/[^\s<>"]+"#,
    // Bare IPv4, optional port
    r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}(?::\d+)?\b",
    // Email-like tokens
    r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b",
    // www./ftp. prefixed bare domains
    r#"(?i)\b(?:www\.|ftp\.)[^\s<>"]+\.[a-z]{2,}(?:/[^\s<>"]*)?\b"#,
];

fn category_regexes() -> &'static [Regex] {
    static CATEGORIES: OnceLock<Vec<Regex>> = OnceLock::new();
    CATEGORIES.get_or_init(|| {
        CATEGORY_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("valid link category regex"))
            .collect()
    })
}

/// Allow-list for group links: referral (`ref_`) and view (`view_`) deep links
/// to one bot handle.
#[derive(Clone, Debug)]
pub struct LinkPolicy {
    handle: String,
    authorized: Regex,
}

impl LinkPolicy {
    pub fn new(bot_handle: &str) -> Self {
        let handle = bot_handle.trim_start_matches('@').to_string();
        let authorized = Regex::new(&format!(
            r"(?i)^(?:https?://)?t\.me/{}\?start=(?:ref|view)_",
            regex::escape(&handle)
        ))
        .expect("escaped handle yields a valid regex");
        Self { handle, authorized }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Whether a single link-like token is an authorized referral/view link.
    pub fn is_authorized_link(&self, candidate: &str) -> bool {
        self.authorized.is_match(candidate.trim())
    }

    /// All link-like tokens in `text`, deduplicated, in first-seen order.
    pub fn candidates<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut seen = HashSet::new();
        category_regexes()
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| m.as_str()))
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// True when `text` holds any link-like token that is not authorized.
    /// Stops at the first offending token.
    pub fn contains_unauthorized_link(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let mut seen = HashSet::new();
        for candidate in category_regexes()
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| m.as_str()))
        {
            if !seen.insert(candidate) {
                continue;
            }
            if !self.is_authorized_link(candidate) {
                tracing::debug!(candidate, "unauthorized link");
                return true;
            }
        }
        false
    }

    /// Human-readable list of the accepted link forms.
    pub fn allowed_forms(&self) -> [String; 2] {
        [
            format!("t.me/{}?start=ref_", self.handle),
            format!("t.me/{}?start=view_", self.handle),
        ]
    }
}
