use std::{env, time::Duration};

use crate::{domain::UserId, errors::Error, Result};

pub const DEFAULT_BOT_HANDLE: &str = "zboxxbot";

/// Typed configuration for the relay bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub owner_id: UserId,
    pub bot_handle: String,

    // Health endpoint
    pub port: u16,

    // Moderation
    pub warning_ttl: Duration,

    // Broadcast
    pub broadcast_delay: Duration,
    pub broadcast_progress_every: usize,

    // Outbound throttling
    pub throttle_global: Duration,
    pub throttle_per_chat: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Existing variables win over `.env`.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_str = |key: &str| lookup(key).and_then(non_empty);
        let env_u64 = |key: &str| env_str(key).and_then(|s| s.trim().parse::<u64>().ok());

        // Required env vars
        let bot_token = env_str("BOT_TOKEN").ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;
        let owner_raw = env_str("OWNER_ID").ok_or_else(|| {
            Error::Config("OWNER_ID environment variable is required".to_string())
        })?;
        let owner_id = owner_raw
            .trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| Error::Config(format!("OWNER_ID must be a numeric id, got {owner_raw:?}")))?;

        let bot_handle = env_str("BOT_HANDLE")
            .map(|h| h.trim().trim_start_matches('@').to_string())
            .unwrap_or_else(|| DEFAULT_BOT_HANDLE.to_string());

        let port = match env_str("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a valid port, got {p:?}")))?,
            None => 8080,
        };

        let warning_ttl = Duration::from_millis(env_u64("WARNING_TTL_MS").unwrap_or(10_000));
        let broadcast_delay = Duration::from_millis(env_u64("BROADCAST_DELAY_MS").unwrap_or(200));
        let broadcast_progress_every = env_u64("BROADCAST_PROGRESS_EVERY")
            .map(|n| n as usize)
            .unwrap_or(5)
            .max(1);

        let throttle_global = Duration::from_millis(env_u64("THROTTLE_GLOBAL_MS").unwrap_or(40));
        let throttle_per_chat =
            Duration::from_millis(env_u64("THROTTLE_PER_CHAT_MS").unwrap_or(1050));

        Ok(Self {
            bot_token,
            owner_id,
            bot_handle,
            port,
            warning_ttl,
            broadcast_delay,
            broadcast_progress_every,
            throttle_global,
            throttle_per_chat,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let cfg = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("OWNER_ID", "42")])).unwrap();
        assert_eq!(cfg.owner_id, UserId(42));
        assert_eq!(cfg.bot_handle, "zboxxbot");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.warning_ttl, Duration::from_secs(10));
        assert_eq!(cfg.broadcast_delay, Duration::from_millis(200));
        assert_eq!(cfg.broadcast_progress_every, 5);
    }

    #[test]
    fn missing_token_or_owner_is_fatal() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("OWNER_ID", "42")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("OWNER_ID", "  ")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("OWNER_ID", "abc")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("OWNER_ID", "7"),
            ("BOT_HANDLE", "@OtherBot"),
            ("PORT", "9000"),
            ("WARNING_TTL_MS", "500"),
            ("BROADCAST_PROGRESS_EVERY", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.bot_handle, "OtherBot");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.warning_ttl, Duration::from_millis(500));
        assert_eq!(cfg.broadcast_progress_every, 1);
    }
}
