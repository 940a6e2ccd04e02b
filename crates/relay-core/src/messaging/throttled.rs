use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    config::Config,
    domain::{ChatId, MessageRef, UserId},
    messaging::{
        port::MessagingPort,
        types::{MemberStatus, MessagingCapabilities, OutgoingMedia, SendOptions},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat (Telegram 1 msg/sec style limits).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

impl From<&Config> for ThrottleConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            global_min_interval: cfg.throttle_global,
            per_chat_min_interval: cfg.throttle_per_chat,
        }
    }
}

/// Per-chat limiters are swept once the map reaches this size.
const SWEEP_AT: usize = 1024;

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }

    /// An idle limiter behaves exactly like a fresh one.
    fn is_idle(&self, now: Instant) -> bool {
        self.next <= now
    }
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// Best-effort defense against Telegram 429 errors during broadcasts and bursts
/// of relays. Membership lookups are read-only and only use the global limiter.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        if map.len() >= SWEEP_AT && !map.contains_key(&chat_id) {
            sweep_idle(&mut map);
        }
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_chat(&self, chat_id: i64) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(chat_wait);
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }
}

/// Drop limiters nobody is waiting on whose next slot has already passed.
fn sweep_idle(map: &mut HashMap<i64, Arc<Mutex<IntervalLimiter>>>) {
    let now = Instant::now();
    let before = map.len();
    map.retain(|_, lim| {
        Arc::strong_count(lim) > 1 || lim.try_lock().map_or(true, |l| !l.is_idle(now))
    });
    tracing::debug!(before, after = map.len(), "swept idle chat limiters");
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        opts: &SendOptions,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_text(chat_id, text, opts).await
    }

    async fn send_media(&self, chat_id: ChatId, media: &OutgoingMedia) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_media(chat_id, media).await
    }

    async fn forward_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageRef> {
        self.throttle_chat(to.0).await;
        self.inner.forward_message(to, msg).await
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.throttle_chat(msg.chat_id.0).await;
        self.inner.edit_text(msg, text).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.throttle_chat(msg.chat_id.0).await;
        self.inner.delete_message(msg).await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        // No chat_id available here; apply global throttling only.
        self.throttle_global().await;
        self.inner.answer_callback_query(callback_id, text).await
    }

    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus> {
        self.throttle_global().await;
        self.inner.member_status(chat_id, user_id).await
    }
}
