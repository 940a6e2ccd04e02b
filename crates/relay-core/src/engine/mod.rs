//! Routing engine: decides, for every inbound update, where it goes.
//!
//! | chat / sender                  | route      |
//! |--------------------------------|------------|
//! | any bot, or no sender          | ignore     |
//! | group or supergroup            | moderate   |
//! | channel                        | ignore     |
//! | private, not the owner         | relay      |
//! | private, the owner             | owner      |
//!
//! Private text starting with `/` is a command and never relayed.

use std::sync::Arc;

use crate::{
    config::Config,
    domain::{ChatId, UserId},
    links::LinkPolicy,
    messaging::{
        outbound::Outbound,
        port::MessagingPort,
        types::{ChatKind, InboundMessage, IncomingUpdate, Sender},
    },
    scheduler::TaskScheduler,
    session::RelayState,
    Result,
};

mod callbacks;
mod commands;
mod moderation;
mod owner;
mod relay;

pub use callbacks::CallbackAction;
pub use commands::{parse_command, Command};

#[cfg(test)]
mod test_support;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Ignore,
    Moderate,
    Relay,
    Owner,
}

/// Pure routing decision for one message.
pub fn route(owner: UserId, msg: &InboundMessage) -> Route {
    let Some(sender) = msg.sender.as_ref() else {
        return Route::Ignore;
    };
    if sender.is_bot {
        return Route::Ignore;
    }
    match msg.chat_kind {
        kind if kind.is_group_like() => Route::Moderate,
        ChatKind::Private if sender.id == owner => Route::Owner,
        ChatKind::Private => Route::Relay,
        _ => Route::Ignore,
    }
}

/// The relay bot's policy core. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct RelayEngine {
    cfg: Arc<Config>,
    state: Arc<RelayState>,
    out: Outbound,
    links: Arc<LinkPolicy>,
    scheduler: TaskScheduler,
}

impl RelayEngine {
    pub fn new(cfg: Arc<Config>, state: Arc<RelayState>, port: Arc<dyn MessagingPort>) -> Self {
        let links = Arc::new(LinkPolicy::new(&cfg.bot_handle));
        Self {
            cfg,
            state,
            out: Outbound::new(port),
            links,
            scheduler: TaskScheduler::new(),
        }
    }

    pub fn state(&self) -> &Arc<RelayState> {
        &self.state
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    fn owner(&self) -> UserId {
        self.cfg.owner_id
    }

    fn owner_chat(&self) -> ChatId {
        self.cfg.owner_id.private_chat()
    }

    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        match update {
            IncomingUpdate::Message(msg) => self.handle_message(&msg).await,
            IncomingUpdate::Callback(q) => self.handle_callback(&q).await,
        }
    }

    async fn handle_message(&self, msg: &InboundMessage) -> Result<()> {
        let route = route(self.owner(), msg);
        let Some(sender) = msg.sender.as_ref() else {
            return Ok(());
        };

        match route {
            Route::Ignore => Ok(()),
            Route::Moderate => self.moderate(msg, sender).await,
            Route::Relay => {
                if self.state.register_user(sender.id).await {
                    tracing::info!(user_id = sender.id.0, "new user");
                }
                match command_of(msg) {
                    Some(cmd) => self.handle_command(msg, sender, cmd).await,
                    None => self.relay_to_owner(msg, sender).await,
                }
            }
            Route::Owner => match command_of(msg) {
                Some(cmd) => self.handle_command(msg, sender, cmd).await,
                None => self.owner_reply(msg, sender).await,
            },
        }
    }

    /// Cancel pending warning deletions and wait for running broadcasts.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

/// Any text starting with `/` is treated as a command. Slash text without a
/// parseable name yields an empty command, which nothing handles.
fn command_of(msg: &InboundMessage) -> Option<Command> {
    let text = msg.content.text()?;
    if !text.trim_start().starts_with('/') {
        return None;
    }
    Some(parse_command(text).unwrap_or_default())
}

/// Telegram-style name for warnings: `@username`, else first name.
fn mention_name(sender: &Sender) -> String {
    match sender.username.as_deref() {
        Some(u) if !u.is_empty() => format!("@{u}"),
        _ if !sender.first_name.trim().is_empty() => sender.first_name.clone(),
        _ => "User".to_string(),
    }
}
