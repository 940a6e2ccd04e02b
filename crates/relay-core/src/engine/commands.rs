use crate::{
    broadcast::{self, BroadcastSettings},
    domain::UserId,
    envelope::escape_html,
    errors::Error,
    messaging::types::{InboundMessage, InlineButton, InlineKeyboard, SendOptions, Sender},
    Result,
};

use super::{callbacks::CallbackAction, RelayEngine};

const OWNER_ONLY: &str = "❌ Owner only command.";
const REPLY_USAGE: &str = "❌ Usage: /reply USER_ID message";
const BROADCAST_USAGE: &str = "❌ Usage: /broadcast message";

/// A parsed `/name@bot args` command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Command {
    /// Lowercased, without the leading `/` and any `@bot` suffix.
    pub name: String,
    pub args: String,
}

pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim().to_string();

    let name = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if name.is_empty() {
        return None;
    }

    Some(Command { name, args })
}

fn parse_reply_args(args: &str) -> Result<(UserId, String)> {
    let mut parts = args.splitn(2, char::is_whitespace);
    let id = parts
        .next()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| Error::Validation("missing or invalid user id".to_string()))?;
    let text = parts.next().unwrap_or("").trim();
    if text.is_empty() {
        return Err(Error::Validation("missing message".to_string()));
    }
    Ok((UserId(id), text.to_string()))
}

fn welcome_keyboard() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![InlineButton::callback("📊 Stats", CallbackAction::Stats.data())],
        vec![
            InlineButton::callback("📞 Support", CallbackAction::Support.data()),
            InlineButton::callback("🆘 Help", CallbackAction::Help.data()),
        ],
    ])
}

impl RelayEngine {
    pub(super) async fn handle_command(
        &self,
        msg: &InboundMessage,
        sender: &Sender,
        cmd: Command,
    ) -> Result<()> {
        let is_owner = sender.id == self.owner();
        tracing::debug!(command = %cmd.name, user_id = sender.id.0, "command");

        match cmd.name.as_str() {
            "start" => self.cmd_start(msg, sender).await,
            "reply" | "broadcast" if !is_owner => {
                self.out.send_plain(msg.chat_id, OWNER_ONLY).await?;
                Ok(())
            }
            "reply" => self.cmd_reply(msg, &cmd.args).await,
            "broadcast" => self.cmd_broadcast(msg, &cmd.args).await,
            "users" if is_owner => {
                let n = self.state.user_count().await;
                self.out
                    .send_plain(msg.chat_id, &format!("📊 Total Users: {n}"))
                    .await?;
                Ok(())
            }
            "cancel" if is_owner => {
                let text = match self.state.end_quick_reply(sender.id).await {
                    Some(_) => "❌ Quick reply cancelled.",
                    None => "ℹ️ No active quick reply.",
                };
                self.out.send_plain(msg.chat_id, text).await?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn cmd_start(&self, msg: &InboundMessage, sender: &Sender) -> Result<()> {
        self.state.register_user(sender.id).await;

        let text = format!(
            "🤖 Welcome to @{} Help!\n\n<b>Features:</b>\n• Real Time Chat With Team\n• 24x7 Support\n\nUse the buttons below:",
            escape_html(&self.cfg.bot_handle)
        );
        self.out
            .send(
                msg.chat_id,
                &text,
                SendOptions::default().with_keyboard(welcome_keyboard()),
            )
            .await?;
        Ok(())
    }

    async fn cmd_reply(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let (target, text) = match parse_reply_args(args) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "bad /reply arguments");
                self.out.send_plain(msg.chat_id, REPLY_USAGE).await?;
                return Ok(());
            }
        };

        let report = match self.out.send_plain(target.private_chat(), &text).await {
            Ok(_) => format!("✅ Sent to user {target}"),
            Err(e) => {
                tracing::warn!(user_id = target.0, error = %e, "/reply delivery failed");
                format!("❌ Failed to send to user {target}")
            }
        };
        self.out.send_plain(msg.chat_id, &report).await?;
        Ok(())
    }

    async fn cmd_broadcast(&self, msg: &InboundMessage, args: &str) -> Result<()> {
        let message = args.trim();
        if message.is_empty() {
            self.out.send_plain(msg.chat_id, BROADCAST_USAGE).await?;
            return Ok(());
        }

        let recipients = self.state.users_snapshot().await;
        let out = self.out.clone();
        let report_to = msg.chat_id;
        let message = message.to_string();
        let settings = BroadcastSettings::from(self.cfg.as_ref());

        tracing::info!(recipients = recipients.len(), "broadcast started");
        self.scheduler.spawn(async move {
            broadcast::run(&out, &recipients, report_to, &message, settings).await;
        });
        Ok(())
    }
}
