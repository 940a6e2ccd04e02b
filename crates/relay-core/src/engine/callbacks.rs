use crate::{
    domain::UserId,
    envelope::first_mention,
    messaging::types::CallbackQuery,
    session::QuickReplySession,
    Result,
};

use super::RelayEngine;

/// Inline button payloads understood by the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Help,
    Support,
    Stats,
    CopyId(UserId),
    QuickReply(UserId),
    Unknown,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        let id_after = |prefix: &str| {
            data.strip_prefix(prefix)
                .and_then(|rest| rest.parse::<i64>().ok())
                .map(UserId)
        };

        match data {
            // `_btn` forms are what older welcome keyboards carry.
            "help" | "help_btn" => Self::Help,
            "support" | "support_btn" => Self::Support,
            "stats" | "stats_btn" => Self::Stats,
            _ => {
                if let Some(id) = id_after("copy_") {
                    Self::CopyId(id)
                } else if let Some(id) = id_after("quick_") {
                    Self::QuickReply(id)
                } else {
                    Self::Unknown
                }
            }
        }
    }

    pub fn data(&self) -> String {
        match self {
            Self::Help => "help".to_string(),
            Self::Support => "support".to_string(),
            Self::Stats => "stats".to_string(),
            Self::CopyId(id) => format!("copy_{id}"),
            Self::QuickReply(id) => format!("quick_{id}"),
            Self::Unknown => String::new(),
        }
    }
}

const HELP_TEXT: &str = "🆘 Help & Support\n\n• Send a message here and the team will reply shortly.\n• Replies arrive in this chat.";
const SUPPORT_TEXT: &str = "📞 Support\n\nSend a message and it will be delivered to the owner or team.";

impl RelayEngine {
    pub(super) async fn handle_callback(&self, q: &CallbackQuery) -> Result<()> {
        if let Err(e) = self
            .out
            .port()
            .answer_callback_query(&q.callback_id, None)
            .await
        {
            tracing::debug!(error = %e, "answerCallbackQuery failed");
        }

        let Some(origin) = q.message.as_ref() else {
            return Ok(());
        };
        let chat = origin.chat_id;
        let is_owner = q.user_id == self.owner();

        match CallbackAction::parse(&q.data) {
            CallbackAction::Help => {
                self.out.send_plain(chat, HELP_TEXT).await?;
            }
            CallbackAction::Support => {
                self.out.send_plain(chat, SUPPORT_TEXT).await?;
            }
            CallbackAction::Stats => {
                let users = self.state.user_count().await;
                let sessions = self.state.active_quick_replies().await;
                let text = format!(
                    "📊 Statistics\n\n• Total users: {users}\n• Active quick replies: {sessions}"
                );
                self.out.send_plain(chat, &text).await?;
            }
            CallbackAction::CopyId(id) if is_owner => {
                let text = format!("📋 User ID: {id}\n\nUse: /reply {id} your_message");
                self.out.send_plain(chat, &text).await?;
            }
            CallbackAction::QuickReply(id) if is_owner => {
                let source = origin
                    .text
                    .as_deref()
                    .or(origin.caption.as_deref())
                    .unwrap_or("");
                let username = first_mention(source).unwrap_or("User").to_string();

                self.state
                    .start_quick_reply(
                        q.user_id,
                        QuickReplySession {
                            target_user_id: id,
                            target_username: username.clone(),
                        },
                    )
                    .await;

                let text = format!(
                    "💬 Quick Reply to: {username}\n🆔 ID: {id}\n\n📝 Now type your message:\nI'll send it to this user\n\n/cancel to stop"
                );
                self.out.send_plain(chat, &text).await?;
            }
            action => {
                tracing::debug!(?action, data = %q.data, "callback ignored");
            }
        }
        Ok(())
    }
}
