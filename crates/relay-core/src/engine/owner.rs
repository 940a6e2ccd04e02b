use crate::{
    domain::UserId,
    envelope::parse_user_id,
    errors::Error,
    messaging::types::{Content, InboundMessage, RepliedMessage, Sender},
    session::QuickReplySession,
    Result,
};

use super::RelayEngine;

impl RelayEngine {
    /// Owner's non-command private message: an active quick reply wins, then
    /// a reply to a relayed message. Anything else is dropped.
    pub(super) async fn owner_reply(&self, msg: &InboundMessage, owner: &Sender) -> Result<()> {
        if let Some(session) = self.state.quick_reply(owner.id).await {
            return self.deliver_quick_reply(msg, owner.id, session).await;
        }
        if let Some(replied) = msg.reply_to.as_ref() {
            return self.reply_to_relayed(msg, replied).await;
        }
        Ok(())
    }

    async fn deliver_quick_reply(
        &self,
        msg: &InboundMessage,
        owner: UserId,
        session: QuickReplySession,
    ) -> Result<()> {
        let payload = msg.content.text_or_caption().unwrap_or("").trim();
        if payload.is_empty() {
            self.out
                .send_plain(msg.chat_id, "❌ Please type a valid message.")
                .await?;
            return Ok(());
        }

        let target = session.target_user_id;
        let report = match self.deliver_to_user(target, &msg.content).await {
            Ok(()) => {
                self.state.end_quick_reply(owner).await;
                format!("✅ Sent to {} ({target})", session.target_username)
            }
            Err(e) => {
                tracing::warn!(user_id = target.0, error = %e, "quick reply failed");
                "❌ Failed to send. User may have blocked bot.".to_string()
            }
        };
        self.out.send_plain(msg.chat_id, &report).await?;
        Ok(())
    }

    async fn reply_to_relayed(&self, msg: &InboundMessage, replied: &RepliedMessage) -> Result<()> {
        let target = replied
            .text
            .as_deref()
            .and_then(parse_user_id)
            .or_else(|| replied.caption.as_deref().and_then(parse_user_id));
        let Some(target) = target else {
            return Ok(());
        };

        let deliverable = match &msg.content {
            Content::Text(t) => !t.trim().is_empty(),
            Content::Other => false,
            _ => true,
        };
        if !deliverable {
            return Ok(());
        }

        let report = match self.deliver_to_user(target, &msg.content).await {
            Ok(()) => "✅ Reply sent!",
            Err(e) => {
                tracing::warn!(user_id = target.0, error = %e, "reply delivery failed");
                "❌ Failed to send reply."
            }
        };
        self.out.send_plain(msg.chat_id, report).await?;
        Ok(())
    }

    /// Media keeps its own caption; text goes out as plain text.
    async fn deliver_to_user(&self, target: UserId, content: &Content) -> Result<()> {
        let chat = target.private_chat();
        match content {
            Content::Text(text) => {
                self.out.send_plain(chat, text).await?;
            }
            Content::Other => {
                return Err(Error::Validation("nothing to deliver".to_string()));
            }
            media => {
                let caption = media.caption().map(str::to_string);
                if let Some(outgoing) = media.as_media(caption) {
                    self.out.send_media(chat, &outgoing).await?;
                }
            }
        }
        Ok(())
    }
}
