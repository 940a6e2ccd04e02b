use crate::{
    domain::UserId,
    envelope::{truncate_utf16, RelayEnvelope},
    messaging::types::{Content, InboundMessage, InlineButton, InlineKeyboard, SendOptions, Sender},
    Result,
};

use super::{callbacks::CallbackAction, RelayEngine};

pub(super) const ACKNOWLEDGEMENT: &str = "✅ Message received! Our team will reply soon.";

fn relay_keyboard(user: UserId) -> InlineKeyboard {
    InlineKeyboard::new(vec![vec![
        InlineButton::callback("📋 Copy ID", CallbackAction::CopyId(user).data()),
        InlineButton::callback("💬 Quick Reply", CallbackAction::QuickReply(user).data()),
    ]])
}

impl RelayEngine {
    /// Forward a user's message to the owner and acknowledge it. The user is
    /// acknowledged even when the owner could not be reached.
    pub(super) async fn relay_to_owner(&self, msg: &InboundMessage, sender: &Sender) -> Result<()> {
        let ack = match self.deliver_to_owner(msg, sender).await {
            Ok(()) => SendOptions::plain().replying_to(msg.message_id),
            Err(e) => {
                tracing::error!(user_id = sender.id.0, error = %e, "relay to owner failed");
                SendOptions::plain()
            }
        };
        self.out.send(msg.chat_id, ACKNOWLEDGEMENT, ack).await?;
        Ok(())
    }

    async fn deliver_to_owner(&self, msg: &InboundMessage, sender: &Sender) -> Result<()> {
        let envelope = RelayEnvelope::from_sender(sender);
        let keyboard = relay_keyboard(sender.id);
        let caps = self.out.port().capabilities();
        let owner = self.owner_chat();

        match &msg.content {
            Content::Text(text) => {
                let body = truncate_utf16(&envelope.render_text(text), caps.max_message_len);
                self.out
                    .send(owner, &body, SendOptions::plain().with_keyboard(keyboard))
                    .await?;
            }
            Content::Other => {
                self.out.forward(owner, msg.message_ref()).await?;
                let body = truncate_utf16(&envelope.render_forwarded(), caps.max_message_len);
                self.out
                    .send(owner, &body, SendOptions::plain().with_keyboard(keyboard))
                    .await?;
            }
            media => {
                let caption = truncate_utf16(
                    &envelope.render_caption(media.caption()),
                    caps.max_caption_len,
                );
                if let Some(mut outgoing) = media.as_media(Some(caption)) {
                    outgoing.keyboard = Some(keyboard);
                    self.out.send_media(owner, &outgoing).await?;
                }
            }
        }
        tracing::debug!(user_id = sender.id.0, "relayed to owner");
        Ok(())
    }
}
