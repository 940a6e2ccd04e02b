use std::sync::Arc;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{OutgoingMedia, SendOptions, TextFormat},
    },
    Result,
};

/// Outbound dispatcher: rich text first, plain text as the one fallback.
///
/// Only the fallback attempt's error is returned to the caller; everything
/// else a caller does with a failure (ignore, apologise, count) is its own
/// decision.
#[derive(Clone)]
pub struct Outbound {
    port: Arc<dyn MessagingPort>,
}

impl Outbound {
    pub fn new(port: Arc<dyn MessagingPort>) -> Self {
        Self { port }
    }

    pub fn port(&self) -> &Arc<dyn MessagingPort> {
        &self.port
    }

    pub async fn send(&self, chat_id: ChatId, text: &str, opts: SendOptions) -> Result<MessageRef> {
        let rich = opts.format == TextFormat::Html && self.port.capabilities().supports_html;
        if rich {
            match self.port.send_text(chat_id, text, &opts).await {
                Ok(sent) => return Ok(sent),
                Err(e) => {
                    tracing::warn!(chat_id = chat_id.0, error = %e, "rich send failed, retrying as plain text");
                }
            }
        }

        let plain = SendOptions {
            format: TextFormat::Plain,
            ..opts
        };
        self.port.send_text(chat_id, text, &plain).await
    }

    /// Plain delivery for user-supplied text that must not be parsed.
    pub async fn send_plain(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.send(chat_id, text, SendOptions::plain()).await
    }

    pub async fn send_media(&self, chat_id: ChatId, media: &OutgoingMedia) -> Result<MessageRef> {
        self.port.send_media(chat_id, media).await
    }

    pub async fn forward(&self, to: ChatId, msg: MessageRef) -> Result<MessageRef> {
        self.port.forward_message(to, msg).await
    }
}
