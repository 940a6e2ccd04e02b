use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    messaging::types::{MemberStatus, MessagingCapabilities, OutgoingMedia, SendOptions},
    Result,
};

/// Cross-messenger port.
///
/// Every call may fail with `Error::Transport`; callers decide whether that
/// is ignored, turned into a fallback message, or propagated.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str, opts: &SendOptions)
        -> Result<MessageRef>;
    async fn send_media(&self, chat_id: ChatId, media: &OutgoingMedia) -> Result<MessageRef>;
    async fn forward_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageRef>;

    /// Replace the text of a previously sent message (plain text).
    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;
    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus>;
}
