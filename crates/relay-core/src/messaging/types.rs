use crate::domain::{ChatId, MessageId, MessageRef, UserId};

/// Cross-messenger incoming update model.
///
/// Telegram-specific fields live in the Telegram adapter; commands are parsed
/// from message text by the engine.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Message(InboundMessage),
    Callback(CallbackQuery),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_group_like(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

#[derive(Clone, Debug)]
pub struct Sender {
    pub id: UserId,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// What a message carries. Media is referenced by the transport's file id so it
/// can be re-sent without downloading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Video {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        caption: Option<String>,
    },
    /// Stickers, voice, locations, ... (forwardable but not re-sendable).
    Other,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            Content::Photo { caption, .. }
            | Content::Video { caption, .. }
            | Content::Document { caption, .. } => caption.as_deref(),
            _ => None,
        }
    }

    /// Text for text messages, caption for media.
    pub fn text_or_caption(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }

    /// The media part of the content, if any, with its caption replaced.
    pub fn as_media(&self, caption: Option<String>) -> Option<OutgoingMedia> {
        let (kind, file_id) = match self {
            Content::Photo { file_id, .. } => (MediaKind::Photo, file_id),
            Content::Video { file_id, .. } => (MediaKind::Video, file_id),
            Content::Document { file_id, .. } => (MediaKind::Document, file_id),
            _ => return None,
        };
        Some(OutgoingMedia {
            kind,
            file_id: file_id.clone(),
            caption,
            keyboard: None,
        })
    }
}

/// The message an inbound message replies to (only what routing needs).
#[derive(Clone, Debug, Default)]
pub struct RepliedMessage {
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    /// `None` for anonymous channel posts.
    pub sender: Option<Sender>,
    pub content: Content,
    pub reply_to: Option<RepliedMessage>,
}

impl InboundMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }
}

/// The message carrying the pressed button.
#[derive(Clone, Debug)]
pub struct CallbackOrigin {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub callback_id: String,
    pub user_id: UserId,
    pub data: String,
    pub message: Option<CallbackOrigin>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextFormat {
    /// Telegram HTML.
    #[default]
    Html,
    Plain,
}

#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    pub format: TextFormat,
    pub keyboard: Option<InlineKeyboard>,
    pub reply_to: Option<MessageId>,
}

impl SendOptions {
    pub fn plain() -> Self {
        Self {
            format: TextFormat::Plain,
            ..Default::default()
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn replying_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

/// Media re-sent by file id. Captions are always plain text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMedia {
    pub kind: MediaKind,
    pub file_id: String,
    pub caption: Option<String>,
    pub keyboard: Option<InlineKeyboard>,
}

/// Chat membership as reported by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    pub fn is_privileged(self) -> bool {
        matches!(self, MemberStatus::Creator | MemberStatus::Administrator)
    }
}

/// Inline keyboard (rows of callback buttons).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Every callback payload, row by row.
    pub fn callback_data(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    pub max_message_len: usize,
    pub max_caption_len: usize,
}
