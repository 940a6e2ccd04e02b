//! Telegram adapter (teloxide).
//!
//! This crate implements the `relay-core` MessagingPort over the Telegram Bot
//! API and feeds updates into the core routing engine.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ChatMemberStatus, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

pub use teloxide::Bot;

use relay_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{
            InlineKeyboard, MediaKind, MemberStatus, MessagingCapabilities, OutgoingMedia,
            SendOptions, TextFormat,
        },
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn tg_user(user_id: UserId) -> teloxide::types::UserId {
        teloxide::types::UserId(user_id.0 as u64)
    }

    fn sent(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::debug!(retry_after = ?d, "telegram rate limit, retrying");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

pub(crate) fn tg_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.callback_data.clone()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

pub(crate) fn member_status(status: ChatMemberStatus) -> MemberStatus {
    match status {
        ChatMemberStatus::Owner => MemberStatus::Creator,
        ChatMemberStatus::Administrator => MemberStatus::Administrator,
        ChatMemberStatus::Member => MemberStatus::Member,
        ChatMemberStatus::Restricted => MemberStatus::Restricted,
        ChatMemberStatus::Left => MemberStatus::Left,
        ChatMemberStatus::Banned => MemberStatus::Banned,
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_html: true,
            max_message_len: 4096,
            max_caption_len: 1024,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        opts: &SendOptions,
    ) -> Result<MessageRef> {
        let markup = opts.keyboard.as_ref().map(tg_markup);
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_message(Self::tg_chat(chat_id), text.to_string());
                if opts.format == TextFormat::Html {
                    req = req.parse_mode(ParseMode::Html);
                }
                if let Some(reply_to) = opts.reply_to {
                    req = req
                        .reply_to_message_id(Self::tg_msg_id(reply_to))
                        .allow_sending_without_reply(true);
                }
                if let Some(markup) = &markup {
                    req = req.reply_markup(markup.clone());
                }
                req
            })
            .await?;

        Ok(Self::sent(chat_id, &msg))
    }

    async fn send_media(&self, chat_id: ChatId, media: &OutgoingMedia) -> Result<MessageRef> {
        let chat = Self::tg_chat(chat_id);
        let markup = media.keyboard.as_ref().map(tg_markup);
        let caption = media.caption.clone();
        let file = || InputFile::file_id(media.file_id.clone());

        let msg = match media.kind {
            MediaKind::Photo => {
                self.with_retry(|| {
                    let mut req = self.bot.send_photo(chat, file());
                    if let Some(c) = &caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await?
            }
            MediaKind::Video => {
                self.with_retry(|| {
                    let mut req = self.bot.send_video(chat, file());
                    if let Some(c) = &caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await?
            }
            MediaKind::Document => {
                self.with_retry(|| {
                    let mut req = self.bot.send_document(chat, file());
                    if let Some(c) = &caption {
                        req = req.caption(c.clone());
                    }
                    if let Some(m) = &markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await?
            }
        };

        Ok(Self::sent(chat_id, &msg))
    }

    async fn forward_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageRef> {
        let fwd = self
            .with_retry(|| {
                self.bot.forward_message(
                    Self::tg_chat(to),
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                )
            })
            .await?;
        Ok(Self::sent(to, &fwd))
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                text.to_string(),
            )
        })
        .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus> {
        let member = self
            .with_retry(|| {
                self.bot
                    .get_chat_member(Self::tg_chat(chat_id), Self::tg_user(user_id))
            })
            .await?;
        Ok(member_status(member.kind.status()))
    }
}
