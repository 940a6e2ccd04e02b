//! Telegram update handlers.
//!
//! Each handler converts a teloxide update into the core's transport-neutral
//! types and hands it to the routing engine. Engine errors are logged here;
//! they never stop the dispatcher.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};

use relay_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::{
        CallbackOrigin, ChatKind, Content, InboundMessage, IncomingUpdate, RepliedMessage, Sender,
    },
};

use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let update = IncomingUpdate::Callback(callback_from_tg(&q));
    if let Err(e) = state.engine.handle(update).await {
        tracing::warn!(user_id = q.from.id.0, error = %e, "callback handling failed");
    }
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let update = IncomingUpdate::Message(inbound_from_tg(&msg));
    if let Err(e) = state.engine.handle(update).await {
        tracing::warn!(chat_id, error = %e, "message handling failed");
    }
    Ok(())
}

fn chat_kind(msg: &Message) -> ChatKind {
    if msg.chat.is_private() {
        ChatKind::Private
    } else if msg.chat.is_supergroup() {
        ChatKind::Supergroup
    } else if msg.chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    }
}

fn sender_from_tg(user: &User) -> Sender {
    Sender {
        id: UserId(user.id.0 as i64),
        is_bot: user.is_bot,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

fn content_from_tg(msg: &Message) -> Content {
    let caption = msg.caption().map(str::to_string);

    if let Some(text) = msg.text() {
        return Content::Text(text.to_string());
    }
    // Telegram lists photo sizes smallest first.
    if let Some(best) = msg.photo().and_then(|sizes| sizes.last()) {
        return Content::Photo {
            file_id: best.file.id.clone(),
            caption,
        };
    }
    if let Some(video) = msg.video() {
        return Content::Video {
            file_id: video.file.id.clone(),
            caption,
        };
    }
    if let Some(doc) = msg.document() {
        return Content::Document {
            file_id: doc.file.id.clone(),
            caption,
        };
    }
    Content::Other
}

pub(crate) fn inbound_from_tg(msg: &Message) -> InboundMessage {
    InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        chat_kind: chat_kind(msg),
        message_id: MessageId(msg.id.0),
        sender: msg.from().map(sender_from_tg),
        content: content_from_tg(msg),
        reply_to: msg.reply_to_message().map(|r| RepliedMessage {
            text: r.text().map(str::to_string),
            caption: r.caption().map(str::to_string),
        }),
    }
}

pub(crate) fn callback_from_tg(q: &CallbackQuery) -> relay_core::messaging::types::CallbackQuery {
    relay_core::messaging::types::CallbackQuery {
        callback_id: q.id.clone(),
        user_id: UserId(q.from.id.0 as i64),
        data: q.data.clone().unwrap_or_default(),
        message: q.message.as_ref().map(|m| CallbackOrigin {
            chat_id: ChatId(m.chat.id.0),
            message_id: MessageId(m.id.0),
            text: m.text().map(str::to_string),
            caption: m.caption().map(str::to_string),
        }),
    }
}
