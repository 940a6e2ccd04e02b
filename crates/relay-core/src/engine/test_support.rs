use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    domain::{ChatId, MessageId, UserId},
    engine::RelayEngine,
    messaging::types::{CallbackOrigin, CallbackQuery, ChatKind, Content, InboundMessage, Sender},
    session::RelayState,
    testing::FakeMessenger,
};

pub const OWNER: UserId = UserId(1);
pub const GROUP: ChatId = ChatId(-100);

pub fn config() -> Config {
    Config {
        bot_token: "x".to_string(),
        owner_id: OWNER,
        bot_handle: "zboxxbot".to_string(),
        port: 8080,
        warning_ttl: Duration::from_secs(10),
        broadcast_delay: Duration::from_millis(200),
        broadcast_progress_every: 5,
        throttle_global: Duration::from_millis(40),
        throttle_per_chat: Duration::from_millis(1050),
    }
}

pub fn engine() -> (RelayEngine, Arc<FakeMessenger>) {
    let fake = Arc::new(FakeMessenger::new());
    let engine = RelayEngine::new(
        Arc::new(config()),
        Arc::new(RelayState::new()),
        fake.clone(),
    );
    (engine, fake)
}

pub fn user(id: i64, username: Option<&str>) -> Sender {
    Sender {
        id: UserId(id),
        is_bot: false,
        first_name: "First".to_string(),
        last_name: None,
        username: username.map(str::to_string),
    }
}

pub fn owner() -> Sender {
    user(OWNER.0, Some("boss"))
}

pub fn text(s: &str) -> Content {
    Content::Text(s.to_string())
}

pub fn photo(caption: Option<&str>) -> Content {
    Content::Photo {
        file_id: "photo-file".to_string(),
        caption: caption.map(str::to_string),
    }
}

pub fn private(from: Sender, content: Content) -> InboundMessage {
    InboundMessage {
        chat_id: from.id.private_chat(),
        chat_kind: ChatKind::Private,
        message_id: MessageId(1),
        sender: Some(from),
        content,
        reply_to: None,
    }
}

pub fn group(from: Sender, body: &str) -> InboundMessage {
    InboundMessage {
        chat_id: GROUP,
        chat_kind: ChatKind::Group,
        message_id: MessageId(2),
        sender: Some(from),
        content: text(body),
        reply_to: None,
    }
}

pub fn callback(from: UserId, data: &str, origin_text: Option<&str>) -> CallbackQuery {
    CallbackQuery {
        callback_id: format!("cb-{data}"),
        user_id: from,
        data: data.to_string(),
        message: Some(CallbackOrigin {
            chat_id: from.private_chat(),
            message_id: MessageId(50),
            text: origin_text.map(str::to_string),
            caption: None,
        }),
    }
}
