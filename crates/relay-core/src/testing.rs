//! In-memory `MessagingPort` used by unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{
            InlineKeyboard, MemberStatus, MessagingCapabilities, OutgoingMedia, SendOptions,
            TextFormat,
        },
    },
    Result,
};

#[derive(Clone, Debug)]
pub struct SentText {
    pub chat_id: ChatId,
    pub text: String,
    pub format: TextFormat,
    pub keyboard: Option<InlineKeyboard>,
    pub reply_to: Option<MessageId>,
    pub message: MessageRef,
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    texts: Mutex<Vec<SentText>>,
    media: Mutex<Vec<(ChatId, OutgoingMedia)>>,
    forwards: Mutex<Vec<(ChatId, MessageRef)>>,
    edits: Mutex<Vec<(MessageRef, String)>>,
    deletes: Mutex<Vec<MessageRef>>,
    answers: Mutex<Vec<String>>,
    members: Mutex<HashMap<(i64, i64), MemberStatus>>,

    failing_chats: Mutex<HashSet<i64>>,
    fail_html: AtomicBool,
    fail_edits: AtomicBool,
    fail_deletes: AtomicBool,
    fail_member_lookup: AtomicBool,
    failed: AtomicUsize,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(100),
            ..Default::default()
        }
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }

    fn fail(&self, what: &str) -> Error {
        self.failed.fetch_add(1, Ordering::SeqCst);
        Error::Transport(format!("fake {what} failure"))
    }

    fn chat_fails(&self, chat_id: ChatId) -> bool {
        self.failing_chats.lock().unwrap().contains(&chat_id.0)
    }

    // ---- failure injection ----

    pub fn fail_chat(&self, chat_id: ChatId) {
        self.failing_chats.lock().unwrap().insert(chat_id.0);
    }

    pub fn heal_chat(&self, chat_id: ChatId) {
        self.failing_chats.lock().unwrap().remove(&chat_id.0);
    }

    pub fn fail_html(&self) {
        self.fail_html.store(true, Ordering::SeqCst);
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn fail_member_lookup(&self) {
        self.fail_member_lookup.store(true, Ordering::SeqCst);
    }

    pub fn set_member(&self, chat_id: ChatId, user_id: UserId, status: MemberStatus) {
        self.members
            .lock()
            .unwrap()
            .insert((chat_id.0, user_id.0), status);
    }

    // ---- inspection ----

    pub fn failed_attempts(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn sent_texts(&self) -> Vec<SentText> {
        self.texts.lock().unwrap().clone()
    }

    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.texts
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text.clone())
            .collect()
    }

    pub fn media_sent(&self) -> Vec<(ChatId, OutgoingMedia)> {
        self.media.lock().unwrap().clone()
    }

    pub fn forwards(&self) -> Vec<(ChatId, MessageRef)> {
        self.forwards.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(MessageRef, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<MessageRef> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn answered_callbacks(&self) -> Vec<String> {
        self.answers.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
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
        if self.chat_fails(chat_id) {
            return Err(self.fail("send"));
        }
        if opts.format == TextFormat::Html && self.fail_html.load(Ordering::SeqCst) {
            return Err(self.fail("html parse"));
        }
        let message = self.alloc(chat_id);
        self.texts.lock().unwrap().push(SentText {
            chat_id,
            text: text.to_string(),
            format: opts.format,
            keyboard: opts.keyboard.clone(),
            reply_to: opts.reply_to,
            message,
        });
        Ok(message)
    }

    async fn send_media(&self, chat_id: ChatId, media: &OutgoingMedia) -> Result<MessageRef> {
        if self.chat_fails(chat_id) {
            return Err(self.fail("media"));
        }
        self.media.lock().unwrap().push((chat_id, media.clone()));
        Ok(self.alloc(chat_id))
    }

    async fn forward_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageRef> {
        if self.chat_fails(to) {
            return Err(self.fail("forward"));
        }
        self.forwards.lock().unwrap().push((to, msg));
        Ok(self.alloc(to))
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(self.fail("edit"));
        }
        self.edits.lock().unwrap().push((msg, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(self.fail("delete"));
        }
        self.deletes.lock().unwrap().push(msg);
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.answers.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }

    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberStatus> {
        if self.fail_member_lookup.load(Ordering::SeqCst) {
            return Err(self.fail("getChatMember"));
        }
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&(chat_id.0, user_id.0))
            .copied()
            .unwrap_or(MemberStatus::Member))
    }
}
