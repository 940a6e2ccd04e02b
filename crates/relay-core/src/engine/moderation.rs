use crate::{
    domain::{ChatId, UserId},
    messaging::types::{InboundMessage, Sender},
    Result,
};

use super::{mention_name, RelayEngine};

impl RelayEngine {
    /// Delete group messages carrying unauthorized links and post a
    /// short-lived warning. Admins and the chat creator are exempt.
    pub(super) async fn moderate(&self, msg: &InboundMessage, sender: &Sender) -> Result<()> {
        let text = msg.content.text_or_caption().unwrap_or("");
        // Admin lookup only for flagged messages.
        if !self.links.contains_unauthorized_link(text) {
            return Ok(());
        }
        if self.is_admin(msg.chat_id, sender.id).await {
            tracing::debug!(chat_id = msg.chat_id.0, user_id = sender.id.0, "admin link allowed");
            return Ok(());
        }

        if let Err(e) = self.out.port().delete_message(msg.message_ref()).await {
            tracing::warn!(chat_id = msg.chat_id.0, error = %e, "could not delete flagged message");
            return Ok(());
        }
        tracing::info!(chat_id = msg.chat_id.0, user_id = sender.id.0, "deleted unauthorized link");

        let warning = self.warning_text(sender);
        match self.out.send_plain(msg.chat_id, &warning).await {
            Ok(sent) => {
                self.scheduler
                    .schedule_delete(self.out.port().clone(), sent, self.cfg.warning_ttl);
            }
            Err(e) => {
                tracing::warn!(chat_id = msg.chat_id.0, error = %e, "could not post link warning");
            }
        }
        Ok(())
    }

    async fn is_admin(&self, chat: ChatId, user: UserId) -> bool {
        match self.out.port().member_status(chat, user).await {
            Ok(status) => status.is_privileged(),
            Err(e) => {
                tracing::debug!(chat_id = chat.0, error = %e, "member lookup failed, treating as member");
                false
            }
        }
    }

    fn warning_text(&self, sender: &Sender) -> String {
        let [ref_form, view_form] = self.links.allowed_forms();
        format!(
            "❌ {}, only @{} referral links are allowed!\n\nAllowed:\n• {ref_form}\n• {view_form}\nAdd your code after the underscore.\n\n⚠️ Other links may lead to a mute or ban.",
            mention_name(sender),
            self.links.handle(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::test_support::*;
    use crate::messaging::types::{IncomingUpdate, MemberStatus};

    #[tokio::test(start_paused = true)]
    async fn authorized_referral_is_left_alone() {
        let (engine, fake) = engine();
        engine
            .handle(IncomingUpdate::Message(group(
                user(5, Some("u")),
                "join t.me/zboxxbot?start=ref_abc123 now",
            )))
            .await
            .unwrap();

        assert!(fake.deletes().is_empty());
        assert!(fake.sent_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_mention_is_deleted_and_warning_expires() {
        let (engine, fake) = engine();
        let msg = group(user(5, Some("spammer")), "dm me @randomuser");
        let flagged = msg.message_ref();
        engine.handle(IncomingUpdate::Message(msg)).await.unwrap();

        assert_eq!(fake.deletes(), vec![flagged]);
        let warnings = fake.sent_texts();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].chat_id, GROUP);
        assert!(warnings[0].text.starts_with("❌ @spammer, only @zboxxbot"));
        assert!(warnings[0].text.contains("t.me/zboxxbot?start=ref_"));
        assert!(warnings[0].text.contains("t.me/zboxxbot?start=view_"));

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(fake.deletes().len(), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fake.deletes(), vec![flagged, warnings[0].message]);
    }

    #[tokio::test(start_paused = true)]
    async fn media_captions_are_moderated_too() {
        let (engine, fake) = engine();
        let mut msg = group(user(5, None), "");
        msg.content = photo(Some("visit https://evil.example"));
        engine.handle(IncomingUpdate::Message(msg)).await.unwrap();

        assert_eq!(fake.deletes().len(), 1);
        assert!(fake.sent_texts()[0].text.starts_with("❌ First,"));
    }

    #[tokio::test(start_paused = true)]
    async fn admins_are_never_moderated() {
        let (engine, fake) = engine();
        fake.set_member(GROUP, crate::domain::UserId(5), MemberStatus::Administrator);
        fake.set_member(GROUP, crate::domain::UserId(6), MemberStatus::Creator);

        for id in [5, 6] {
            engine
                .handle(IncomingUpdate::Message(group(user(id, None), "t.me/other")))
                .await
                .unwrap();
        }
        assert!(fake.deletes().is_empty());
        assert!(fake.sent_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_member_lookup_means_not_admin() {
        let (engine, fake) = engine();
        fake.fail_member_lookup();
        engine
            .handle(IncomingUpdate::Message(group(user(5, None), "t.me/other")))
            .await
            .unwrap();
        assert_eq!(fake.deletes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delete_stops_without_warning() {
        let (engine, fake) = engine();
        fake.fail_deletes();
        engine
            .handle(IncomingUpdate::Message(group(user(5, None), "@spam_here")))
            .await
            .unwrap();
        assert!(fake.sent_texts().is_empty());
        assert_eq!(engine.scheduler().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn group_commands_are_only_moderated() {
        let (engine, fake) = engine();
        engine
            .handle(IncomingUpdate::Message(group(user(5, None), "/start")))
            .await
            .unwrap();
        engine
            .handle(IncomingUpdate::Message(group(owner(), "/users")))
            .await
            .unwrap();
        assert!(fake.sent_texts().is_empty());
        assert_eq!(engine.state().user_count().await, 0);
    }
}
