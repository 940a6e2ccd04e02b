use std::time::Duration;

use tokio::time::sleep;

use crate::{
    config::Config,
    domain::{ChatId, UserId},
    envelope::escape_html,
    messaging::{outbound::Outbound, types::SendOptions},
};

#[derive(Clone, Copy, Debug)]
pub struct BroadcastSettings {
    /// Pause between two sends.
    pub delay: Duration,
    /// Edit the progress message after every N-th attempt (and the last one).
    pub progress_every: usize,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(200),
            progress_every: 5,
        }
    }
}

impl From<&Config> for BroadcastSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            delay: cfg.broadcast_delay,
            progress_every: cfg.broadcast_progress_every.max(1),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

impl BroadcastReport {
    pub fn summary(&self) -> String {
        format!(
            "📊 Broadcast Complete\n\n✅ Success: {}\n❌ Failed: {}\n📱 Total: {}",
            self.success, self.failed, self.total
        )
    }
}

/// Deliver `message` to every recipient, one at a time, reporting progress
/// into `report_to`.
///
/// `recipients` is a snapshot taken by the caller. Per-recipient failures are
/// counted, never retried; progress edits are cosmetic and their failures are
/// ignored.
pub async fn run(
    out: &Outbound,
    recipients: &[UserId],
    report_to: ChatId,
    message: &str,
    settings: BroadcastSettings,
) -> BroadcastReport {
    let total = recipients.len();
    let every = settings.progress_every.max(1);
    let body = format!("📢 <b>{}</b>", escape_html(message));

    let progress = match out
        .send_plain(report_to, &format!("🔄 Broadcasting to {total} users..."))
        .await
    {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = %e, "could not post broadcast progress message");
            None
        }
    };

    let mut report = BroadcastReport {
        total,
        ..Default::default()
    };

    for (i, user) in recipients.iter().enumerate() {
        match out
            .send(user.private_chat(), &body, SendOptions::default())
            .await
        {
            Ok(_) => report.success += 1,
            Err(e) => {
                tracing::debug!(user_id = user.0, error = %e, "broadcast delivery failed");
                report.failed += 1;
            }
        }

        let last = i + 1 == total;
        if let Some(progress) = progress {
            if i % every == 0 || last {
                let _ = out
                    .port()
                    .edit_text(progress, &format!("🔄 Broadcasting... {}/{total} users", i + 1))
                    .await;
            }
        }

        if !last {
            sleep(settings.delay).await;
        }
    }

    let summary = report.summary();
    let edited = match progress {
        Some(progress) => out.port().edit_text(progress, &summary).await.is_ok(),
        None => false,
    };
    if !edited {
        if let Err(e) = out.send_plain(report_to, &summary).await {
            tracing::warn!(error = %e, "could not deliver broadcast summary");
        }
    }

    tracing::info!(
        success = report.success,
        failed = report.failed,
        total = report.total,
        "broadcast finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{messaging::types::TextFormat, testing::FakeMessenger};
    use std::sync::Arc;
    use tokio::time::Instant;

    const OWNER: ChatId = ChatId(1);

    fn users(n: i64) -> Vec<UserId> {
        (10..10 + n).map(UserId).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn all_successful_sends_are_tallied() {
        let fake = Arc::new(FakeMessenger::new());
        let out = Outbound::new(fake.clone());
        let start = Instant::now();

        let report = run(&out, &users(3), OWNER, "hello <all>", BroadcastSettings::default()).await;

        assert_eq!(
            report,
            BroadcastReport {
                success: 3,
                failed: 0,
                total: 3
            }
        );
        for u in users(3) {
            let sent = fake.texts_to(u.private_chat());
            assert_eq!(sent, vec!["📢 <b>hello &lt;all&gt;</b>"]);
        }
        assert!(start.elapsed() >= Duration::from_millis(400));

        let edits = fake.edits();
        let last = edits.last().unwrap();
        assert!(last.1.contains("✅ Success: 3"));
        assert!(last.1.contains("📱 Total: 3"));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_counted_and_rich_fallback_is_used() {
        let fake = Arc::new(FakeMessenger::new());
        fake.fail_chat(ChatId(11));
        let out = Outbound::new(fake.clone());

        let report = run(&out, &users(3), OWNER, "x", BroadcastSettings::default()).await;
        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total, 3);

        fake.heal_chat(ChatId(11));
        fake.fail_html();
        let report = run(&out, &users(1), OWNER, "x", BroadcastSettings::default()).await;
        assert_eq!(report.success, 1);
        let to_user = fake
            .sent_texts()
            .into_iter()
            .filter(|s| s.chat_id == ChatId(10))
            .last()
            .unwrap();
        assert_eq!(to_user.format, TextFormat::Plain);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_edited_every_n_attempts_and_on_the_last() {
        let fake = Arc::new(FakeMessenger::new());
        let out = Outbound::new(fake.clone());

        run(&out, &users(7), OWNER, "x", BroadcastSettings::default()).await;

        let progress: Vec<String> = fake
            .edits()
            .into_iter()
            .map(|(_, t)| t)
            .filter(|t| t.starts_with("🔄"))
            .collect();
        assert_eq!(
            progress,
            vec![
                "🔄 Broadcasting... 1/7 users",
                "🔄 Broadcasting... 6/7 users",
                "🔄 Broadcasting... 7/7 users",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_edits_fall_back_to_a_summary_message() {
        let fake = Arc::new(FakeMessenger::new());
        fake.fail_edits();
        let out = Outbound::new(fake.clone());

        let report = run(&out, &users(2), OWNER, "x", BroadcastSettings::default()).await;
        assert_eq!(report.success, 2);

        let owner_texts = fake.texts_to(OWNER);
        assert_eq!(owner_texts.len(), 2);
        assert!(owner_texts[1].starts_with("📊 Broadcast Complete"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_registry_reports_zero() {
        let fake = Arc::new(FakeMessenger::new());
        let out = Outbound::new(fake.clone());

        let report = run(&out, &[], OWNER, "x", BroadcastSettings::default()).await;
        assert_eq!(report, BroadcastReport::default());
        assert!(fake.edits()[0].1.contains("📱 Total: 0"));
    }
}
