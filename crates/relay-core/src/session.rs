use std::collections::{BTreeSet, HashMap};

use tokio::sync::Mutex;

use crate::domain::UserId;

/// Owner-to-target binding installed by the "Quick Reply" button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickReplySession {
    pub target_user_id: UserId,
    pub target_username: String,
}

/// Process-scoped relay state: the user registry and quick reply sessions.
///
/// Nothing is persisted; a restart forgets every user and session. The
/// registry only grows.
#[derive(Debug, Default)]
pub struct RelayState {
    users: Mutex<BTreeSet<UserId>>,
    quick_replies: Mutex<HashMap<UserId, QuickReplySession>>,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the user was not known before.
    pub async fn register_user(&self, user_id: UserId) -> bool {
        self.users.lock().await.insert(user_id)
    }

    pub async fn user_count(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_known(&self, user_id: UserId) -> bool {
        self.users.lock().await.contains(&user_id)
    }

    /// Fixed-order copy of the registry; later registrations do not affect it.
    pub async fn users_snapshot(&self) -> Vec<UserId> {
        self.users.lock().await.iter().copied().collect()
    }

    /// Install (or replace) the owner's quick reply session.
    pub async fn start_quick_reply(&self, owner: UserId, session: QuickReplySession) {
        self.quick_replies.lock().await.insert(owner, session);
    }

    pub async fn quick_reply(&self, owner: UserId) -> Option<QuickReplySession> {
        self.quick_replies.lock().await.get(&owner).cloned()
    }

    pub async fn end_quick_reply(&self, owner: UserId) -> Option<QuickReplySession> {
        self.quick_replies.lock().await.remove(&owner)
    }

    pub async fn active_quick_replies(&self) -> usize {
        self.quick_replies.lock().await.len()
    }
}
