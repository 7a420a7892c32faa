use crate::shared::entity::{Entity, ID};

/// A browser push endpoint registered by a user. Registration is handled
/// elsewhere, reminders only read them to deliver push notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct PushSubscription {
    pub id: ID,
    pub user_id: ID,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created: i64,
}

impl Entity for PushSubscription {
    fn id(&self) -> &ID {
        &self.id
    }
}
