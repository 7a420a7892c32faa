use super::IPushSubscriptionRepo;
use crate::repos::shared::inmemory_repo::*;
use nudge_domain::{PushSubscription, ID};

pub struct InMemoryPushSubscriptionRepo {
    subscriptions: std::sync::Mutex<Vec<PushSubscription>>,
}

impl InMemoryPushSubscriptionRepo {
    pub fn new() -> Self {
        Self {
            subscriptions: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IPushSubscriptionRepo for InMemoryPushSubscriptionRepo {
    async fn find_by_user(&self, user_id: &ID) -> Vec<PushSubscription> {
        find_by(&self.subscriptions, |s| s.user_id == *user_id)
    }

    async fn delete(&self, subscription_id: &ID) -> Option<PushSubscription> {
        delete(subscription_id, &self.subscriptions)
    }
}
