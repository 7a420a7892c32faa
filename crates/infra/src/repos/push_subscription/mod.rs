mod inmemory;
mod postgres;

pub use inmemory::InMemoryPushSubscriptionRepo;
use nudge_domain::{PushSubscription, ID};
pub use postgres::PostgresPushSubscriptionRepo;

/// Subscriptions are registered by the client facing services, this side
/// only reads them and drops the ones the gateway reports as gone.
#[async_trait::async_trait]
pub trait IPushSubscriptionRepo: Send + Sync {
    async fn find_by_user(&self, user_id: &ID) -> Vec<PushSubscription>;
    async fn delete(&self, subscription_id: &ID) -> Option<PushSubscription>;
}
