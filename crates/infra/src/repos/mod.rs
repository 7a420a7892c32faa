mod push_subscription;
mod reminder;
mod shared;
mod tracked_entity;

pub use push_subscription::IPushSubscriptionRepo;
use push_subscription::{InMemoryPushSubscriptionRepo, PostgresPushSubscriptionRepo};
pub use reminder::{ActiveLimit, IReminderRepo, ReminderCompletion};
use reminder::{InMemoryReminderRepo, PostgresReminderRepo};
pub use shared::repo::DeleteResult;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
pub use tracked_entity::ITrackedEntityRepo;
use tracked_entity::{InMemoryTrackedEntityRepo, PostgresTrackedEntityRepo};

#[derive(Clone)]
pub struct Repos {
    pub reminders: Arc<dyn IReminderRepo>,
    pub tracked_entities: Arc<dyn ITrackedEntityRepo>,
    pub push_subscriptions: Arc<dyn IPushSubscriptionRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");

        info!("DB EXECUTING MIGRATION ...");
        sqlx::migrate!().run(&pool).await?;
        info!("DB EXECUTING MIGRATION ... [done]");

        Ok(Self {
            reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
            tracked_entities: Arc::new(PostgresTrackedEntityRepo::new(pool.clone())),
            push_subscriptions: Arc::new(PostgresPushSubscriptionRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            reminders: Arc::new(InMemoryReminderRepo::new()),
            tracked_entities: Arc::new(InMemoryTrackedEntityRepo::new()),
            push_subscriptions: Arc::new(InMemoryPushSubscriptionRepo::new()),
        }
    }
}
