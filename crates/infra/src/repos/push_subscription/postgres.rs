use super::IPushSubscriptionRepo;
use nudge_domain::{PushSubscription, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresPushSubscriptionRepo {
    pool: PgPool,
}

impl PostgresPushSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PushSubscriptionRaw {
    subscription_uid: Uuid,
    user_uid: Uuid,
    endpoint: String,
    p256dh: String,
    auth: String,
    created: i64,
}

impl From<PushSubscriptionRaw> for PushSubscription {
    fn from(raw: PushSubscriptionRaw) -> Self {
        Self {
            id: raw.subscription_uid.into(),
            user_id: raw.user_uid.into(),
            endpoint: raw.endpoint,
            p256dh: raw.p256dh,
            auth: raw.auth,
            created: raw.created,
        }
    }
}

#[async_trait::async_trait]
impl IPushSubscriptionRepo for PostgresPushSubscriptionRepo {
    async fn find_by_user(&self, user_id: &ID) -> Vec<PushSubscription> {
        sqlx::query_as::<_, PushSubscriptionRaw>(
            r#"
            SELECT * FROM push_subscriptions AS s
            WHERE s.user_uid = $1
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|raw| raw.into())
        .collect()
    }

    async fn delete(&self, subscription_id: &ID) -> Option<PushSubscription> {
        sqlx::query_as::<_, PushSubscriptionRaw>(
            r#"
            DELETE FROM push_subscriptions AS s
            WHERE s.subscription_uid = $1
            RETURNING *
            "#,
        )
        .bind(subscription_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()?
        .map(|raw| raw.into())
    }
}
