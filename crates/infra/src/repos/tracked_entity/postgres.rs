use super::ITrackedEntityRepo;
use chrono::NaiveDate;
use nudge_domain::{Appointment, EntityType, TimeOfDay, TrackedEntity, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresTrackedEntityRepo {
    pool: PgPool,
}

impl PostgresTrackedEntityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TrackedEntityRaw {
    entity_uid: Uuid,
    entity_type: String,
    user_uid: Uuid,
    due_at: Option<i64>,
    appointment_date: Option<NaiveDate>,
    appointment_time: Option<String>,
    preparation_minutes: Option<i64>,
}

impl TrackedEntityRaw {
    fn into_entity(self) -> anyhow::Result<TrackedEntity> {
        let appointment = match (self.appointment_date, self.appointment_time) {
            (Some(date), Some(time)) => Some(Appointment {
                date,
                time: time.parse::<TimeOfDay>()?,
                preparation_minutes: self.preparation_minutes,
            }),
            _ => None,
        };
        Ok(TrackedEntity {
            id: self.entity_uid.into(),
            entity_type: self.entity_type.parse::<EntityType>()?,
            user_id: self.user_uid.into(),
            due_at: self.due_at,
            appointment,
        })
    }
}

#[async_trait::async_trait]
impl ITrackedEntityRepo for PostgresTrackedEntityRepo {
    async fn save(&self, entity: &TrackedEntity) -> anyhow::Result<()> {
        let appointment = entity.appointment.as_ref();
        sqlx::query(
            r#"
            INSERT INTO tracked_entities
            (entity_uid, entity_type, user_uid, due_at, appointment_date, appointment_time, preparation_minutes)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (entity_uid, entity_type) DO UPDATE SET
                user_uid = EXCLUDED.user_uid,
                due_at = EXCLUDED.due_at,
                appointment_date = EXCLUDED.appointment_date,
                appointment_time = EXCLUDED.appointment_time,
                preparation_minutes = EXCLUDED.preparation_minutes
            "#,
        )
        .bind(entity.id.inner_ref())
        .bind(entity.entity_type.as_str())
        .bind(entity.user_id.inner_ref())
        .bind(entity.due_at)
        .bind(appointment.map(|a| a.date))
        .bind(appointment.map(|a| a.time.to_string()))
        .bind(appointment.and_then(|a| a.preparation_minutes))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, entity_id: &ID, entity_type: EntityType) -> Option<TrackedEntity> {
        let raw = sqlx::query_as::<_, TrackedEntityRaw>(
            r#"
            SELECT * FROM tracked_entities AS e
            WHERE e.entity_uid = $1 AND e.entity_type = $2
            "#,
        )
        .bind(entity_id.inner_ref())
        .bind(entity_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .ok()??;

        match raw.into_entity() {
            Ok(entity) => Some(entity),
            Err(e) => {
                error!("Unable to read tracked entity {}. Err: {:?}", entity_id, e);
                None
            }
        }
    }

    async fn delete(&self, entity_id: &ID, entity_type: EntityType) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM tracked_entities AS e
            WHERE e.entity_uid = $1 AND e.entity_type = $2
            "#,
        )
        .bind(entity_id.inner_ref())
        .bind(entity_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }
}
