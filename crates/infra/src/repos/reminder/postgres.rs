use super::{ActiveLimit, IReminderRepo, ReminderCompletion};
use crate::repos::shared::repo::DeleteResult;
use chrono::NaiveDate;
use nudge_domain::{
    weekday_from_index, weekday_to_index, Channel, EntityType, Reminder, ReminderInterval,
    ReminderKind, TimeOfDay, ID, MAX_REMINDERS_PER_ENTITY,
};
use sqlx::{types::Uuid, FromRow, PgConnection, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    user_uid: Uuid,
    entity_uid: Uuid,
    entity_type: String,
    kind: String,
    scheduled_time: Option<String>,
    reminder_date: Option<NaiveDate>,
    days_of_week: Vec<i16>,
    minutes_before: Option<i64>,
    interval_minutes: Option<i32>,
    interval_start: Option<String>,
    interval_end: Option<String>,
    notification_types: Vec<String>,
    message: Option<String>,
    is_active: bool,
    next_scheduled_at: Option<i64>,
    last_attempt_at: Option<i64>,
    last_success_at: Option<i64>,
    version: i64,
    created: i64,
    updated: i64,
}

impl TryFrom<ReminderRaw> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderRaw) -> anyhow::Result<Self> {
        let interval = match (raw.interval_minutes, raw.interval_start, raw.interval_end) {
            (Some(minutes), Some(start), Some(end)) => Some(ReminderInterval {
                minutes: u32::try_from(minutes)?,
                start_time: start.parse::<TimeOfDay>()?,
                end_time: end.parse::<TimeOfDay>()?,
            }),
            _ => None,
        };
        let days_of_week = raw
            .days_of_week
            .into_iter()
            .map(|day| {
                u8::try_from(day)
                    .ok()
                    .and_then(weekday_from_index)
                    .ok_or_else(|| anyhow::anyhow!("Invalid weekday index: {}", day))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let notification_types = raw
            .notification_types
            .iter()
            .map(|channel| channel.parse::<Channel>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Reminder {
            id: raw.reminder_uid.into(),
            user_id: raw.user_uid.into(),
            entity_id: raw.entity_uid.into(),
            entity_type: raw.entity_type.parse::<EntityType>()?,
            kind: raw.kind.parse::<ReminderKind>()?,
            scheduled_time: raw
                .scheduled_time
                .map(|t| t.parse::<TimeOfDay>())
                .transpose()?,
            reminder_date: raw.reminder_date,
            days_of_week,
            minutes_before: raw.minutes_before,
            interval,
            notification_types,
            message: raw.message,
            is_active: raw.is_active,
            next_scheduled_at: raw.next_scheduled_at,
            last_attempt_at: raw.last_attempt_at,
            last_success_at: raw.last_success_at,
            version: raw.version,
            created: raw.created,
            updated: raw.updated,
        })
    }
}

fn into_reminders(rows: Vec<ReminderRaw>) -> Vec<Reminder> {
    rows.into_iter()
        .filter_map(|raw| {
            let reminder_uid = raw.reminder_uid;
            match Reminder::try_from(raw) {
                Ok(reminder) => Some(reminder),
                Err(e) => {
                    error!("Unable to read reminder {}. Err: {:?}", reminder_uid, e);
                    None
                }
            }
        })
        .collect()
}

/// Column values of a `Reminder` that have no direct sql type
struct ReminderParams {
    scheduled_time: Option<String>,
    days_of_week: Vec<i16>,
    interval_minutes: Option<i32>,
    interval_start: Option<String>,
    interval_end: Option<String>,
    notification_types: Vec<String>,
}

impl ReminderParams {
    fn new(reminder: &Reminder) -> Self {
        Self {
            scheduled_time: reminder.scheduled_time.map(|t| t.to_string()),
            days_of_week: reminder
                .days_of_week
                .iter()
                .map(|day| i16::from(weekday_to_index(*day)))
                .collect(),
            interval_minutes: reminder.interval.map(|i| i.minutes as i32),
            interval_start: reminder.interval.map(|i| i.start_time.to_string()),
            interval_end: reminder.interval.map(|i| i.end_time.to_string()),
            notification_types: reminder
                .notification_types
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

async fn insert_row(conn: &mut PgConnection, reminder: &Reminder) -> anyhow::Result<()> {
    let params = ReminderParams::new(reminder);
    sqlx::query(
        r#"
        INSERT INTO reminders
        (reminder_uid, user_uid, entity_uid, entity_type, kind, scheduled_time, reminder_date,
        days_of_week, minutes_before, interval_minutes, interval_start, interval_end,
        notification_types, message, is_active, next_scheduled_at, last_attempt_at,
        last_success_at, version, created, updated)
        VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
        "#,
    )
    .bind(reminder.id.inner_ref())
    .bind(reminder.user_id.inner_ref())
    .bind(reminder.entity_id.inner_ref())
    .bind(reminder.entity_type.as_str())
    .bind(reminder.kind.as_str())
    .bind(params.scheduled_time)
    .bind(reminder.reminder_date)
    .bind(params.days_of_week)
    .bind(reminder.minutes_before)
    .bind(params.interval_minutes)
    .bind(params.interval_start)
    .bind(params.interval_end)
    .bind(params.notification_types)
    .bind(&reminder.message)
    .bind(reminder.is_active)
    .bind(reminder.next_scheduled_at)
    .bind(reminder.last_attempt_at)
    .bind(reminder.last_success_at)
    .bind(reminder.version)
    .bind(reminder.created)
    .bind(reminder.updated)
    .execute(conn)
    .await?;

    Ok(())
}

/// Compare-and-set on `version`, `None` when the stored version differs
async fn update_row(
    conn: &mut PgConnection,
    reminder: &Reminder,
) -> anyhow::Result<Option<Reminder>> {
    let params = ReminderParams::new(reminder);
    let row = sqlx::query_as::<_, ReminderRaw>(
        r#"
        UPDATE reminders SET
            kind = $3,
            scheduled_time = $4,
            reminder_date = $5,
            days_of_week = $6,
            minutes_before = $7,
            interval_minutes = $8,
            interval_start = $9,
            interval_end = $10,
            notification_types = $11,
            message = $12,
            is_active = $13,
            next_scheduled_at = $14,
            last_attempt_at = $15,
            last_success_at = $16,
            updated = $17,
            version = version + 1
        WHERE reminder_uid = $1 AND version = $2
        RETURNING *
        "#,
    )
    .bind(reminder.id.inner_ref())
    .bind(reminder.version)
    .bind(reminder.kind.as_str())
    .bind(params.scheduled_time)
    .bind(reminder.reminder_date)
    .bind(params.days_of_week)
    .bind(reminder.minutes_before)
    .bind(params.interval_minutes)
    .bind(params.interval_start)
    .bind(params.interval_end)
    .bind(params.notification_types)
    .bind(&reminder.message)
    .bind(reminder.is_active)
    .bind(reminder.next_scheduled_at)
    .bind(reminder.last_attempt_at)
    .bind(reminder.last_success_at)
    .bind(reminder.updated)
    .fetch_optional(conn)
    .await?;

    row.map(Reminder::try_from).transpose()
}

/// Serializes activations per entity and per user for the rest of the
/// transaction, then reports the limit `reminder` would exceed
async fn exceeded_limit(
    conn: &mut PgConnection,
    reminder: &Reminder,
    max_per_user: usize,
) -> anyhow::Result<Option<ActiveLimit>> {
    // Always entity before user
    sqlx::query("SELECT pg_advisory_xact_lock(1, hashtext($1))")
        .bind(format!("{}:{}", reminder.entity_type, reminder.entity_id))
        .execute(&mut *conn)
        .await?;
    sqlx::query("SELECT pg_advisory_xact_lock(2, hashtext($1))")
        .bind(reminder.user_id.to_string())
        .execute(&mut *conn)
        .await?;

    let entity_active = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM reminders AS r
        WHERE r.entity_uid = $1 AND r.entity_type = $2 AND r.is_active AND r.reminder_uid <> $3
        "#,
    )
    .bind(reminder.entity_id.inner_ref())
    .bind(reminder.entity_type.as_str())
    .bind(reminder.id.inner_ref())
    .fetch_one(&mut *conn)
    .await?;
    if entity_active as usize >= MAX_REMINDERS_PER_ENTITY {
        return Ok(Some(ActiveLimit::PerEntity));
    }

    let user_active = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM reminders AS r
        WHERE r.user_uid = $1 AND r.is_active AND r.reminder_uid <> $2
        "#,
    )
    .bind(reminder.user_id.inner_ref())
    .bind(reminder.id.inner_ref())
    .fetch_one(&mut *conn)
    .await?;
    if user_active as usize >= max_per_user {
        return Ok(Some(ActiveLimit::PerUser));
    }

    Ok(None)
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_row(&mut conn, reminder).await
    }

    async fn insert_active(
        &self,
        reminder: &Reminder,
        max_per_user: usize,
    ) -> anyhow::Result<Result<(), ActiveLimit>> {
        let mut tx = self.pool.begin().await?;
        if let Some(limit) = exceeded_limit(&mut tx, reminder, max_per_user).await? {
            tx.rollback().await?;
            return Ok(Err(limit));
        }
        insert_row(&mut tx, reminder).await?;
        tx.commit().await?;
        Ok(Ok(()))
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<Option<Reminder>> {
        let mut conn = self.pool.acquire().await?;
        update_row(&mut conn, reminder).await
    }

    async fn save_active(
        &self,
        reminder: &Reminder,
        max_per_user: usize,
    ) -> anyhow::Result<Result<Option<Reminder>, ActiveLimit>> {
        let mut tx = self.pool.begin().await?;
        if let Some(limit) = exceeded_limit(&mut tx, reminder, max_per_user).await? {
            tx.rollback().await?;
            return Ok(Err(limit));
        }
        let saved = update_row(&mut tx, reminder).await?;
        tx.commit().await?;
        Ok(Ok(saved))
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        let row = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()??;

        into_reminders(vec![row]).pop()
    }

    async fn find_by_entity(
        &self,
        entity_id: &ID,
        entity_type: EntityType,
    ) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.entity_uid = $1 AND r.entity_type = $2
            ORDER BY r.created
            "#,
        )
        .bind(entity_id.inner_ref())
        .bind(entity_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(into_reminders(rows))
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        let row = sqlx::query_as::<_, ReminderRaw>(
            r#"
            DELETE FROM reminders AS r
            WHERE r.reminder_uid = $1
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()??;

        into_reminders(vec![row]).pop()
    }

    async fn delete_by_entity(
        &self,
        entity_id: &ID,
        entity_type: EntityType,
    ) -> anyhow::Result<DeleteResult> {
        let res = sqlx::query(
            r#"
            DELETE FROM reminders AS r
            WHERE r.entity_uid = $1 AND r.entity_type = $2
            "#,
        )
        .bind(entity_id.inner_ref())
        .bind(entity_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(DeleteResult {
            deleted_count: res.rows_affected() as i64,
        })
    }

    async fn find_due(
        &self,
        now: i64,
        stale_before: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.is_active
                AND r.next_scheduled_at <= $1
                AND (r.last_attempt_at IS NULL
                    OR r.last_attempt_at < r.next_scheduled_at
                    OR r.last_attempt_at <= $2)
            ORDER BY r.next_scheduled_at
            LIMIT $3
            "#,
        )
        .bind(now)
        .bind(stale_before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_reminders(rows))
    }

    async fn claim(
        &self,
        reminder_id: &ID,
        version: i64,
        now: i64,
        stale_before: i64,
    ) -> anyhow::Result<Option<Reminder>> {
        let row = sqlx::query_as::<_, ReminderRaw>(
            r#"
            UPDATE reminders AS r SET
                last_attempt_at = $3,
                version = r.version + 1
            WHERE r.reminder_uid = $1
                AND r.version = $2
                AND r.is_active
                AND r.next_scheduled_at <= $3
                AND (r.last_attempt_at IS NULL
                    OR r.last_attempt_at < r.next_scheduled_at
                    OR r.last_attempt_at <= $4)
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(version)
        .bind(now)
        .bind(stale_before)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Reminder::try_from).transpose()
    }

    async fn complete(&self, completion: &ReminderCompletion) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminders AS r SET
                next_scheduled_at = $3,
                last_attempt_at = $4,
                last_success_at = COALESCE($5, r.last_success_at),
                is_active = r.is_active AND NOT $6,
                updated = $7,
                version = r.version + 1
            WHERE r.reminder_uid = $1 AND r.version = $2
            "#,
        )
        .bind(completion.reminder_id.inner_ref())
        .bind(completion.claimed_version)
        .bind(completion.next_scheduled_at)
        .bind(completion.last_attempt_at)
        .bind(completion.last_success_at)
        .bind(completion.deactivate)
        .bind(completion.updated)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn find_upcoming(&self, limit: usize) -> Vec<Reminder> {
        let rows = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.is_active AND r.next_scheduled_at IS NOT NULL
            ORDER BY r.next_scheduled_at
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default();

        into_reminders(rows)
    }

    async fn delete_stale(&self, updated_before: i64) -> anyhow::Result<DeleteResult> {
        let res = sqlx::query(
            r#"
            DELETE FROM reminders AS r
            WHERE (NOT r.is_active OR r.next_scheduled_at IS NULL)
                AND r.updated < $1
            "#,
        )
        .bind(updated_before)
        .execute(&self.pool)
        .await?;

        Ok(DeleteResult {
            deleted_count: res.rows_affected() as i64,
        })
    }
}
