use super::{save_reminder, ReminderWriteError};
use crate::error::NudgeError;
use crate::shared::{
    schedule::{compute_next_trigger, parse_days_of_week},
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use nudge_api_structs::dtos::IntervalFields;
use nudge_api_structs::update_reminder::*;
use nudge_domain::{
    Channel, Reminder, ReminderKind, ReminderValidationError, TimeOfDay, ID,
    MAX_REMINDERS_PER_ENTITY,
};
use nudge_infra::NudgeContext;

pub async fn update_reminder_controller(
    path: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let body = body.0;
    let usecase = UpdateReminderUseCase {
        reminder_id: path.reminder_id.clone(),
        kind: body.kind,
        scheduled_time: body.scheduled_time,
        reminder_date: body.reminder_date,
        days_of_week: body.days_of_week,
        minutes_before: body.minutes_before,
        interval: body.interval,
        notification_types: body.notification_types,
        message: body.message,
        is_active: body.is_active,
        version: body.version,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(NudgeError::from)
}

/// Partial update, fields left out keep their stored value
#[derive(Debug, Default)]
pub struct UpdateReminderUseCase {
    pub reminder_id: ID,
    pub kind: Option<ReminderKind>,
    pub scheduled_time: Option<TimeOfDay>,
    pub reminder_date: Option<NaiveDate>,
    pub days_of_week: Option<Vec<u8>>,
    pub minutes_before: Option<i64>,
    pub interval: IntervalFields,
    pub notification_types: Option<Vec<Channel>>,
    pub message: Option<String>,
    pub is_active: Option<bool>,
    pub version: Option<i64>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    VersionMismatch { expected: i64, actual: i64 },
    InvalidDayOfWeek(u8),
    MissingIntervalField(&'static str),
    InvalidReminder(ReminderValidationError),
    OccurrenceInPast,
    EntityLimitReached,
    UserLimitReached(usize),
    StorageError,
}

impl From<ReminderWriteError> for UseCaseError {
    fn from(e: ReminderWriteError) -> Self {
        match e {
            ReminderWriteError::EntityLimitReached => Self::EntityLimitReached,
            ReminderWriteError::UserLimitReached(max) => Self::UserLimitReached(max),
            ReminderWriteError::StorageError => Self::StorageError,
        }
    }
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(reminder_id) => Self::NotFound(format!(
                "The reminder with id: {}, was not found.",
                reminder_id
            )),
            UseCaseError::VersionMismatch { expected, actual } => Self::Conflict(format!(
                "The reminder was modified concurrently. Expected version: {}, found: {}",
                expected, actual
            )),
            UseCaseError::InvalidDayOfWeek(day) => Self::BadClientData(format!(
                "Invalid day of week: {}, expected a value between 0 (Sunday) and 6 (Saturday)",
                day
            )),
            UseCaseError::MissingIntervalField(field) => {
                Self::BadClientData(format!("The interval is missing the field: {}", field))
            }
            UseCaseError::InvalidReminder(e) => Self::BadClientData(e.to_string()),
            UseCaseError::OccurrenceInPast => {
                Self::BadClientData("The reminder would only fire in the past".into())
            }
            UseCaseError::EntityLimitReached => Self::Conflict(format!(
                "Maximum {} reminders per task or habit reached",
                MAX_REMINDERS_PER_ENTITY
            )),
            UseCaseError::UserLimitReached(max) => {
                Self::Conflict(format!("Maximum {} active reminders per user reached", max))
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateReminder";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let current = match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) => reminder,
            None => return Err(UseCaseError::NotFound(self.reminder_id.clone())),
        };
        if let Some(expected) = self.version {
            if expected != current.version {
                return Err(UseCaseError::VersionMismatch {
                    expected,
                    actual: current.version,
                });
            }
        }

        let mut reminder = current.clone();
        if let Some(kind) = self.kind {
            reminder.kind = kind;
        }
        if let Some(time) = self.scheduled_time {
            reminder.scheduled_time = Some(time);
        }
        if let Some(date) = self.reminder_date {
            reminder.reminder_date = Some(date);
        }
        if let Some(days) = &self.days_of_week {
            reminder.days_of_week =
                parse_days_of_week(days).map_err(UseCaseError::InvalidDayOfWeek)?;
        }
        if let Some(minutes) = self.minutes_before {
            reminder.minutes_before = Some(minutes);
        }
        reminder.interval = self
            .interval
            .merge(current.interval.as_ref())
            .map_err(|missing| UseCaseError::MissingIntervalField(missing.0))?;
        if let Some(channels) = &self.notification_types {
            reminder.notification_types = channels.clone();
        }
        if let Some(message) = &self.message {
            reminder.message = Some(message.clone());
        }
        if let Some(is_active) = self.is_active {
            reminder.is_active = is_active;
        }
        reminder.normalize();
        reminder.validate().map_err(UseCaseError::InvalidReminder)?;

        let now = ctx.sys.get_timestamp_millis();
        // Keeps an occurrence that is due but not yet picked up by a tick
        if !reminder.has_same_schedule(&current) {
            reminder.next_scheduled_at = compute_next_trigger(&reminder, now, ctx).await;
            if reminder.is_active
                && reminder.kind == ReminderKind::Single
                && reminder.next_scheduled_at.is_none()
            {
                return Err(UseCaseError::OccurrenceInPast);
            }
        }
        reminder.updated = now;

        let activates = reminder.is_active && !current.is_active;
        match save_reminder(&reminder, activates, ctx).await? {
            Some(saved) => Ok(saved),
            None => {
                let actual = ctx
                    .repos
                    .reminders
                    .find(&reminder.id)
                    .await
                    .map(|r| r.version)
                    .ok_or_else(|| UseCaseError::NotFound(reminder.id.clone()))?;
                Err(UseCaseError::VersionMismatch {
                    expected: reminder.version,
                    actual,
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_utils::{recurring_reminder, setup_context, utc_millis, TestContext};
    use chrono::Weekday;
    use nudge_domain::EntityType;

    #[actix_web::test]
    async fn updates_schedule_and_bumps_version() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let reminder = recurring_reminder(&ID::default(), "09:00", vec![Weekday::Mon]);
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let mut usecase = UpdateReminderUseCase {
            reminder_id: reminder.id.clone(),
            days_of_week: Some(vec![2]),
            scheduled_time: Some("07:30".parse().unwrap()),
            version: Some(reminder.version),
            ..Default::default()
        };
        let updated = usecase.execute(&ctx).await.unwrap();

        assert_eq!(updated.days_of_week, vec![Weekday::Tue]);
        assert_eq!(updated.version, reminder.version + 1);
        assert_eq!(updated.next_scheduled_at, Some(utc_millis(2021, 5, 4, 7, 30)));
        assert_eq!(updated.message, reminder.message);
    }

    #[actix_web::test]
    async fn content_edits_keep_a_due_occurrence() {
        // Monday, half a minute after the occurrence became due
        let due = utc_millis(2021, 5, 3, 9, 0);
        let TestContext { ctx, .. } = setup_context(due + 30 * 1000);
        let mut reminder = recurring_reminder(&ID::default(), "09:00", vec![Weekday::Mon]);
        reminder.next_scheduled_at = Some(due);
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let mut usecase = UpdateReminderUseCase {
            reminder_id: reminder.id.clone(),
            message: Some("Stretch your back".into()),
            notification_types: Some(vec![Channel::Email]),
            ..Default::default()
        };
        let updated = usecase.execute(&ctx).await.unwrap();
        assert_eq!(updated.message, Some("Stretch your back".into()));
        assert_eq!(updated.next_scheduled_at, Some(due));

        // Changing the time reschedules
        let mut usecase = UpdateReminderUseCase {
            reminder_id: reminder.id.clone(),
            scheduled_time: Some("09:30".parse().unwrap()),
            ..Default::default()
        };
        let updated = usecase.execute(&ctx).await.unwrap();
        assert_eq!(updated.next_scheduled_at, Some(utc_millis(2021, 5, 3, 9, 30)));
    }

    #[actix_web::test]
    async fn rejects_stale_versions() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let reminder = recurring_reminder(&ID::default(), "09:00", vec![Weekday::Mon]);
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let mut usecase = UpdateReminderUseCase {
            reminder_id: reminder.id.clone(),
            version: Some(reminder.version + 3),
            ..Default::default()
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::VersionMismatch {
                expected: reminder.version + 3,
                actual: reminder.version
            }
        );
    }

    #[actix_web::test]
    async fn deactivation_clears_next_trigger() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let reminder = recurring_reminder(&ID::default(), "09:00", vec![Weekday::Mon]);
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let mut usecase = UpdateReminderUseCase {
            reminder_id: reminder.id.clone(),
            is_active: Some(false),
            interval: IntervalFields {
                interval_enabled: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let updated = usecase.execute(&ctx).await.unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.next_scheduled_at, None);
    }

    #[actix_web::test]
    async fn reactivation_respects_entity_limit() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let entity_id = ID::default();
        for _ in 0..MAX_REMINDERS_PER_ENTITY {
            let reminder = recurring_reminder(&entity_id, "09:00", vec![Weekday::Mon]);
            ctx.repos.reminders.insert(&reminder).await.unwrap();
        }
        let mut inactive = recurring_reminder(&entity_id, "10:00", vec![Weekday::Mon]);
        inactive.is_active = false;
        ctx.repos.reminders.insert(&inactive).await.unwrap();

        let mut usecase = UpdateReminderUseCase {
            reminder_id: inactive.id.clone(),
            is_active: Some(true),
            ..Default::default()
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::EntityLimitReached
        );
        let stored = ctx.repos.reminders.find(&inactive.id).await.unwrap();
        assert!(!stored.is_active);
        assert_eq!(
            ctx.repos
                .reminders
                .find_by_entity(&entity_id, EntityType::Habit)
                .await
                .unwrap()
                .len(),
            MAX_REMINDERS_PER_ENTITY + 1
        );
    }

    #[actix_web::test]
    async fn returns_not_found_for_unknown_reminder() {
        let TestContext { ctx, .. } = setup_context(0);
        let reminder_id = ID::default();
        let mut usecase = UpdateReminderUseCase {
            reminder_id: reminder_id.clone(),
            ..Default::default()
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::NotFound(reminder_id)
        );
    }
}
