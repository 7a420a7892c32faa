use super::{insert_reminder, ReminderWriteError};
use crate::error::NudgeError;
use crate::shared::{
    schedule::{compute_next_trigger, parse_days_of_week},
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use nudge_api_structs::create_reminder::*;
use nudge_api_structs::dtos::IntervalFields;
use nudge_domain::{
    Channel, EntityType, Reminder, ReminderKind, ReminderValidationError,
    TimeOfDay, ID, MAX_REMINDERS_PER_ENTITY,
};
use nudge_infra::NudgeContext;

pub async fn create_reminder_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let body = body.0;
    let usecase = CreateReminderUseCase {
        user_id: body.user_id,
        entity_id: body.entity_id,
        entity_type: body.entity_type,
        kind: body.kind,
        scheduled_time: body.scheduled_time,
        reminder_date: body.reminder_date,
        days_of_week: body.days_of_week,
        minutes_before: body.minutes_before,
        interval: body.interval,
        notification_types: body.notification_types,
        message: body.message,
        is_active: body.is_active.unwrap_or(true),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Created().json(APIResponse::new(reminder)))
        .map_err(NudgeError::from)
}

#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub user_id: ID,
    pub entity_id: ID,
    pub entity_type: EntityType,
    pub kind: ReminderKind,
    pub scheduled_time: Option<TimeOfDay>,
    pub reminder_date: Option<NaiveDate>,
    pub days_of_week: Vec<u8>,
    pub minutes_before: Option<i64>,
    pub interval: IntervalFields,
    pub notification_types: Vec<Channel>,
    pub message: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
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
impl UseCase for CreateReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateReminder";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let days_of_week =
            parse_days_of_week(&self.days_of_week).map_err(UseCaseError::InvalidDayOfWeek)?;
        let interval = self
            .interval
            .merge(None)
            .map_err(|missing| UseCaseError::MissingIntervalField(missing.0))?;

        let now = ctx.sys.get_timestamp_millis();
        let mut reminder = Reminder {
            id: Default::default(),
            user_id: self.user_id.clone(),
            entity_id: self.entity_id.clone(),
            entity_type: self.entity_type,
            kind: self.kind,
            scheduled_time: self.scheduled_time,
            reminder_date: self.reminder_date,
            days_of_week,
            minutes_before: self.minutes_before,
            interval,
            notification_types: self.notification_types.clone(),
            message: self.message.clone(),
            is_active: self.is_active,
            next_scheduled_at: None,
            last_attempt_at: None,
            last_success_at: None,
            version: 0,
            created: now,
            updated: now,
        };
        reminder.normalize();
        reminder.validate().map_err(UseCaseError::InvalidReminder)?;

        reminder.next_scheduled_at = compute_next_trigger(&reminder, now, ctx).await;
        if reminder.is_active
            && reminder.kind == ReminderKind::Single
            && reminder.next_scheduled_at.is_none()
        {
            return Err(UseCaseError::OccurrenceInPast);
        }

        insert_reminder(&reminder, ctx).await?;

        Ok(reminder)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_utils::{setup_context, utc_millis, TestContext};
    use nudge_domain::ReminderInterval;

    fn usecase(entity_id: &ID) -> CreateReminderUseCase {
        CreateReminderUseCase {
            user_id: Default::default(),
            entity_id: entity_id.clone(),
            entity_type: EntityType::Habit,
            kind: ReminderKind::Recurring,
            scheduled_time: Some("09:00".parse().unwrap()),
            reminder_date: None,
            days_of_week: vec![1, 3, 5],
            minutes_before: None,
            interval: Default::default(),
            notification_types: vec![Channel::Push],
            message: None,
            is_active: true,
        }
    }

    #[actix_web::test]
    async fn creates_recurring_reminder() {
        // Monday
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let entity_id = ID::default();

        let mut usecase = usecase(&entity_id);
        usecase.days_of_week = vec![5, 1, 3, 1];
        let reminder = usecase.execute(&ctx).await.unwrap();

        assert_eq!(reminder.days_of_week.len(), 3);
        // Wednesday
        assert_eq!(reminder.next_scheduled_at, Some(utc_millis(2021, 5, 5, 9, 0)));
        assert!(ctx.repos.reminders.find(&reminder.id).await.is_some());
    }

    #[actix_web::test]
    async fn creates_reminder_with_interval() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 10));
        let mut usecase = usecase(&ID::default());
        usecase.interval = IntervalFields {
            interval_enabled: Some(true),
            interval_minutes: Some(60),
            interval_start_time: Some("09:00".parse().unwrap()),
            interval_end_time: Some("18:00".parse().unwrap()),
        };

        let reminder = usecase.execute(&ctx).await.unwrap();
        assert_eq!(
            reminder.interval,
            Some(ReminderInterval {
                minutes: 60,
                start_time: "09:00".parse().unwrap(),
                end_time: "18:00".parse().unwrap(),
            })
        );
        assert_eq!(reminder.next_scheduled_at, Some(utc_millis(2021, 5, 3, 11, 0)));
    }

    #[actix_web::test]
    async fn rejects_sixth_active_reminder_for_entity() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let entity_id = ID::default();
        for _ in 0..MAX_REMINDERS_PER_ENTITY {
            assert!(usecase(&entity_id).execute(&ctx).await.is_ok());
        }

        let res = usecase(&entity_id).execute(&ctx).await;
        assert_eq!(res.unwrap_err(), UseCaseError::EntityLimitReached);
        assert_eq!(
            ctx.repos
                .reminders
                .find_by_entity(&entity_id, EntityType::Habit)
                .await
                .unwrap()
                .len(),
            MAX_REMINDERS_PER_ENTITY
        );

        // Inactive reminders are not counted
        let mut inactive = usecase(&entity_id);
        inactive.is_active = false;
        assert!(inactive.execute(&ctx).await.is_ok());
    }

    #[actix_web::test]
    async fn concurrent_creates_respect_the_entity_limit() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let entity_id = ID::default();
        for _ in 0..MAX_REMINDERS_PER_ENTITY - 1 {
            assert!(usecase(&entity_id).execute(&ctx).await.is_ok());
        }

        let mut first = usecase(&entity_id);
        let mut second = usecase(&entity_id);
        let (first, second) = futures::join!(first.execute(&ctx), second.execute(&ctx));
        let mut results = vec![first.map(|_| ()), second.map(|_| ())];
        results.sort_by_key(|r| r.is_err());
        assert_eq!(
            results,
            vec![Ok(()), Err(UseCaseError::EntityLimitReached)]
        );
        assert_eq!(
            ctx.repos
                .reminders
                .find_by_entity(&entity_id, EntityType::Habit)
                .await
                .unwrap()
                .len(),
            MAX_REMINDERS_PER_ENTITY
        );
    }

    #[actix_web::test]
    async fn rejects_reminders_beyond_user_limit() {
        let TestContext { mut ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        ctx.config.max_active_reminders_per_user = 2;
        let user_id = ID::default();
        for _ in 0..2 {
            let mut usecase = usecase(&ID::default());
            usecase.user_id = user_id.clone();
            assert!(usecase.execute(&ctx).await.is_ok());
        }

        let mut usecase = usecase(&ID::default());
        usecase.user_id = user_id;
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::UserLimitReached(2)
        );
    }

    #[actix_web::test]
    async fn rejects_invalid_reminders() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));
        let entity_id = ID::default();

        let mut no_channels = usecase(&entity_id);
        no_channels.notification_types = vec![];
        assert_eq!(
            no_channels.execute(&ctx).await.unwrap_err(),
            UseCaseError::InvalidReminder(ReminderValidationError::EmptyNotificationTypes)
        );

        let mut no_days = usecase(&entity_id);
        no_days.days_of_week = vec![];
        assert_eq!(
            no_days.execute(&ctx).await.unwrap_err(),
            UseCaseError::InvalidReminder(ReminderValidationError::EmptyDaysOfWeek)
        );

        let mut invalid_day = usecase(&entity_id);
        invalid_day.days_of_week = vec![1, 7];
        assert_eq!(
            invalid_day.execute(&ctx).await.unwrap_err(),
            UseCaseError::InvalidDayOfWeek(7)
        );

        let mut reversed_window = usecase(&entity_id);
        reversed_window.interval = IntervalFields {
            interval_enabled: Some(true),
            interval_minutes: Some(30),
            interval_start_time: Some("18:00".parse().unwrap()),
            interval_end_time: Some("09:00".parse().unwrap()),
        };
        assert!(matches!(
            reversed_window.execute(&ctx).await.unwrap_err(),
            UseCaseError::InvalidReminder(ReminderValidationError::InvalidIntervalWindow { .. })
        ));

        let mut incomplete_interval = usecase(&entity_id);
        incomplete_interval.interval = IntervalFields {
            interval_minutes: Some(30),
            ..Default::default()
        };
        assert_eq!(
            incomplete_interval.execute(&ctx).await.unwrap_err(),
            UseCaseError::MissingIntervalField("intervalStartTime")
        );

        assert!(ctx
            .repos
            .reminders
            .find_by_entity(&entity_id, EntityType::Habit)
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_web::test]
    async fn rejects_single_reminder_in_the_past() {
        let TestContext { ctx, .. } = setup_context(utc_millis(2021, 5, 3, 10, 0));

        let mut past = usecase(&ID::default());
        past.kind = ReminderKind::Single;
        past.reminder_date = Some(NaiveDate::from_ymd_opt(2021, 5, 3).unwrap());
        assert_eq!(
            past.execute(&ctx).await.unwrap_err(),
            UseCaseError::OccurrenceInPast
        );

        let mut future = usecase(&ID::default());
        future.kind = ReminderKind::Single;
        future.reminder_date = Some(NaiveDate::from_ymd_opt(2021, 5, 4).unwrap());
        let reminder = future.execute(&ctx).await.unwrap();
        assert_eq!(reminder.next_scheduled_at, Some(utc_millis(2021, 5, 4, 9, 0)));
    }
}
