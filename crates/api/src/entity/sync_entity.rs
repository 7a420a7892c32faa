use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use nudge_api_structs::sync_entity::*;
use nudge_domain::{next_trigger, Appointment, Reminder, ReminderKind, TrackedEntity};
use nudge_infra::NudgeContext;
use tracing::warn;

pub async fn sync_entity_controller(
    path: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let path = path.into_inner();
    let body = body.0;
    let usecase = SyncEntityUseCase {
        entity: TrackedEntity {
            id: path.entity_id,
            entity_type: path.entity_type,
            user_id: body.user_id,
            due_at: body.due_at,
            appointment: body.appointment.map(|appointment| Appointment {
                date: appointment.date,
                time: appointment.time,
                preparation_minutes: appointment.preparation_minutes,
            }),
        },
    };

    execute(usecase, &ctx)
        .await
        .map(|reminders| HttpResponse::Ok().json(APIResponse::new(reminders)))
        .map_err(NudgeError::from)
}

/// Stores the latest state of a task or habit and reschedules the reminders
/// that depend on it
#[derive(Debug)]
pub struct SyncEntityUseCase {
    pub entity: TrackedEntity,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SyncEntityUseCase {
    /// The rescheduled reminders
    type Response = Vec<Reminder>;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncEntity";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .tracked_entities
            .save(&self.entity)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let now = ctx.sys.get_timestamp_millis();
        let reminders = ctx
            .repos
            .reminders
            .find_by_entity(&self.entity.id, self.entity.entity_type)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let mut rescheduled = Vec::new();
        // Single and recurring reminders only depend on their own fields
        for mut reminder in reminders
            .into_iter()
            .filter(|r| r.is_active && r.kind == ReminderKind::BeforeDue)
        {
            let next = next_trigger(&reminder, now, &ctx.config.timezone, self.entity.due_at);
            if next == reminder.next_scheduled_at {
                continue;
            }
            reminder.next_scheduled_at = next;
            reminder.updated = now;
            match ctx.repos.reminders.save(&reminder).await {
                Ok(Some(saved)) => rescheduled.push(saved),
                Ok(None) => warn!(
                    "Reminder: {} was modified while syncing {}: {}, skipping it",
                    reminder.id, self.entity.entity_type, self.entity.id
                ),
                Err(_) => return Err(UseCaseError::StorageError),
            }
        }

        Ok(rescheduled)
    }
}
