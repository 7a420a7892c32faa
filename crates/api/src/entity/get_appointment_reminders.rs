use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use nudge_api_structs::dtos::AppointmentRemindersDTO;
use nudge_api_structs::get_appointment_reminders::*;
use nudge_domain::{AppointmentReminders, EntityType, ID};
use nudge_infra::NudgeContext;

pub async fn get_appointment_reminders_controller(
    path: web::Path<PathParams>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let path = path.into_inner();
    let usecase = GetAppointmentRemindersUseCase {
        entity_id: path.entity_id,
        entity_type: path.entity_type,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminders| {
            HttpResponse::Ok().json(APIResponse {
                appointment_reminders: reminders.map(AppointmentRemindersDTO::new),
            })
        })
        .map_err(NudgeError::from)
}

/// Derives the prepare and urgent reminders of an appointment. Nothing is
/// stored, they are computed from the latest synced entity on every read.
#[derive(Debug)]
pub struct GetAppointmentRemindersUseCase {
    pub entity_id: ID,
    pub entity_type: EntityType,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(EntityType, ID),
    NonexistentLocalTime,
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(entity_type, entity_id) => Self::NotFound(format!(
                "The {} with id: {}, was not found.",
                entity_type, entity_id
            )),
            UseCaseError::NonexistentLocalTime => Self::BadClientData(
                "The appointment time does not exist in the configured timezone".into(),
            ),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetAppointmentRemindersUseCase {
    type Response = Option<AppointmentReminders>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetAppointmentReminders";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let entity = match ctx
            .repos
            .tracked_entities
            .find(&self.entity_id, self.entity_type)
            .await
        {
            Some(entity) => entity,
            None => {
                return Err(UseCaseError::NotFound(
                    self.entity_type,
                    self.entity_id.clone(),
                ))
            }
        };

        match entity.appointment {
            Some(appointment) => appointment
                .reminders(&ctx.config.timezone)
                .map(Some)
                .ok_or(UseCaseError::NonexistentLocalTime),
            None => Ok(None),
        }
    }
}
