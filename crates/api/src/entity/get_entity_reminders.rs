use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use nudge_api_structs::get_entity_reminders::*;
use nudge_domain::{EntityType, Reminder, ID};
use nudge_infra::NudgeContext;

pub async fn get_entity_reminders_controller(
    path: web::Path<PathParams>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let path = path.into_inner();
    let usecase = GetEntityRemindersUseCase {
        entity_id: path.entity_id,
        entity_type: path.entity_type,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminders| HttpResponse::Ok().json(APIResponse::new(reminders)))
        .map_err(NudgeError::from)
}

#[derive(Debug)]
pub struct GetEntityRemindersUseCase {
    pub entity_id: ID,
    pub entity_type: EntityType,
}

#[derive(Debug)]
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
impl UseCase for GetEntityRemindersUseCase {
    type Response = Vec<Reminder>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetEntityReminders";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let mut reminders = ctx
            .repos
            .reminders
            .find_by_entity(&self.entity_id, self.entity_type)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        reminders.sort_by_key(|r| r.created);
        Ok(reminders)
    }
}
