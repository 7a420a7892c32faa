use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use nudge_api_structs::delete_entity::*;
use nudge_domain::{EntityType, ID};
use nudge_infra::NudgeContext;
use tracing::info;

pub async fn delete_entity_controller(
    path: web::Path<PathParams>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let path = path.into_inner();
    let usecase = DeleteEntityUseCase {
        entity_id: path.entity_id,
        entity_type: path.entity_type,
    };

    execute(usecase, &ctx)
        .await
        .map(|deleted_reminders| HttpResponse::Ok().json(APIResponse { deleted_reminders }))
        .map_err(NudgeError::from)
}

/// Called by the service owning a task or habit when it is deleted. Forgets
/// the entity and removes all of its reminders, also when the entity was
/// never synced.
#[derive(Debug)]
pub struct DeleteEntityUseCase {
    pub entity_id: ID,
    pub entity_type: EntityType,
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
impl UseCase for DeleteEntityUseCase {
    /// Number of deleted reminders
    type Response = i64;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteEntity";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .tracked_entities
            .delete(&self.entity_id, self.entity_type)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let res = ctx
            .repos
            .reminders
            .delete_by_entity(&self.entity_id, self.entity_type)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        info!(
            "Deleted {} reminders of {}: {}",
            res.deleted_count, self.entity_type, self.entity_id
        );

        Ok(res.deleted_count)
    }
}
