use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use nudge_api_structs::get_upcoming_reminders::*;
use nudge_domain::Reminder;
use nudge_infra::NudgeContext;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

pub async fn get_upcoming_reminders_controller(
    query: web::Query<QueryParams>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let usecase = GetUpcomingRemindersUseCase {
        limit: query.limit.unwrap_or(DEFAULT_LIMIT),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminders| HttpResponse::Ok().json(APIResponse::new(reminders)))
        .map_err(NudgeError::from)
}

/// Active reminders ordered by when they fire next
#[derive(Debug)]
pub struct GetUpcomingRemindersUseCase {
    pub limit: usize,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidLimit(usize),
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidLimit(limit) => Self::BadClientData(format!(
                "The limit: {}, must be between 1 and {}",
                limit, MAX_LIMIT
            )),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetUpcomingRemindersUseCase {
    type Response = Vec<Reminder>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetUpcomingReminders";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(UseCaseError::InvalidLimit(self.limit));
        }
        Ok(ctx.repos.reminders.find_upcoming(self.limit).await)
    }
}
