use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use nudge_api_structs::delete_reminder::*;
use nudge_domain::{Reminder, ID};
use nudge_infra::NudgeContext;

pub async fn delete_reminder_controller(
    path: web::Path<PathParams>,
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let usecase = DeleteReminderUseCase {
        reminder_id: path.reminder_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(NudgeError::from)
}

#[derive(Debug)]
pub struct DeleteReminderUseCase {
    pub reminder_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(reminder_id) => Self::NotFound(format!(
                "The reminder with id: {}, was not found.",
                reminder_id
            )),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteReminder";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        match ctx.repos.reminders.delete(&self.reminder_id).await {
            Some(reminder) => Ok(reminder),
            None => Err(UseCaseError::NotFound(self.reminder_id.clone())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_utils::{recurring_reminder, setup_context, TestContext};
    use chrono::Weekday;

    #[actix_web::test]
    async fn deletes_reminder_once() {
        let TestContext { ctx, .. } = setup_context(0);
        let reminder = recurring_reminder(&ID::default(), "09:00", vec![Weekday::Fri]);
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let mut usecase = DeleteReminderUseCase {
            reminder_id: reminder.id.clone(),
        };
        assert_eq!(usecase.execute(&ctx).await.unwrap().id, reminder.id);
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::NotFound(reminder.id.clone())
        );
        assert!(ctx.repos.reminders.find(&reminder.id).await.is_none());
    }
}
