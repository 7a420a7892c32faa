use crate::shared::usecase::UseCase;
use nudge_infra::NudgeContext;
use tracing::info;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Deletes reminders that will not fire again and have not been touched
/// within the retention period
#[derive(Debug)]
pub struct DeleteStaleRemindersUseCase;

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteStaleRemindersUseCase {
    /// Number of deleted reminders
    type Response = i64;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteStaleReminders";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let updated_before =
            ctx.sys.get_timestamp_millis() - ctx.config.reminder_retention_days * DAY_MILLIS;
        let res = ctx
            .repos
            .reminders
            .delete_stale(updated_before)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if res.deleted_count > 0 {
            info!("Deleted {} stale reminders", res.deleted_count);
        }
        Ok(res.deleted_count)
    }
}
