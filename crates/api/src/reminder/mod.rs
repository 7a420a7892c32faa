mod create_reminder;
mod delete_reminder;
mod get_reminder;
mod get_upcoming_reminders;
mod update_reminder;

use actix_web::web;
use create_reminder::create_reminder_controller;
use delete_reminder::delete_reminder_controller;
use get_reminder::get_reminder_controller;
use get_upcoming_reminders::get_upcoming_reminders_controller;
use nudge_domain::Reminder;
use nudge_infra::{ActiveLimit, NudgeContext};
use update_reminder::update_reminder_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/reminders", web::post().to(create_reminder_controller));
    cfg.route(
        "/reminders/upcoming",
        web::get().to(get_upcoming_reminders_controller),
    );
    cfg.route(
        "/reminders/{reminder_id}",
        web::get().to(get_reminder_controller),
    );
    cfg.route(
        "/reminders/{reminder_id}",
        web::put().to(update_reminder_controller),
    );
    cfg.route(
        "/reminders/{reminder_id}",
        web::delete().to(delete_reminder_controller),
    );
}

#[derive(Debug, PartialEq)]
pub enum ReminderWriteError {
    EntityLimitReached,
    UserLimitReached(usize),
    StorageError,
}

impl ReminderWriteError {
    fn from_limit(limit: ActiveLimit, ctx: &NudgeContext) -> Self {
        match limit {
            ActiveLimit::PerEntity => Self::EntityLimitReached,
            ActiveLimit::PerUser => {
                Self::UserLimitReached(ctx.config.max_active_reminders_per_user)
            }
        }
    }
}

/// Stores a new `reminder`. An active one is only stored while the per
/// entity and per user limits allow it.
pub async fn insert_reminder(
    reminder: &Reminder,
    ctx: &NudgeContext,
) -> Result<(), ReminderWriteError> {
    let repo = &ctx.repos.reminders;
    if !reminder.is_active {
        return repo
            .insert(reminder)
            .await
            .map_err(|_| ReminderWriteError::StorageError);
    }
    match repo
        .insert_active(reminder, ctx.config.max_active_reminders_per_user)
        .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(limit)) => Err(ReminderWriteError::from_limit(limit, ctx)),
        Err(_) => Err(ReminderWriteError::StorageError),
    }
}

/// Version checked write of `reminder`, `None` when it was modified in the
/// meantime. The limits are checked when `activates` is set.
pub async fn save_reminder(
    reminder: &Reminder,
    activates: bool,
    ctx: &NudgeContext,
) -> Result<Option<Reminder>, ReminderWriteError> {
    let repo = &ctx.repos.reminders;
    if !activates {
        return repo
            .save(reminder)
            .await
            .map_err(|_| ReminderWriteError::StorageError);
    }
    match repo
        .save_active(reminder, ctx.config.max_active_reminders_per_user)
        .await
    {
        Ok(Ok(saved)) => Ok(saved),
        Ok(Err(limit)) => Err(ReminderWriteError::from_limit(limit, ctx)),
        Err(_) => Err(ReminderWriteError::StorageError),
    }
}
