use super::dispatcher::dispatch_reminder;
use crate::error::NudgeError;
use crate::shared::{
    schedule::entity_due_at,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use futures::future::join_all;
use nudge_api_structs::dtos::TickSummaryDTO;
use nudge_api_structs::run_scheduler::*;
use nudge_domain::{next_trigger_after, Reminder, ReminderKind};
use nudge_infra::{NudgeContext, ReminderCompletion, TickCounts};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const COMPLETION_ATTEMPTS: usize = 3;

pub async fn run_scheduler_controller(
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    execute(ProcessDueRemindersUseCase, &ctx)
        .await
        .map(|tick| {
            HttpResponse::Ok().json(APIResponse {
                tick: TickSummaryDTO {
                    ran_at: tick.ran_at,
                    selected: tick.selected,
                    delivered: tick.delivered,
                    failed: tick.failed,
                    skipped: tick.skipped,
                    errors: tick.errors,
                },
            })
        })
        .map_err(NudgeError::from)
}

/// One scheduler tick: selects the due reminders, claims them, dispatches
/// their notifications and computes when they fire next
#[derive(Debug)]
pub struct ProcessDueRemindersUseCase;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    pub ran_at: i64,
    pub selected: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Lost claims, reminders deactivated before dispatch and reminders
    /// handed back because no channel could start before the deadline
    pub skipped: usize,
    /// Reminders that failed with an unexpected error
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ReminderOutcome {
    Delivered,
    Failed,
    Skipped,
    Errored,
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
impl UseCase for ProcessDueRemindersUseCase {
    type Response = TickSummary;

    type Error = UseCaseError;

    const NAME: &'static str = "ProcessDueReminders";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let stale_before = now - ctx.config.reminder_claim_ttl_ms;
        ctx.stats.tick_started(now);

        let due = match ctx
            .repos
            .reminders
            .find_due(now, stale_before, ctx.config.scheduler_batch_size)
            .await
        {
            Ok(due) => due,
            Err(e) => {
                error!("Unable to select due reminders: {:?}", e);
                ctx.stats
                    .tick_finished(ctx.sys.get_timestamp_millis(), &TickCounts::default());
                return Err(UseCaseError::StorageError);
            }
        };

        let budget = Duration::from_millis(ctx.config.reminder_processing_timeout_ms);
        let deadline = Instant::now() + budget;
        let outcomes = join_all(due.iter().map(|reminder| async move {
            match process_reminder(reminder, now, stale_before, deadline, ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Unable to process reminder: {}, error: {:?}", reminder.id, e);
                    ReminderOutcome::Errored
                }
            }
        }))
        .await;

        let count = |wanted: ReminderOutcome| outcomes.iter().filter(|o| **o == wanted).count();
        let summary = TickSummary {
            ran_at: now,
            selected: due.len(),
            delivered: count(ReminderOutcome::Delivered),
            failed: count(ReminderOutcome::Failed),
            skipped: count(ReminderOutcome::Skipped),
            errors: count(ReminderOutcome::Errored),
        };
        ctx.stats.tick_finished(
            ctx.sys.get_timestamp_millis(),
            &TickCounts {
                processed: (summary.delivered + summary.failed + summary.errors) as u64,
                delivered: summary.delivered as u64,
                failed: (summary.failed + summary.errors) as u64,
                skipped: summary.skipped as u64,
            },
        );
        if summary.selected > 0 {
            info!("Scheduler tick finished: {:?}", summary);
        }

        Ok(summary)
    }
}

/// Dispatch stops at `deadline`, after that the outcome is always persisted
/// so an attempted occurrence is never sent again.
async fn process_reminder(
    reminder: &Reminder,
    now: i64,
    stale_before: i64,
    deadline: Instant,
    ctx: &NudgeContext,
) -> anyhow::Result<ReminderOutcome> {
    let claimed = match ctx
        .repos
        .reminders
        .claim(&reminder.id, reminder.version, now, stale_before)
        .await?
    {
        Some(claimed) => claimed,
        None => {
            debug!("Reminder: {} was claimed by someone else", reminder.id);
            return Ok(ReminderOutcome::Skipped);
        }
    };

    // The owner may have deactivated, rescheduled or deleted it since it was
    // selected. Other edits are picked up and sent.
    let claimed = match ctx.repos.reminders.find(&claimed.id).await {
        Some(current) if current.is_active && current.has_same_schedule(&claimed) => current,
        _ => {
            info!("Reminder: {} changed after it was claimed, skipping", claimed.id);
            return Ok(ReminderOutcome::Skipped);
        }
    };

    let fired_at = claimed.next_scheduled_at.unwrap_or(now);
    let report = dispatch_reminder(&claimed, fired_at, deadline, ctx).await;
    let finished_at = ctx.sys.get_timestamp_millis();

    if !report.is_attempted() {
        warn!(
            "No channel of reminder: {} could start before the deadline, handing it back",
            claimed.id
        );
        let completion = ReminderCompletion {
            reminder_id: claimed.id.clone(),
            claimed_version: claimed.version,
            next_scheduled_at: claimed.next_scheduled_at,
            last_attempt_at: reminder.last_attempt_at,
            last_success_at: None,
            deactivate: false,
            updated: finished_at,
        };
        persist_completion(completion, &claimed, ctx).await?;
        return Ok(ReminderOutcome::Skipped);
    }

    let last_attempt_at = report.last_attempt_at().unwrap_or(now);
    let due_at = entity_due_at(&claimed, ctx).await;
    let next_scheduled_at = next_trigger_after(
        &claimed,
        std::cmp::max(fired_at, last_attempt_at),
        finished_at,
        &ctx.config.timezone,
        due_at,
    );

    let completion = ReminderCompletion {
        reminder_id: claimed.id.clone(),
        claimed_version: claimed.version,
        next_scheduled_at,
        last_attempt_at: Some(last_attempt_at),
        last_success_at: report.last_success_at(),
        deactivate: claimed.kind == ReminderKind::Single && next_scheduled_at.is_none(),
        updated: finished_at,
    };
    persist_completion(completion, &claimed, ctx).await?;

    Ok(if report.is_delivered() {
        ReminderOutcome::Delivered
    } else {
        ReminderOutcome::Failed
    })
}

/// Writes `completion` on top of edits that left the schedule alone, like a
/// new message. Edits to the schedule win and the completion is dropped.
async fn persist_completion(
    mut completion: ReminderCompletion,
    claimed: &Reminder,
    ctx: &NudgeContext,
) -> anyhow::Result<()> {
    for _ in 0..COMPLETION_ATTEMPTS {
        if ctx.repos.reminders.complete(&completion).await? {
            return Ok(());
        }
        match ctx.repos.reminders.find(&claimed.id).await {
            Some(current) if current.has_same_schedule(claimed) => {
                completion.claimed_version = current.version;
            }
            Some(_) => {
                warn!(
                    "Reminder: {} was rescheduled while it was dispatched, keeping the new schedule",
                    claimed.id
                );
                return Ok(());
            }
            None => {
                debug!("Reminder: {} was deleted while it was dispatched", claimed.id);
                return Ok(());
            }
        }
    }
    Err(anyhow::anyhow!(
        "Reminder: {} kept changing, unable to store the dispatch outcome",
        claimed.id
    ))
}
