use crate::{
    scheduler::{DeleteStaleRemindersUseCase, ProcessDueRemindersUseCase},
    shared::usecase::execute,
};
use actix_web::rt::time::{interval, sleep};
use nudge_infra::NudgeContext;
use std::time::Duration;
use tracing::info_span;
use tracing_futures::Instrument;

pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Runs a scheduler tick on every full minute, or every `SCHEDULER_TICK_SECS`.
/// Ticks are spawned so a slow tick never delays the next one, claims keep
/// overlapping ticks from sending the same reminder twice.
pub fn start_send_reminders_job(ctx: NudgeContext) {
    actix_web::rt::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now as usize, 0);
        sleep(Duration::from_secs(secs_to_next_run as u64)).await;

        let tick_secs = ctx.config.scheduler_tick_secs.max(1);
        let mut tick_interval = interval(Duration::from_secs(tick_secs));
        loop {
            tick_interval.tick().await;
            let context = ctx.clone();
            actix_web::rt::spawn(
                async move {
                    let _ = execute(ProcessDueRemindersUseCase, &context).await;
                }
                .instrument(info_span!("scheduler_tick")),
            );
        }
    });
}

pub fn start_delete_stale_reminders_job(ctx: NudgeContext) {
    actix_web::rt::spawn(async move {
        let mut cleanup_interval =
            interval(Duration::from_secs(ctx.config.cleanup_interval_secs.max(1)));
        loop {
            cleanup_interval.tick().await;
            let _ = execute(DeleteStaleRemindersUseCase, &ctx)
                .instrument(info_span!("reminder_cleanup"))
                .await;
        }
    });
}
