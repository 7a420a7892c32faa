use crate::error::NudgeError;
use actix_web::{web, HttpResponse};
use nudge_api_structs::dtos::SchedulerStatsDTO;
use nudge_api_structs::get_scheduler_stats::*;
use nudge_infra::NudgeContext;

pub async fn get_scheduler_stats_controller(
    ctx: web::Data<NudgeContext>,
) -> Result<HttpResponse, NudgeError> {
    let stats = ctx.stats.snapshot();
    let next_run_at = if ctx.config.scheduler_enabled {
        stats
            .last_run_at
            .map(|last_run| last_run + ctx.config.scheduler_tick_secs as i64 * 1000)
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(APIResponse {
        stats: SchedulerStatsDTO {
            ticks: stats.ticks,
            total_processed: stats.total_processed,
            delivered: stats.delivered,
            failed: stats.failed,
            skipped: stats.skipped,
            is_running: stats.is_running,
            last_run_at: stats.last_run_at,
            last_run_duration_ms: stats.last_run_duration_ms,
            next_run_at,
        },
    }))
}
