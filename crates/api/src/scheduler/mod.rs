mod delete_stale_reminders;
mod dispatcher;
mod get_scheduler_stats;
mod process_due_reminders;

use actix_web::web;
pub use delete_stale_reminders::DeleteStaleRemindersUseCase;
use get_scheduler_stats::get_scheduler_stats_controller;
pub use process_due_reminders::ProcessDueRemindersUseCase;
use process_due_reminders::run_scheduler_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/scheduler/stats",
        web::get().to(get_scheduler_stats_controller),
    );
    cfg.route("/scheduler/run", web::post().to(run_scheduler_controller));
}
