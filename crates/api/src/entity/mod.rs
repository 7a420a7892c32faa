mod delete_entity;
mod get_appointment_reminders;
mod get_entity_reminder_summary;
mod get_entity_reminders;
mod sync_entity;

use actix_web::web;
use delete_entity::delete_entity_controller;
use get_appointment_reminders::get_appointment_reminders_controller;
use get_entity_reminder_summary::get_entity_reminder_summary_controller;
use get_entity_reminders::get_entity_reminders_controller;
use sync_entity::sync_entity_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/entities/{entity_type}/{entity_id}/reminders",
        web::get().to(get_entity_reminders_controller),
    );
    cfg.route(
        "/entities/{entity_type}/{entity_id}/reminders/summary",
        web::get().to(get_entity_reminder_summary_controller),
    );
    cfg.route(
        "/entities/{entity_type}/{entity_id}/appointment-reminders",
        web::get().to(get_appointment_reminders_controller),
    );
    cfg.route(
        "/entities/{entity_type}/{entity_id}/sync",
        web::post().to(sync_entity_controller),
    );
    cfg.route(
        "/entities/{entity_type}/{entity_id}",
        web::delete().to(delete_entity_controller),
    );
}
