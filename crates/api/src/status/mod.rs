use actix_web::{web, HttpResponse};
use nudge_api_structs::get_service_health::*;
use nudge_infra::NudgeContext;

async fn status(ctx: web::Data<NudgeContext>) -> HttpResponse {
    HttpResponse::Ok().json(APIResponse {
        message: "Yo! We are up!\r\n".into(),
        scheduler_enabled: ctx.config.scheduler_enabled,
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthcheck", web::get().to(status));
}
