use actix_web::{web, HttpMessage, HttpRequest};

use crate::ctx::Ctx;

pub mod health;
pub mod matches;

/// Mount the command surface.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health)
            .service(matches::create_match)
            .service(matches::get_match)
            .service(matches::cancel_match)
            .service(matches::vote)
            .service(matches::request_submit)
            .service(matches::claim_place)
            .service(matches::claim_leader)
            .service(matches::resubmit),
    );
}

/// Context for a handler, carrying the middleware-assigned trace id.
pub(crate) fn request_ctx(req: &HttpRequest) -> Ctx {
    let trace_id = req
        .extensions()
        .get::<String>()
        .cloned()
        .unwrap_or_else(|| "untraced".to_string());
    Ctx::for_request(trace_id)
}
