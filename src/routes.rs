use crate::api::{employee, health, vacation};
use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health::health_check)))
        .service(web::resource("/employees").route(web::get().to(employee::list_employees)))
        .service(
            web::resource("/vacation-requests")
                .route(web::get().to(vacation::list_vacation_requests))
                .route(web::post().to(vacation::create_vacation_request))
                .route(web::method(Method::OPTIONS).to(vacation::preflight)),
        );
}

/// Permissive CORS headers, attached to every response including errors.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
        .add(("Access-Control-Allow-Methods", "GET,POST,OPTIONS"))
}
