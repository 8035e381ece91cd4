//! HTTP handlers and route configuration.

mod health;
mod topics;

use actix_web::web;

use crate::middleware::error::{json_error_handler, path_error_handler, query_error_handler};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/topicos")
                .service(
                    web::resource("")
                        .route(web::get().to(topics::list))
                        .route(web::post().to(topics::create)),
                )
                .service(
                    web::resource("/{id}")
                        .name(topics::TOPIC_RESOURCE)
                        .route(web::get().to(topics::detail))
                        .route(web::put().to(topics::update))
                        .route(web::delete().to(topics::delete)),
                ),
        );
}
