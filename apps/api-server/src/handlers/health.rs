use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// GET /health. Answers without touching the store or the cache.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(Liveness {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
    })
}
