/// Health endpoints. Mounted outside the authenticated scope.
use crate::error::AppError;
use crate::services::PostService;
use actix_web::{web, HttpResponse};

/// Store connectivity for readiness probes
/// GET /api/health
pub async fn health(service: web::Data<PostService>) -> HttpResponse {
    match service.store().ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            let message = match &e {
                AppError::Database(_) => "post store unreachable".to_string(),
                other => other.to_string(),
            };
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "error": message,
                "service": "post-service"
            }))
        }
    }
}

/// GET /api/health/live
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "alive": true }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(health))
        .route("/live", web::get().to(liveness));
}
