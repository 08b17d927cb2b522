//! Health endpoint for orchestration and load balancers.

use actix_web::{get, web};

use super::schemas::HealthResponse;

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tags = ["health"],
    security([])
)]
#[get("/health")]
pub async fn health_check() -> web::Json<HealthResponse> {
    web::Json(HealthResponse {
        status: "healthy".to_owned(),
    })
}
