//! Connectivity check under the versioned API scope.

use actix_web::{HttpResponse, get};
use serde::Serialize;
use utoipa::ToSchema;

/// Body of `GET /api/v1/ping`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    #[schema(example = "ok")]
    status: &'static str,
}

/// Answer with `{"status":"ok"}`.
#[utoipa::path(
    get,
    path = "/api/v1/ping",
    tags = ["api"],
    responses((status = 200, description = "Service reachable", body = PingResponse))
)]
#[get("/ping")]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(PingResponse { status: "ok" })
}
