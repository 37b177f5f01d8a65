//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the HTTP endpoints from the inbound layer (ping and
//! health) and the problem-details error schema. The generated document is
//! served by Swagger UI in development and exported via
//! `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::health::{HealthReport, HealthStatus};
use crate::inbound::http::ping::PingResponse;
use crate::inbound::http::schemas::{FieldIssueSchema, ProblemDetailsSchema};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Microservice API",
        description = "Connectivity and health endpoints. Failures are reported as problem details.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::ping::ping,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        PingResponse,
        HealthReport,
        HealthStatus,
        ProblemDetailsSchema,
        FieldIssueSchema
    )),
    tags(
        (name = "api", description = "Versioned application endpoints"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
