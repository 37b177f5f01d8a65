//! OpenAPI schema definitions for error payloads.
//!
//! [`ProblemDetails`](super::problem::ProblemDetails) keeps its extension
//! members in a flattened map, which utoipa cannot describe. The wrappers
//! below spell out the documented shape instead.

use utoipa::ToSchema;

/// OpenAPI schema for a single validation issue.
#[derive(ToSchema)]
#[schema(as = FieldIssue)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct FieldIssueSchema {
    /// Name of the offending field.
    #[schema(example = "Name")]
    field: String,
    /// What is wrong with the field.
    #[schema(example = "required")]
    message: String,
}

/// OpenAPI schema for [`super::problem::ProblemDetails`].
#[derive(ToSchema)]
#[schema(as = ProblemDetails, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ProblemDetailsSchema {
    /// URI reference identifying the status code.
    #[schema(example = "https://httpstatuses.com/400")]
    r#type: String,
    /// Short summary of the problem category.
    #[schema(example = "Validation failed")]
    title: String,
    /// HTTP status code of the response.
    #[schema(example = 400)]
    status: u16,
    /// Explanation; `null` when none is given.
    #[schema(example = "One or more validation errors occurred.")]
    detail: Option<String>,
    /// Path of the failed request.
    #[schema(example = "/api/v1/ping")]
    instance: String,
    /// Correlation identifier, also sent in the `trace-id` header.
    #[schema(example = "00000000-0000-0000-0000-000000000000")]
    trace_id: String,
    /// Validation issues; present only for validation failures.
    errors: Option<Vec<FieldIssueSchema>>,
}
