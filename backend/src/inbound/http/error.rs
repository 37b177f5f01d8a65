//! HTTP status mapping for domain failures.
//!
//! Purpose: let Actix handlers return [`Failure`] directly. The status code is
//! fixed here; the problem-details body is written by
//! [`super::error_responder::ErrorResponder`], which owns the redaction rules.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::domain::{Failure, FailureKind};

/// Convenient result alias for HTTP handlers.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use microservice::domain::Failure;
/// use microservice::inbound::http::ApiResult;
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Failure::unauthorized("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Failure>;

pub(crate) fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Validation | FailureKind::Cancellation => StatusCode::BAD_REQUEST,
        FailureKind::Unauthorized => StatusCode::UNAUTHORIZED,
        FailureKind::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for Failure {
    fn status_code(&self) -> StatusCode {
        status_for(self.kind())
    }

    fn error_response(&self) -> HttpResponse {
        // The responder owns the body.
        HttpResponse::build(self.status_code()).finish()
    }
}
