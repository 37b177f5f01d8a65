//! Middleware turning unhandled failures into problem-details responses.
//!
//! Downstream processing fails in one of two ways under Actix: a handler
//! returns an error, which arrives as a response carrying that error, or an
//! inner service resolves to `Err` before any response exists. Both are caught
//! here exactly once, classified with [`classify`], and rendered as
//! `application/json` problem details. In the second case the problem
//! response is handed back inside the error and Actix writes it unchanged.
//!
//! Foreign `401` errors are treated as unauthorized failures. Other errors
//! that are not a [`Failure`] and carry a 4xx status (payload or path
//! extraction rejections) are left as Actix rendered them. Every remaining
//! foreign error is treated as an unclassified failure.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, error, warn};

use super::problem::{ProblemDetails, classify};
use super::request_context::{RequestAborted, response_started};
use crate::domain::{Failure, TraceId};
use crate::middleware::trace::insert_trace_header;
use crate::settings::HostEnvironment;

/// Error-translating middleware.
///
/// Wrap it inside [`crate::Trace`] so the trace identifier is in scope when
/// problems are rendered.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use microservice::Trace;
/// use microservice::inbound::http::error_responder::ErrorResponder;
/// use microservice::settings::HostEnvironment;
///
/// let app = App::new()
///     .wrap(ErrorResponder::new(HostEnvironment::production()))
///     .wrap(Trace);
/// ```
#[derive(Clone, Debug)]
pub struct ErrorResponder {
    environment: HostEnvironment,
}

impl ErrorResponder {
    /// Create a responder for the given host environment.
    pub fn new(environment: HostEnvironment) -> Self {
        Self { environment }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorResponder
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorResponderMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorResponderMiddleware {
            service,
            environment: Rc::new(self.environment.clone()),
        }))
    }
}

/// Service wrapper produced by [`ErrorResponder`].
///
/// Applications should not use this type directly.
pub struct ErrorResponderMiddleware<S> {
    service: S,
    environment: Rc<HostEnvironment>,
}

impl<S, B> Service<ServiceRequest> for ErrorResponderMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let aborted = RequestAborted::new();
        req.extensions_mut().insert(aborted.clone());
        let path = req.path().to_owned();
        let environment = Rc::clone(&self.environment);
        let fut = self.service.call(req);

        Box::pin(async move {
            // Dropping this future means the transport gave up on the request.
            let guard = aborted.token().clone().drop_guard();
            let outcome = fut.await;
            guard.disarm();

            match outcome {
                Ok(res) => {
                    let failure = res.response().error().and_then(failure_from_error);
                    let res = res.map_into_boxed_body();
                    let Some(failure) = failure else {
                        return Ok(res);
                    };
                    let started = response_started(res.request(), Some(res.status()));
                    let problem = problem_response(
                        &failure,
                        &path,
                        started,
                        aborted.is_cancelled(),
                        &environment,
                    );
                    Ok(match problem {
                        Some(response) => res.into_response(response),
                        None => res,
                    })
                }
                // No response exists yet, so nothing can have started. The
                // problem travels inside the error and is rendered as is.
                Err(err) => {
                    let Some(failure) = failure_from_error(&err) else {
                        return Err(err);
                    };
                    match problem_response(
                        &failure,
                        &path,
                        false,
                        aborted.is_cancelled(),
                        &environment,
                    ) {
                        Some(response) => Err(InternalError::from_response(failure, response).into()),
                        None => Err(err),
                    }
                }
            }
        })
    }
}

/// Classify an Actix error, or `None` when it is a client rejection Actix
/// already rendered.
fn failure_from_error(err: &Error) -> Option<Failure> {
    if let Some(failure) = err.as_error::<Failure>() {
        return Some(failure.clone());
    }
    let status = err.as_response_error().status_code();
    if status == StatusCode::UNAUTHORIZED {
        return Some(Failure::unauthorized(err.to_string()));
    }
    if status.is_client_error() {
        return None;
    }
    Some(Failure::unexpected(err.to_string()))
}

/// Log the failure and build its problem response, or `None` when the
/// downstream response must be kept.
fn problem_response(
    failure: &Failure,
    path: &str,
    started: bool,
    client_aborted: bool,
    environment: &HostEnvironment,
) -> Option<HttpResponse> {
    let trace_id = TraceId::current_or_generate();

    let Some(problem) = classify(failure, client_aborted, environment) else {
        debug!(path, trace_id = %trace_id, error = %failure, "request aborted by client");
        return None;
    };

    let status = problem.status().as_u16();
    if problem.status().is_server_error() {
        error!(status, path, trace_id = %trace_id, error = %failure, "unhandled failure");
    } else {
        warn!(status, path, trace_id = %trace_id, error = %failure, "{}", problem.title());
    }

    if started {
        debug!(status, path, trace_id = %trace_id, "response already started; skipping problem");
        return None;
    }

    let mut response =
        HttpResponse::build(problem.status()).json(ProblemDetails::new(&problem, path, trace_id));
    insert_trace_header(response.headers_mut(), trace_id);
    Some(response)
}

#[cfg(test)]
mod tests;
