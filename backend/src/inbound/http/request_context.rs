//! Per-request signals shared between handlers and the error responder.
//!
//! - [`RequestAborted`] reports whether the client abandoned the request.
//! - [`ResponseStarted`] records that a handler has committed a response
//!   which must not be replaced.

use std::convert::Infallible;

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};
use tokio_util::sync::CancellationToken;

/// Cancellation signal owned by a single request.
///
/// The error responder installs one before invoking downstream processing and
/// cancels it when the transport drops the request, e.g. on client
/// disconnect. Handlers pass [`RequestAborted::child_token`] to work they
/// start so it stops with the request.
///
/// Extracting it outside the responder yields a signal that never fires.
///
/// # Examples
/// ```
/// use actix_web::{HttpResponse, get};
/// use microservice::domain::Failure;
/// use microservice::inbound::http::ApiResult;
/// use microservice::inbound::http::request_context::RequestAborted;
///
/// #[get("/slow")]
/// async fn slow(aborted: RequestAborted) -> ApiResult<HttpResponse> {
///     if aborted.is_cancelled() {
///         return Err(Failure::cancelled("client went away"));
///     }
///     Ok(HttpResponse::Ok().finish())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestAborted(CancellationToken);

impl RequestAborted {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether the request has been abandoned by its client.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Resolve once the request is abandoned.
    pub async fn cancelled(&self) {
        self.0.cancelled().await;
    }

    /// Token cancelled together with the request.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.0.child_token()
    }

    /// Underlying token, for transports signalling an abort.
    pub fn token(&self) -> &CancellationToken {
        &self.0
    }
}

impl FromRequest for RequestAborted {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<RequestAborted>()
            .cloned()
            .unwrap_or_default()))
    }
}

/// Marker stored in request extensions once a response is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseStarted;

/// Record that the response for `req` has started and must be left alone.
pub fn mark_response_started(req: &HttpRequest) {
    req.extensions_mut().insert(ResponseStarted);
}

/// Whether the response to `req` can no longer be replaced.
///
/// Protocol upgrades hand the connection over and count as started.
pub(crate) fn response_started(req: &HttpRequest, status: Option<StatusCode>) -> bool {
    req.extensions().contains::<ResponseStarted>()
        || status == Some(StatusCode::SWITCHING_PROTOCOLS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn extraction_without_responder_never_fires() {
        let req = TestRequest::default().to_http_request();
        let aborted = RequestAborted::extract(&req).await.expect("infallible");
        assert!(!aborted.is_cancelled());
    }

    #[actix_web::test]
    async fn extraction_shares_installed_signal() {
        let req = TestRequest::default().to_http_request();
        let installed = RequestAborted::new();
        req.extensions_mut().insert(installed.clone());

        let extracted = RequestAborted::extract(&req).await.expect("infallible");
        installed.token().cancel();

        assert!(extracted.is_cancelled());
        assert!(extracted.child_token().is_cancelled());
    }

    #[test]
    fn started_marker_is_detected() {
        let req = TestRequest::default().to_http_request();
        assert!(!response_started(&req, Some(StatusCode::OK)));

        mark_response_started(&req);
        assert!(response_started(&req, Some(StatusCode::OK)));
    }

    #[test]
    fn upgrade_counts_as_started() {
        let req = TestRequest::default().to_http_request();
        assert!(response_started(&req, Some(StatusCode::SWITCHING_PROTOCOLS)));
        assert!(!response_started(&req, None));
    }
}
