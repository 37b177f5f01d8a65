//! Tests for the error responder running inside a real Actix service.

use super::*;
use crate::Trace;
use crate::domain::{FieldIssue, TRACE_ID_HEADER};
use crate::inbound::http::ApiResult;
use crate::inbound::http::request_context::mark_response_started;
use actix_web::body::to_bytes;
use actix_web::http::header::{CONTENT_TYPE, HeaderMap};
use actix_web::test::{self, TestRequest};
use actix_web::web::{self, Bytes};
use actix_web::{App, HttpRequest, error};
use rstest::rstest;
use serde_json::{Value, json};
use std::io;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::MakeWriter;

struct Outcome {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Outcome {
    fn problem(&self) -> Value {
        let content_type = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .expect("content type present");
        assert_eq!(content_type, "application/json");
        serde_json::from_slice(&self.body).expect("problem body is JSON")
    }

    fn trace_header(&self) -> &str {
        self.headers
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("header is ascii")
    }

    fn assert_untouched(&self) {
        assert!(self.body.is_empty(), "no problem body expected");
        assert!(self.headers.get(CONTENT_TYPE).is_none());
    }
}

async fn validation() -> ApiResult<HttpResponse> {
    Err(Failure::validation([
        FieldIssue::new("Name", "required"),
        FieldIssue::new("Description", "too long"),
    ]))
}

async fn cancelled() -> ApiResult<HttpResponse> {
    Err(Failure::cancelled("upstream timed out"))
}

async fn client_aborted(aborted: RequestAborted) -> ApiResult<HttpResponse> {
    aborted.token().cancel();
    Err(Failure::cancelled("client went away"))
}

async fn unauthorized() -> ApiResult<HttpResponse> {
    Err(Failure::unauthorized("token expired"))
}

async fn disk_full() -> ApiResult<HttpResponse> {
    Err(Failure::unexpected("disk full"))
}

async fn started(req: HttpRequest) -> ApiResult<HttpResponse> {
    mark_response_started(&req);
    Err(Failure::unexpected("failed mid-stream"))
}

async fn foreign_internal() -> Result<HttpResponse, Error> {
    Err(error::ErrorInternalServerError("connection reset"))
}

async fn foreign_rejection() -> Result<HttpResponse, Error> {
    Err(error::ErrorBadRequest("malformed body"))
}

async fn foreign_unauthorized() -> Result<HttpResponse, Error> {
    Err(error::ErrorUnauthorized("bad token"))
}

async fn item(path: web::Path<u32>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    if id == 0 {
        return Err(Failure::validation([FieldIssue::new("Id", "must be positive")]));
    }
    Ok(HttpResponse::Ok().body(id.to_string()))
}

async fn send(environment: HostEnvironment, uri: &str) -> Outcome {
    let app = test::init_service(
        App::new()
            .wrap(ErrorResponder::new(environment))
            .wrap(Trace)
            .route("/ok", web::get().to(|| async { HttpResponse::Ok().body("ok") }))
            .route("/validation", web::get().to(validation))
            .route("/cancelled", web::get().to(cancelled))
            .route("/aborted", web::get().to(client_aborted))
            .route("/unauthorized", web::get().to(unauthorized))
            .route("/disk-full", web::get().to(disk_full))
            .route("/started", web::get().to(started))
            .route("/foreign-internal", web::get().to(foreign_internal))
            .route("/foreign-rejection", web::get().to(foreign_rejection))
            .route("/foreign-unauthorized", web::get().to(foreign_unauthorized))
            .route("/items/{id}", web::get().to(item)),
    )
    .await;
    let res = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = test::read_body(res).await;
    Outcome {
        status,
        headers,
        body,
    }
}

#[actix_web::test]
async fn success_passes_through_untouched() {
    let outcome = send(HostEnvironment::production(), "/ok").await;

    assert_eq!(outcome.status, StatusCode::OK);
    assert_eq!(outcome.body, Bytes::from_static(b"ok"));
}

#[actix_web::test]
async fn validation_failure_lists_errors_in_order() {
    let outcome = send(HostEnvironment::production(), "/validation").await;
    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);

    let problem = outcome.problem();
    assert_eq!(problem["type"], "https://httpstatuses.com/400");
    assert_eq!(problem["title"], "Validation failed");
    assert_eq!(problem["status"], 400);
    assert_eq!(problem["detail"], "One or more validation errors occurred.");
    assert_eq!(problem["instance"], "/validation");
    assert_eq!(
        problem["errors"],
        json!([
            { "field": "Name", "message": "required" },
            { "field": "Description", "message": "too long" },
        ])
    );
}

#[actix_web::test]
async fn trace_id_in_body_matches_header() {
    let outcome = send(HostEnvironment::production(), "/unauthorized").await;
    let problem = outcome.problem();
    assert_eq!(problem["traceId"], outcome.trace_header());
}

#[actix_web::test]
async fn cancellation_not_caused_by_client_is_reported() {
    let outcome = send(HostEnvironment::production(), "/cancelled").await;
    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);

    let problem = outcome.problem();
    assert_eq!(problem["title"], "Operation canceled");
    assert!(problem["detail"].is_null());
}

#[actix_web::test]
async fn cancellation_caused_by_client_writes_nothing() {
    let outcome = send(HostEnvironment::development(), "/aborted").await;
    outcome.assert_untouched();
}

#[actix_web::test]
async fn unauthorized_maps_to_401() {
    let outcome = send(HostEnvironment::production(), "/unauthorized").await;
    assert_eq!(outcome.status, StatusCode::UNAUTHORIZED);

    let problem = outcome.problem();
    assert_eq!(problem["title"], "Unauthorized");
    assert_eq!(problem["status"], 401);
}

#[rstest]
#[case(HostEnvironment::development(), "disk full")]
#[case(HostEnvironment::production(), "Unexpected error")]
#[actix_web::test]
async fn unexpected_failure_detail_depends_on_environment(
    #[case] environment: HostEnvironment,
    #[case] expected: &str,
) {
    let outcome = send(environment, "/disk-full").await;
    assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);

    let problem = outcome.problem();
    assert_eq!(problem["title"], "Unexpected error");
    assert_eq!(problem["status"], 500);
    assert_eq!(problem["detail"], expected);
}

#[actix_web::test]
async fn started_response_is_left_alone() {
    let outcome = send(HostEnvironment::development(), "/started").await;

    assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
    outcome.assert_untouched();
}

#[rstest]
#[case(HostEnvironment::development(), "connection reset")]
#[case(HostEnvironment::production(), "Unexpected error")]
#[actix_web::test]
async fn foreign_server_errors_are_unclassified(
    #[case] environment: HostEnvironment,
    #[case] expected: &str,
) {
    let outcome = send(environment, "/foreign-internal").await;
    assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(outcome.problem()["detail"], expected);
}

#[actix_web::test]
async fn foreign_client_rejections_pass_through() {
    let outcome = send(HostEnvironment::production(), "/foreign-rejection").await;

    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
    assert_eq!(outcome.body, Bytes::from_static(b"malformed body"));
}

#[rstest]
#[case("/items/7", StatusCode::OK)]
#[case("/items/0", StatusCode::BAD_REQUEST)]
#[actix_web::test]
async fn routed_handlers_receive_path_parameters(
    #[case] uri: &str,
    #[case] expected: StatusCode,
) {
    let outcome = send(HostEnvironment::production(), uri).await;
    assert_eq!(outcome.status, expected);
}

#[actix_web::test]
async fn foreign_unauthorized_errors_become_problems() {
    let outcome = send(HostEnvironment::production(), "/foreign-unauthorized").await;
    assert_eq!(outcome.status, StatusCode::UNAUTHORIZED);

    let problem = outcome.problem();
    assert_eq!(problem["title"], "Unauthorized");
    assert_eq!(problem["status"], 401);
    assert_eq!(problem["instance"], "/foreign-unauthorized");
}

async fn render_inner_error(
    message: &'static str,
    status: StatusCode,
) -> (StatusCode, HeaderMap, Value) {
    let app = test::init_service(
        App::new()
            .wrap_fn(move |_req, _srv| {
                ready(Err::<ServiceResponse, Error>(
                    error::InternalError::new(message, status).into(),
                ))
            })
            .wrap(ErrorResponder::new(HostEnvironment::production()))
            .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
    )
    .await;
    let err = test::try_call_service(&app, TestRequest::get().uri("/").to_request())
        .await
        .err()
        .expect("inner error is returned as an error");
    let response = err.error_response();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body()).await.expect("body");
    let problem = serde_json::from_slice(&body).expect("problem body is JSON");
    (status, headers, problem)
}

#[actix_web::test]
async fn inner_service_errors_are_translated() {
    let app = test::init_service(
        App::new()
            .wrap_fn(|_req, _srv| {
                ready(Err::<ServiceResponse, Error>(
                    Failure::unauthorized("rejected before routing").into(),
                ))
            })
            .wrap(ErrorResponder::new(HostEnvironment::production()))
            .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
    )
    .await;

    let err = test::try_call_service(&app, TestRequest::get().uri("/").to_request())
        .await
        .err()
        .expect("inner error is returned as an error");
    let response = err.error_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));

    let body = to_bytes(response.into_body()).await.expect("body");
    let problem: Value = serde_json::from_slice(&body).expect("problem body is JSON");
    assert_eq!(problem["title"], "Unauthorized");
    assert_eq!(problem["instance"], "/");
}

#[actix_web::test]
async fn inner_foreign_unauthorized_errors_are_translated() {
    let (status, headers, problem) =
        render_inner_error("bad token", StatusCode::UNAUTHORIZED).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(problem["title"], "Unauthorized");
}

#[actix_web::test]
async fn inner_foreign_server_errors_are_redacted() {
    let (status, _, problem) =
        render_inner_error("pool exhausted", StatusCode::SERVICE_UNAVAILABLE).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(problem["detail"], "Unexpected error");
}

async fn hangs(
    aborted: RequestAborted,
    seen: web::Data<Mutex<Option<CancellationToken>>>,
) -> HttpResponse {
    *seen.lock().expect("token slot") = Some(aborted.child_token());
    std::future::pending::<()>().await;
    HttpResponse::Ok().finish()
}

#[actix_web::test]
async fn dropping_the_request_cancels_its_signal() {
    let seen = web::Data::new(Mutex::new(None::<CancellationToken>));
    let app = test::init_service(
        App::new()
            .app_data(seen.clone())
            .wrap(ErrorResponder::new(HostEnvironment::production()))
            .route("/hang", web::get().to(hangs)),
    )
    .await;

    let mut call = Box::pin(app.call(TestRequest::get().uri("/hang").to_request()));
    assert!(futures_util::poll!(&mut call).is_pending());

    let token = seen
        .lock()
        .expect("token slot")
        .clone()
        .expect("handler ran");
    assert!(!token.is_cancelled());

    drop(call);
    assert!(token.is_cancelled());
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn events(&self) -> Vec<Value> {
        let bytes = self.0.lock().expect("log buffer").clone();
        String::from_utf8(bytes)
            .expect("utf8 logs")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json log line"))
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[rstest]
#[case("/validation", "WARN")]
#[case("/cancelled", "WARN")]
#[case("/unauthorized", "WARN")]
#[case("/disk-full", "ERROR")]
#[actix_web::test]
async fn failures_are_logged_by_severity(#[case] uri: &str, #[case] level: &str) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .json()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    send(HostEnvironment::production(), uri).await;

    let events = logs.events();
    let failure_events: Vec<&Value> = events
        .iter()
        .filter(|event| event["target"] == "microservice::inbound::http::error_responder")
        .collect();
    assert_eq!(failure_events.len(), 1, "one failure event expected: {events:?}");
    let event = failure_events.first().expect("failure event");
    assert_eq!(event["level"], level);
    assert_eq!(event["fields"]["path"], uri);
}
