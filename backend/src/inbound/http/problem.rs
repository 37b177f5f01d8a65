//! Problem-details payloads and failure classification.
//!
//! [`classify`] is the single place deciding how a [`Failure`] looks on the
//! wire. Precedence, first match wins:
//!
//! 1. validation → 400 `Validation failed` with an `errors` extension;
//! 2. cancellation not caused by the client → 400 `Operation canceled`;
//!    cancellation caused by the client produces no response at all;
//! 3. unauthorized → 401 `Unauthorized`;
//! 4. anything else → 500 `Unexpected error`, raw message only in
//!    development.

use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::domain::{Failure, FailureKind, TraceId};
use crate::settings::HostEnvironment;

/// Prefix of the `type` URI; the status code is appended.
pub const PROBLEM_TYPE_BASE: &str = "https://httpstatuses.com/";

pub(crate) const VALIDATION_TITLE: &str = "Validation failed";
pub(crate) const VALIDATION_DETAIL: &str = "One or more validation errors occurred.";
pub(crate) const CANCELED_TITLE: &str = "Operation canceled";
pub(crate) const UNAUTHORIZED_TITLE: &str = "Unauthorized";
pub(crate) const UNEXPECTED_TITLE: &str = "Unexpected error";

const RESERVED_KEYS: [&str; 6] = ["type", "title", "status", "detail", "instance", "traceId"];

/// Outcome of classifying a failure, before request data is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    status: StatusCode,
    title: &'static str,
    detail: Option<String>,
    extensions: Map<String, Value>,
}

impl Problem {
    fn new(status: StatusCode, title: &'static str) -> Self {
        Self {
            status,
            title,
            detail: None,
            extensions: Map::new(),
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach an extension member. Names of the fixed members are refused so
    /// the envelope stays well-formed.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            warn!(key = %key, "ignoring extension that shadows a problem member");
            return self;
        }
        self.extensions.insert(key, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

/// Map a failure onto a problem.
///
/// Returns `None` when the failure is a cancellation caused by the client
/// aborting the request; nobody is left to read a response.
///
/// # Examples
/// ```
/// use actix_web::http::StatusCode;
/// use microservice::domain::Failure;
/// use microservice::inbound::http::problem::classify;
/// use microservice::settings::HostEnvironment;
///
/// let env = HostEnvironment::production();
/// let problem = classify(&Failure::unexpected("disk full"), false, &env).expect("reported");
/// assert_eq!(problem.status(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(problem.detail(), Some("Unexpected error"));
///
/// assert!(classify(&Failure::cancelled("gone"), true, &env).is_none());
/// ```
pub fn classify(
    failure: &Failure,
    client_aborted: bool,
    environment: &HostEnvironment,
) -> Option<Problem> {
    let problem = match failure.kind() {
        FailureKind::Validation => {
            let errors: Vec<Value> = failure
                .issues()
                .iter()
                .map(|issue| json!({ "field": issue.field(), "message": issue.message() }))
                .collect();
            Problem::new(StatusCode::BAD_REQUEST, VALIDATION_TITLE)
                .with_detail(VALIDATION_DETAIL)
                .with_extension("errors", Value::Array(errors))
        }
        FailureKind::Cancellation if client_aborted => return None,
        FailureKind::Cancellation => Problem::new(StatusCode::BAD_REQUEST, CANCELED_TITLE),
        FailureKind::Unauthorized => Problem::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_TITLE),
        FailureKind::Unclassified => {
            let detail = if environment.is_development() {
                failure.message()
            } else {
                UNEXPECTED_TITLE
            };
            Problem::new(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_TITLE).with_detail(detail)
        }
    };
    Some(problem)
}

/// Wire representation of a problem.
///
/// ## Invariants
/// - `status` equals the HTTP status of the response carrying it.
/// - `type` is always `https://httpstatuses.com/{status}`.
/// - `detail` is serialised as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    type_uri: String,
    title: String,
    status: u16,
    detail: Option<String>,
    instance: String,
    #[serde(rename = "traceId")]
    trace_id: String,
    #[serde(flatten)]
    extensions: Map<String, Value>,
}

impl ProblemDetails {
    /// Attach request data to a classified problem.
    pub fn new(problem: &Problem, instance: impl Into<String>, trace_id: TraceId) -> Self {
        let status = problem.status.as_u16();
        Self {
            type_uri: format!("{PROBLEM_TYPE_BASE}{status}"),
            title: problem.title.to_owned(),
            status,
            detail: problem.detail.clone(),
            instance: instance.into(),
            trace_id: trace_id.to_string(),
            extensions: problem.extensions.clone(),
        }
    }

    pub fn type_uri(&self) -> &str {
        self.type_uri.as_str()
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn instance(&self) -> &str {
        self.instance.as_str()
    }

    pub fn trace_id(&self) -> &str {
        self.trace_id.as_str()
    }

    /// Extension member by name, e.g. `errors`.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}
