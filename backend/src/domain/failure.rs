//! Failures raised by downstream request processing.
//!
//! A [`Failure`] is transport agnostic. It records what went wrong and which
//! category it belongs to; the HTTP error responder decides status codes and
//! response bodies from the category alone.

use std::fmt;

/// Failure category used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Input failed validation; field issues describe why.
    Validation,
    /// The operation was cancelled before completing.
    Cancellation,
    /// The caller is not allowed to perform the operation.
    Unauthorized,
    /// Anything the system does not classify further.
    Unclassified,
}

/// A single field-level validation problem.
///
/// # Examples
/// ```
/// use microservice::domain::FieldIssue;
///
/// let issue = FieldIssue::new("Name", "required");
/// assert_eq!(issue.field(), "Name");
/// assert_eq!(issue.message(), "required");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    field: String,
    message: String,
}

impl FieldIssue {
    /// Create a field issue.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Explanation of what is wrong with the field.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Classified failure produced where an operation fails.
///
/// ## Invariants
/// - `issues` is empty unless `kind` is [`FailureKind::Validation`].
/// - `issues` keeps the order in which they were reported.
///
/// # Examples
/// ```
/// use microservice::domain::{Failure, FailureKind, FieldIssue};
///
/// let failure = Failure::validation([FieldIssue::new("Name", "required")]);
/// assert_eq!(failure.kind(), FailureKind::Validation);
/// assert_eq!(failure.issues().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: FailureKind,
    message: String,
    issues: Vec<FieldIssue>,
}

impl Failure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// Validation failure carrying the reported field issues in order.
    pub fn validation(issues: impl IntoIterator<Item = FieldIssue>) -> Self {
        let issues: Vec<FieldIssue> = issues.into_iter().collect();
        let summary = issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join(", ");
        let message = if summary.is_empty() {
            "validation failed".to_owned()
        } else {
            format!("validation failed: {summary}")
        };
        Self {
            kind: FailureKind::Validation,
            message,
            issues,
        }
    }

    /// The operation was cancelled.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Cancellation, message)
    }

    /// The caller lacks permission.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unauthorized, message)
    }

    /// Any failure without a more specific category.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unclassified, message)
    }

    /// Failure category.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Raw human-readable message. May contain internal details.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Field issues; empty for non-validation failures.
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}
