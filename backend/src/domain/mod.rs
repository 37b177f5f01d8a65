//! Domain primitives.
//!
//! Purpose: keep the types handlers work with free of transport concerns.
//! Inbound adapters translate them into HTTP responses.
//!
//! Public surface:
//! - Failure (alias to `failure::Failure`): classified processing failure.
//! - Entity (alias to `entity::Entity`): example activatable record.
//! - TraceId (alias to `trace_id::TraceId`): request correlation identifier.

pub mod entity;
pub mod failure;
pub mod trace_id;

pub use self::entity::{Entity, EntityId};
pub use self::failure::{Failure, FailureKind, FieldIssue};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
