//! Microservice scaffold library.
//!
//! Wires an Actix server with request tracing, a problem-details error
//! responder, health probes, and an example domain entity.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod server;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
