//! HTTP inbound adapter: routes, the error responder, and payload schemas.

pub mod error;
pub mod error_responder;
pub mod health;
pub mod ping;
pub mod problem;
pub mod request_context;
pub mod schemas;

pub use error::ApiResult;
pub use error_responder::ErrorResponder;
