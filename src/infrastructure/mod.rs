//! Infrastructure layer: I/O implementations and service wiring
//!
//! This layer implements the remote API and prompt boundary traits.

pub mod api;
pub mod di;
pub mod error;
pub mod traits;

pub use api::HttpApi;
pub use error::{HttpError, InfraError, InfraResult, ResponseBody};
