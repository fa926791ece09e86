//! Application layer: login flow and remote commands
//!
//! Talks to the remote service and the terminal only through the boundary
//! traits of `infrastructure::traits`.

pub mod error;
pub mod error_ext;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::ResultExt;
