//! Application services
//!
//! `AuthService` runs the login flow, `ElementService` the remote commands.
//! Both hold `Arc`s of the boundary traits handed out by the service container.

mod auth;
mod elements;

pub use auth::AuthService;
pub use elements::{DeployRequest, ElementService, PublishOutcome};
