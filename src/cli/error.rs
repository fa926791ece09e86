//! CLI-level errors and the failure translator
//!
//! Every failure of an invocation ends up here: [`CliError::user_message`] is
//! what the user reads, [`CliError::diagnostic`] goes to the debug log and
//! [`CliError::exit_code`] terminates the process.

use std::error::Error as _;

use thiserror::Error;
use tracing::debug;

use crate::application::ApplicationError;
use crate::config::ConfigError;
use crate::domain::{DomainError, Level};
use crate::exitcode;
use crate::infrastructure::traits::Reporter;
use crate::infrastructure::{HttpError, InfraError, ResponseBody};

const SESSION_EXPIRED: &str = "Authentication cookie expired. Log in with `slipstream login`.";
const INVALID_CREDENTIALS: &str = "Invalid credentials provided. Log in with `slipstream login`.";

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Parse failures, help and version output; clap renders these itself.
    #[error(transparent)]
    Args(#[from] clap::Error),

    #[error("{0}")]
    Usage(String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Application(e.into())
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        Self::Application(e.into())
    }
}

impl From<InfraError> for CliError {
    fn from(e: InfraError) -> Self {
        Self::Application(e.into())
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        Self::Application(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Args(e) if e.use_stderr() => exitcode::USAGE,
            CliError::Args(_) => exitcode::OK,
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Application(e) => match e {
                ApplicationError::Domain(_) => exitcode::USAGE,
                ApplicationError::Config(c) => match c {
                    ConfigError::ProfileNotFound(_) => exitcode::USAGE,
                    ConfigError::Io { .. } => exitcode::IOERR,
                    ConfigError::Serialize(_) => exitcode::SOFTWARE,
                },
                ApplicationError::Infra(i) => match i {
                    InfraError::Http(HttpError::Session { .. }) => exitcode::IOERR,
                    InfraError::Http(_) => exitcode::UNAVAILABLE,
                    InfraError::Io { .. } | InfraError::Prompt(_) => exitcode::IOERR,
                    InfraError::InvalidEndpoint { .. } => exitcode::CONFIG,
                    InfraError::Client(_) => exitcode::SOFTWARE,
                },
                ApplicationError::AuthenticationFailed(_) => exitcode::AUTH_FAILED,
                ApplicationError::ElementNotFound(_) => exitcode::NOINPUT,
                ApplicationError::PermissionDenied(_) => exitcode::NOPERM,
                ApplicationError::UnexpectedResponse(_)
                | ApplicationError::OperationFailed { .. } => exitcode::DATAERR,
            },
        }
    }

    /// Remote failure behind this error, if any.
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            CliError::Application(e) => e.http(),
            _ => None,
        }
    }

    /// Short message for the user.
    pub fn user_message(&self) -> String {
        if let Some(e) = self.http() {
            return match e {
                HttpError::Response {
                    body: ResponseBody::Xml(text),
                    ..
                } if !text.is_empty() => text.clone(),
                HttpError::Response { status: 401, .. } => SESSION_EXPIRED.to_string(),
                HttpError::Response { status: 403, .. } => INVALID_CREDENTIALS.to_string(),
                HttpError::Response { .. } | HttpError::Transport(_) | HttpError::Session { .. } => {
                    e.to_string()
                }
            };
        }
        match self {
            CliError::Application(ApplicationError::Config(e @ ConfigError::ProfileNotFound(_))) => {
                format!("Invalid value for '--profile': {e}")
            }
            other => other.to_string(),
        }
    }

    /// Debug representation followed by the chain of sources.
    pub fn diagnostic(&self) -> String {
        let mut out = format!("{self:?}");
        let mut source = self.source();
        while let Some(cause) = source {
            out.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
        out
    }

    /// Render the failure and return the exit code.
    pub fn report(&self, reporter: &dyn Reporter) -> i32 {
        match self {
            CliError::Args(e) => {
                let _ = e.print();
            }
            _ => reporter.report(Level::Fatal, &self.user_message()),
        }
        debug!("{}", self.diagnostic());
        self.exit_code()
    }
}
