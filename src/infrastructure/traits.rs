//! I/O boundary traits for testability
//!
//! These traits abstract the remote service and the terminal, allowing the
//! login flow and commands to be tested with mock implementations.
//! The terminal implementation of [`Reporter`] lives in `cli::output`.

use std::fmt;
use std::io::{self, BufRead, Write};

use serde_json::Value;
use url::Url;

use crate::domain::Level;
use crate::infrastructure::HttpError;

/// HTTP verbs used against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// Session-bound handle to the remote orchestration service.
pub trait RemoteApi: Send + Sync {
    /// Base URL of the service.
    fn endpoint(&self) -> &Url;

    /// Authenticate and persist the session.
    fn login(&self, username: &str, password: &str) -> Result<(), HttpError>;

    /// Drop the persisted session.
    fn logout(&self) -> Result<(), HttpError>;

    /// Issue a request relative to the endpoint.
    ///
    /// `params` are sent as the query string for GET/DELETE and as a form body
    /// otherwise. Empty responses yield `Value::Null`.
    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, HttpError>;
}

/// Interactive credential input.
pub trait Prompter: Send + Sync {
    fn username(&self) -> io::Result<String>;

    /// Read a password without echoing it.
    fn password(&self, username: &str) -> io::Result<String>;
}

/// User-facing message sink, filtered by verbosity.
pub trait Reporter: Send + Sync {
    fn report(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    fn notify(&self, message: &str) {
        self.report(Level::Notify, message);
    }

    fn warning(&self, message: &str) {
        self.report(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn username(&self) -> io::Result<String> {
        print!("Username: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no username on stdin",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn password(&self, username: &str) -> io::Result<String> {
        rpassword::prompt_password(format!("Password for '{username}': "))
    }
}
