//! Login flow
//!
//! ## Modes
//!
//! ```text
//! batch, or username and password both known:
//!   one attempt ──ok──> save
//!        └─401─> batch: AuthenticationFailed (exit 3)
//!                else:  interactive loop
//!
//! interactive loop:
//!   prompt [username] + password ──ok──> store username, save
//!        └─401─> "Authentication failed." and prompt again
//! ```
//!
//! Any non-401 failure ends the flow.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::ConfigStore;
use crate::domain::settings::USERNAME;
use crate::infrastructure::traits::{Prompter, RemoteApi, Reporter};
use crate::infrastructure::{HttpError, InfraError};

const UNAUTHORIZED: u16 = 401;

/// Authentication against the remote service.
pub struct AuthService {
    api: Arc<dyn RemoteApi>,
    prompter: Arc<dyn Prompter>,
    reporter: Arc<dyn Reporter>,
}

impl AuthService {
    pub fn new(
        api: Arc<dyn RemoteApi>,
        prompter: Arc<dyn Prompter>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            api,
            prompter,
            reporter,
        }
    }

    /// Authenticate, then persist the configuration.
    #[instrument(level = "debug", skip(self, config))]
    pub fn login(&self, config: &mut ConfigStore, batch_mode: bool) -> ApplicationResult<()> {
        let username = config.username().map(str::to_string);
        let password = config.password().map(str::to_string);

        let mut should_prompt = !batch_mode;
        if batch_mode || (username.is_some() && password.is_some()) {
            let (Some(user), Some(pass)) = (username.as_deref(), password.as_deref()) else {
                return Err(ApplicationError::AuthenticationFailed(
                    "Batch mode requires a username and a password.".to_string(),
                ));
            };
            match self.api.login(user, pass) {
                Ok(()) => should_prompt = false,
                Err(e) if is_unauthorized(&e) => {
                    self.reporter.warning("Invalid credentials provided.");
                    if batch_mode {
                        return Err(ApplicationError::AuthenticationFailed(format!(
                            "Authentication failed for '{user}'."
                        )));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        if should_prompt {
            let user = self.interactive(username)?;
            config.set_override(USERNAME, user);
        }

        config.save()?;
        self.reporter.info("Local credentials saved.");
        Ok(())
    }

    /// Prompt until the service accepts the credentials.
    fn interactive(&self, mut username: Option<String>) -> ApplicationResult<String> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.reporter.notify("Enter your SlipStream credentials.");
            let user = match username.take() {
                Some(user) => user,
                None => self.prompt_username()?,
            };
            let password = self
                .prompter
                .password(&user)
                .map_err(InfraError::Prompt)?;

            debug!(attempt, "authenticating '{user}'");
            match self.api.login(&user, &password) {
                Ok(()) => {
                    self.reporter.notify("Authentication successful.");
                    return Ok(user);
                }
                Err(e) if is_unauthorized(&e) => {
                    self.reporter.error("Authentication failed.");
                    username = Some(user);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn prompt_username(&self) -> ApplicationResult<String> {
        loop {
            let user = self.prompter.username().map_err(InfraError::Prompt)?;
            if !user.trim().is_empty() {
                return Ok(user.trim().to_string());
            }
        }
    }
}

fn is_unauthorized(e: &HttpError) -> bool {
    e.is_status(UNAUTHORIZED)
}
