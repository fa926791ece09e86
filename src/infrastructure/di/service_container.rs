//! Service container for dependency injection
//!
//! Wires up the services with the session-bound API handle and the terminal.

use std::sync::Arc;

use crate::application::services::{AuthService, ElementService};
use crate::config::ConfigStore;
use crate::infrastructure::traits::{Prompter, RemoteApi, Reporter, TerminalPrompter};
use crate::infrastructure::{HttpApi, InfraResult};

/// Container holding the configuration and the I/O boundaries.
pub struct ServiceContainer {
    /// Effective configuration of the active profile
    pub config: ConfigStore,

    /// Session-bound remote API handle
    pub api: Arc<dyn RemoteApi>,

    /// Credential input
    pub prompter: Arc<dyn Prompter>,

    /// User-facing messages
    pub reporter: Arc<dyn Reporter>,
}

impl ServiceContainer {
    /// Create a container with the HTTP API built from the effective settings.
    pub fn new(config: ConfigStore, reporter: Arc<dyn Reporter>) -> InfraResult<Self> {
        let api = HttpApi::new(config.endpoint(), config.session_file(), config.insecure())?;
        Ok(Self::with_deps(
            config,
            Arc::new(api),
            Arc::new(TerminalPrompter),
            reporter,
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        config: ConfigStore,
        api: Arc<dyn RemoteApi>,
        prompter: Arc<dyn Prompter>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            api,
            prompter,
            reporter,
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            Arc::clone(&self.api),
            Arc::clone(&self.prompter),
            Arc::clone(&self.reporter),
        )
    }

    pub fn element_service(&self) -> ElementService {
        ElementService::new(Arc::clone(&self.api))
    }
}
