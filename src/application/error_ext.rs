//! Error conversion helpers
//!
//! Provides an extension trait for attaching context to foreign errors.

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting foreign results to `ApplicationResult` with context.
pub trait ResultExt<T> {
    /// Wrap the error as [`ApplicationError::OperationFailed`].
    ///
    /// # Example
    /// ```ignore
    /// serde_json::from_value::<Element>(value)
    ///     .context("decode element")?;
    /// ```
    fn context(self, context: &str) -> ApplicationResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: context.to_string(),
            source: Box::new(e),
        })
    }
}
