//! Named configuration partitions

use std::fmt;

use crate::domain::{DomainError, DomainResult};

/// Profile used when none is given on the command line.
pub const DEFAULT_PROFILE: &str = "nuvla";

/// Section name holding the alias table; no profile may use it.
pub(crate) const ALIAS_SECTION: &str = "alias";

/// The active settings partition. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile(String);

impl Profile {
    /// Build a profile from an optional user-supplied name.
    ///
    /// `None` and blank names fall back to [`DEFAULT_PROFILE`].
    pub fn parse(name: Option<&str>) -> DomainResult<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(ALIAS_SECTION) => Err(DomainError::ReservedProfile(ALIAS_SECTION.into())),
            Some(name) => Ok(Self(name.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_PROFILE
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self(DEFAULT_PROFILE.to_string())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
