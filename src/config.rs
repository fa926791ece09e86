//! Configuration store with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Profile table of the config file: `~/.slipstream/config`
//! 3. Environment variables: `SLIPSTREAM_*` prefix
//! 4. Command-line overrides ([`ConfigStore::set_override`])
//!
//! The same file holds an `[alias]` table merged over the built-in aliases.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use config::{Environment, Source};
use directories::BaseDirs;
use thiserror::Error;
use toml::{Table, Value};
use tracing::{debug, instrument, warn};

use crate::domain::profile::ALIAS_SECTION;
use crate::domain::settings::{
    ENDPOINT, INSECURE, KNOWN_OPTIONS, PASSWORD, SESSION_FILE, USERNAME,
};
use crate::domain::{parse_scalar, AliasTable, Profile, SettingValue, Settings, DEFAULT_ENDPOINT};
use crate::util::fs::write_private;

/// Prefix of environment overrides (`SLIPSTREAM_ENDPOINT`, ...).
pub const ENV_PREFIX: &str = "SLIPSTREAM";

const CONFIG_DIR_NAME: &str = ".slipstream";
const CONFIG_FILE_NAME: &str = "config";
const SESSION_FILE_TEMPLATE: &str = "~/.slipstream/cookies-{profile}.txt";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Profile '{0}' does not exist.")]
    ProfileNotFound(String),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Get the configuration directory (~/.slipstream).
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(shellexpand::tilde("~/.slipstream").as_ref()))
}

/// Get the path to the default config file.
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Session file of `profile`, derived from the fixed name template.
pub fn default_session_file(profile: &Profile) -> PathBuf {
    let template = SESSION_FILE_TEMPLATE.replace("{profile}", profile.name());
    PathBuf::from(shellexpand::tilde(&template).as_ref())
}

/// Settings, aliases and the persisted document for one profile.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    profile: Profile,
    aliases: AliasTable,
    settings: Settings,
    /// Keys set with [`ConfigStore::set_transient`]; `save` skips them.
    transient: BTreeSet<String>,
    document: Table,
}

impl ConfigStore {
    /// Load the config file for `profile`, then apply `SLIPSTREAM_*` variables.
    ///
    /// A missing file is not an error. A missing profile table is an error unless
    /// the profile is the default one.
    pub fn load(path: impl Into<PathBuf>, profile: Profile) -> Result<Self, ConfigError> {
        Self::load_with_env(path, profile, Environment::with_prefix(ENV_PREFIX))
    }

    /// [`ConfigStore::load`] with an explicit environment source.
    #[instrument(level = "debug", skip_all, fields(profile = %profile))]
    pub fn load_with_env(
        path: impl Into<PathBuf>,
        profile: Profile,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let document = read_document(&path)?;

        let mut aliases = AliasTable::builtin();
        match document.get(ALIAS_SECTION) {
            Some(Value::Table(section)) => aliases.extend(
                section
                    .iter()
                    .filter_map(|(alias, target)| text_of(target).map(|t| (alias.clone(), t))),
            ),
            Some(_) => warn!("[{ALIAS_SECTION}] in {} is not a table, ignored", path.display()),
            None => {}
        }

        let mut settings = Settings::defaults();
        match document.get(profile.name()) {
            Some(Value::Table(section)) => settings.merge(section_settings(section)),
            Some(_) => warn!("[{profile}] in {} is not a table, ignored", path.display()),
            None if profile.is_default() => {
                debug!("no [{profile}] table, using defaults");
            }
            None => return Err(ConfigError::ProfileNotFound(profile.name().to_string())),
        }
        settings.merge(env_settings(&env));

        Ok(Self {
            path,
            profile,
            aliases,
            settings,
            transient: BTreeSet::new(),
            document,
        })
    }

    /// Write the alias table and the active profile table back to the file.
    ///
    /// Other profiles' tables are preserved. Secrets are never written.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn save(&mut self) -> Result<(), ConfigError> {
        let alias_section: Table = self
            .aliases
            .iter()
            .map(|(alias, target)| (alias.to_string(), Value::String(target.to_string())))
            .collect();
        self.document
            .insert(ALIAS_SECTION.to_string(), Value::Table(alias_section));

        let profile_section: Table = self
            .settings
            .persistable()
            .filter(|(key, _)| !self.transient.contains(*key))
            .map(|(key, value)| (key.to_string(), to_toml(value)))
            .collect();
        self.document
            .insert(self.profile.name().to_string(), Value::Table(profile_section));

        let content = toml::to_string_pretty(&self.document)?;
        write_private(&self.path, &content)
            .map_err(|e| ConfigError::io(format!("write {}", self.path.display()), e))?;
        debug!("configuration saved");
        Ok(())
    }

    /// Remove `key` from memory and from the profile table (persisted on next save).
    pub fn clear(&mut self, key: &str) -> Result<(), ConfigError> {
        self.settings.remove(key);
        self.transient.remove(key);
        match self.document.get_mut(self.profile.name()) {
            Some(Value::Table(section)) => {
                section.remove(key);
                Ok(())
            }
            Some(_) => Ok(()),
            None if self.profile.is_default() => Ok(()),
            // load already rejects a non-default profile without a table
            None => Err(ConfigError::ProfileNotFound(self.profile.name().to_string())),
        }
    }

    /// Command-line layer: highest precedence for this invocation.
    pub fn set_override(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        let key = key.into();
        self.transient.remove(&key);
        self.settings.set(key, value);
    }

    /// Like [`ConfigStore::set_override`], but never written by [`ConfigStore::save`].
    pub fn set_transient(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        let key = key.into();
        self.settings.set(key.clone(), value);
        self.transient.insert(key);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut AliasTable {
        &mut self.aliases
    }

    pub fn endpoint(&self) -> &str {
        self.settings.get_str(ENDPOINT).unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn insecure(&self) -> bool {
        self.settings.flag(INSECURE)
    }

    pub fn username(&self) -> Option<&str> {
        self.settings.get_str(USERNAME)
    }

    pub fn password(&self) -> Option<&str> {
        self.settings.get_str(PASSWORD)
    }

    /// Session file: `session_file` setting if set, else the per-profile default.
    pub fn session_file(&self) -> PathBuf {
        match self.settings.get_str(SESSION_FILE) {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => default_session_file(&self.profile),
        }
    }
}

/// Read and parse the config file. Missing or malformed files yield an empty table.
fn read_document(path: &Path) -> Result<Table, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("no config file at {}", path.display());
            return Ok(Table::new());
        }
        Err(e) => return Err(ConfigError::io(format!("read {}", path.display()), e)),
    };
    match content.parse::<Table>() {
        Ok(table) => Ok(table),
        Err(e) => {
            warn!("ignoring malformed config file {}: {}", path.display(), e);
            Ok(Table::new())
        }
    }
}

fn section_settings(section: &Table) -> Settings {
    section
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                other if key == PASSWORD => SettingValue::Secret(text_of(other)?),
                Value::Boolean(b) => SettingValue::Flag(*b),
                other => parse_scalar(&text_of(other)?),
            };
            Some((key.clone(), value))
        })
        .collect()
}

fn env_settings(env: &Environment) -> Settings {
    let collected = match env.collect() {
        Ok(map) => map,
        Err(e) => {
            warn!("ignoring {ENV_PREFIX}_* environment: {e}");
            return Settings::default();
        }
    };
    collected
        .into_iter()
        .filter_map(|(key, value)| {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                debug!(key, "ignoring unknown {ENV_PREFIX}_* variable");
                return None;
            }
            let raw = value.into_string().ok()?;
            let value = if key == PASSWORD {
                SettingValue::Secret(raw)
            } else {
                parse_scalar(&raw)
            };
            debug!(key, "environment override");
            Some((key, value))
        })
        .collect()
}

/// Scalar TOML value as text; tables and arrays are skipped.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(_) | Value::Table(_) => {
            warn!("ignoring non-scalar config value");
            None
        }
    }
}

fn to_toml(value: &SettingValue) -> Value {
    match value {
        SettingValue::Flag(b) => Value::Boolean(*b),
        other => Value::String(other.as_str().unwrap_or_default().to_string()),
    }
}
