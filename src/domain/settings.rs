//! Typed option values and the effective settings map

use std::collections::BTreeMap;
use std::fmt;

/// Endpoint used when neither the config file nor the command line names one.
pub const DEFAULT_ENDPOINT: &str = "https://nuv.la";

pub const ENDPOINT: &str = "endpoint";
pub const INSECURE: &str = "insecure";
pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const SESSION_FILE: &str = "session_file";

/// Options that can be set from the environment.
pub const KNOWN_OPTIONS: [&str; 5] = [ENDPOINT, INSECURE, USERNAME, PASSWORD, SESSION_FILE];

const TRUTHY: [&str; 4] = ["1", "yes", "true", "on"];
const FALSY: [&str; 4] = ["0", "no", "false", "off"];

/// A single option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Text(String),
    Flag(bool),
    /// Never displayed nor persisted.
    Secret(String),
}

impl SettingValue {
    /// Re-apply boolean coercion to a textual value.
    ///
    /// Flags and secrets are returned unchanged, so coercion is idempotent.
    pub fn coerce(self) -> Self {
        match self {
            Self::Text(raw) => parse_scalar(&raw),
            other => other,
        }
    }

    /// Text content of a `Text` or `Secret` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Secret(s) => Some(s),
            Self::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Text(s) => match parse_scalar(s) {
                Self::Flag(b) => Some(b),
                _ => None,
            },
            Self::Secret(_) => None,
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Secret(_) => f.write_str("********"),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Coerce a textual option value.
///
/// `1/yes/true/on` become `Flag(true)`, `0/no/false/off` become `Flag(false)`
/// (case-insensitive). Anything else is kept verbatim as `Text`.
pub fn parse_scalar(raw: &str) -> SettingValue {
    let lowered = raw.to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        SettingValue::Flag(true)
    } else if FALSY.contains(&lowered.as_str()) {
        SettingValue::Flag(false)
    } else {
        SettingValue::Text(raw.to_string())
    }
}

/// Effective option map for the active profile.
///
/// Layers are applied with [`Settings::merge`]; later layers win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    /// Built-in defaults (lowest layer).
    pub fn defaults() -> Self {
        let mut settings = Self::default();
        settings.set(ENDPOINT, DEFAULT_ENDPOINT);
        settings.set(INSECURE, false);
        settings
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Text value of `key`, if any. Flags are not rendered.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SettingValue::as_str)
    }

    /// Boolean value of `key`; missing or non-boolean values are `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(SettingValue::as_flag).unwrap_or(false)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<SettingValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overlay `other` onto `self`: every key present in `other` replaces ours.
    pub fn merge(&mut self, other: Settings) {
        self.values.extend(other.values);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries eligible for the config file: everything but secrets.
    pub fn persistable(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.iter().filter(|(_, v)| !v.is_secret())
    }
}

impl FromIterator<(String, SettingValue)> for Settings {
    fn from_iter<T: IntoIterator<Item = (String, SettingValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1")]
    #[case("yes")]
    #[case("YES")]
    #[case("true")]
    #[case("True")]
    #[case("on")]
    #[case("On")]
    fn given_truthy_token_when_parse_scalar_then_flag_true(#[case] raw: &str) {
        assert_eq!(parse_scalar(raw), SettingValue::Flag(true));
    }

    #[rstest]
    #[case("0")]
    #[case("no")]
    #[case("No")]
    #[case("false")]
    #[case("FALSE")]
    #[case("off")]
    #[case("OFF")]
    fn given_falsy_token_when_parse_scalar_then_flag_false(#[case] raw: &str) {
        assert_eq!(parse_scalar(raw), SettingValue::Flag(false));
    }

    #[rstest]
    #[case("https://nuv.la")]
    #[case("")]
    #[case("2")]
    #[case("yess")]
    #[case(" true")]
    fn given_other_string_when_parse_scalar_then_unchanged(#[case] raw: &str) {
        assert_eq!(parse_scalar(raw), SettingValue::Text(raw.to_string()));
    }

    #[rstest]
    #[case("on")]
    #[case("Off")]
    #[case("alice")]
    #[case("")]
    fn given_any_value_when_coercing_twice_then_idempotent(#[case] raw: &str) {
        let once = parse_scalar(raw);
        assert_eq!(once.clone().coerce(), once);
    }

    #[test]
    fn given_secret_when_displayed_then_redacted() {
        let secret = SettingValue::Secret("hunter2".into());
        assert_eq!(secret.to_string(), "********");
        assert_eq!(secret.as_str(), Some("hunter2"));
    }

    #[test]
    fn given_layers_when_merging_then_later_layer_wins_and_keeps_others() {
        let mut settings = Settings::defaults();
        settings.set(ENDPOINT, "X");

        let mut persisted = Settings::default();
        persisted.set(ENDPOINT, "Y");
        persisted.set("extra", "Z");
        settings.merge(persisted);

        let mut cli = Settings::default();
        cli.set(ENDPOINT, "W");
        settings.merge(cli);

        assert_eq!(settings.get_str(ENDPOINT), Some("W"));
        assert_eq!(settings.get_str("extra"), Some("Z"));
        assert!(!settings.flag(INSECURE));
    }

    #[test]
    fn given_secret_when_persistable_then_skipped() {
        let mut settings = Settings::defaults();
        settings.set(PASSWORD, SettingValue::Secret("pw".into()));
        settings.set(SESSION_FILE, "/tmp/cookies");
        settings.set(USERNAME, "alice");

        let keys: Vec<&str> = settings.persistable().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![ENDPOINT, INSECURE, SESSION_FILE, USERNAME]);
    }

    #[test]
    fn given_textual_boolean_when_flag_then_coerced() {
        let mut settings = Settings::default();
        settings.set(INSECURE, "yes");
        assert!(settings.flag(INSECURE));
    }
}
