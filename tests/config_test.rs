//! Tests for profile loading, layering and persistence of the config file

mod common;

use std::collections::HashMap;
use std::fs;

use config::Environment;
use rstest::rstest;
use tempfile::TempDir;

use common::{no_env, temp_store};
use slipstream::config::{ConfigError, ConfigStore, ENV_PREFIX};
use slipstream::domain::settings::{ENDPOINT, PASSWORD, SESSION_FILE, USERNAME};
use slipstream::domain::{Profile, SettingValue, DEFAULT_ENDPOINT};

const TWO_PROFILES: &str = r#"
[alias]
dep = "deployments"

[nuvla]
endpoint = "https://nuv.la"
username = "alice"
extra = "Z"

[staging]
endpoint = "https://staging.example.com"
insecure = "yes"
username = "bob"
"#;

fn config_path(temp: &TempDir) -> std::path::PathBuf {
    temp.path().join(".slipstream").join("config")
}

#[test]
fn given_unknown_profile_when_loading_then_profile_not_found() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(config_path(&temp).parent().unwrap()).unwrap();
    fs::write(config_path(&temp), TWO_PROFILES).unwrap();

    let result = ConfigStore::load_with_env(
        config_path(&temp),
        Profile::parse(Some("prod")).unwrap(),
        no_env(),
    );

    assert!(matches!(result, Err(ConfigError::ProfileNotFound(name)) if name == "prod"));
}

#[test]
fn given_default_profile_without_table_when_loading_then_defaults() {
    let temp = TempDir::new().unwrap();
    let store = temp_store(&temp, Some("[other]\nusername = \"x\"\n"), None);

    assert_eq!(store.endpoint(), DEFAULT_ENDPOINT);
    assert_eq!(store.username(), None);
}

#[rstest]
#[case(None, "https://nuv.la", "alice", false)]
#[case(Some("staging"), "https://staging.example.com", "bob", true)]
fn given_profile_when_loading_then_its_table_applies(
    #[case] profile: Option<&str>,
    #[case] endpoint: &str,
    #[case] username: &str,
    #[case] insecure: bool,
) {
    let temp = TempDir::new().unwrap();
    let store = temp_store(&temp, Some(TWO_PROFILES), profile);

    assert_eq!(store.endpoint(), endpoint);
    assert_eq!(store.username(), Some(username));
    assert_eq!(store.insecure(), insecure);
}

#[test]
fn given_every_layer_when_loading_then_command_line_wins() {
    let temp = TempDir::new().unwrap();
    let path = config_path(&temp);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, TWO_PROFILES).unwrap();
    let env: HashMap<String, String> = [
        ("SLIPSTREAM_ENDPOINT".to_string(), "https://env".to_string()),
        ("SLIPSTREAM_USERNAME".to_string(), "carol".to_string()),
    ]
    .into_iter()
    .collect();

    let mut store = ConfigStore::load_with_env(
        &path,
        Profile::default(),
        Environment::with_prefix(ENV_PREFIX).source(Some(env)),
    )
    .unwrap();
    assert_eq!(store.endpoint(), "https://env");
    assert_eq!(store.username(), Some("carol"));

    store.set_override(ENDPOINT, "https://cli");
    assert_eq!(store.endpoint(), "https://cli");
    assert_eq!(store.username(), Some("carol"));
    assert_eq!(store.settings().get_str("extra"), Some("Z"));
}

#[test]
fn given_saved_profile_when_other_profiles_exist_then_they_are_preserved() {
    let temp = TempDir::new().unwrap();
    let mut store = temp_store(&temp, Some(TWO_PROFILES), Some("staging"));
    store.set_override(USERNAME, "dave");
    store.set_override(PASSWORD, SettingValue::Secret("hunter2".into()));

    store.save().unwrap();

    let saved = fs::read_to_string(store.path()).unwrap();
    assert!(!saved.contains("hunter2"));
    assert!(!saved.contains("cookies.txt"));

    let nuvla = temp_store(&temp, None, None);
    assert_eq!(nuvla.username(), Some("alice"));
    let staging = temp_store(&temp, None, Some("staging"));
    assert_eq!(staging.username(), Some("dave"));
    assert!(staging.insecure());
    assert_eq!(staging.aliases().get("dep"), Some("deployments"));
}

#[cfg(unix)]
#[test]
fn given_fresh_home_when_saving_then_private_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let mut store = temp_store(&temp, None, None);

    store.save().unwrap();

    let file_mode = fs::metadata(store.path()).unwrap().permissions().mode();
    let dir_mode = fs::metadata(store.path().parent().unwrap())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(file_mode & 0o777, 0o600);
    assert_eq!(dir_mode & 0o777, 0o700);
}

#[test]
fn given_malformed_file_when_loading_then_treated_as_empty() {
    let temp = TempDir::new().unwrap();
    let store = temp_store(&temp, Some("[nuvla\nendpoint = "), None);

    assert_eq!(store.endpoint(), DEFAULT_ENDPOINT);
    assert_eq!(store.aliases().get("ls"), Some("list"));
}

#[test]
fn given_alias_section_when_loading_then_merged_over_builtins() {
    let temp = TempDir::new().unwrap();
    let store = temp_store(
        &temp,
        Some("[alias]\nls = \"deployments\"\ncs = \"config  show\"\n"),
        None,
    );

    assert_eq!(store.aliases().get("ls"), Some("deployments"));
    assert_eq!(store.aliases().get("cs"), Some("config show"));
    assert_eq!(store.aliases().get("vms"), Some("virtualmachines"));
}

#[test]
fn given_stored_key_when_cleared_and_saved_then_gone_from_file() {
    let temp = TempDir::new().unwrap();
    let mut store = temp_store(&temp, Some(TWO_PROFILES), None);

    store.clear(USERNAME).unwrap();
    store.save().unwrap();

    assert_eq!(store.username(), None);
    let reloaded = temp_store(&temp, None, None);
    assert_eq!(reloaded.username(), None);
    assert_eq!(reloaded.endpoint(), "https://nuv.la");
}

#[test]
fn given_session_file_in_profile_when_saved_then_kept_on_reload() {
    let temp = TempDir::new().unwrap();
    let path = config_path(&temp);
    let cookies = temp.path().join("srv").join("cookies");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        format!("[nuvla]\nsession_file = {:?}\n", cookies.to_string_lossy()),
    )
    .unwrap();

    let mut store = ConfigStore::load_with_env(&path, Profile::default(), no_env()).unwrap();
    store.set_override(USERNAME, "alice");
    store.save().unwrap();

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains(SESSION_FILE));
    let reloaded = ConfigStore::load_with_env(&path, Profile::default(), no_env()).unwrap();
    assert_eq!(reloaded.session_file(), cookies);
    assert_eq!(reloaded.username(), Some("alice"));
}
