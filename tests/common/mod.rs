//! Shared mocks and fixtures for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use config::Environment;
use serde_json::Value;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use url::Url;

use slipstream::config::{ConfigStore, ENV_PREFIX};
use slipstream::domain::settings::SESSION_FILE;
use slipstream::domain::{Level, Profile};
use slipstream::infrastructure::di::ServiceContainer;
use slipstream::infrastructure::traits::{Method, Prompter, RemoteApi, Reporter};
use slipstream::infrastructure::HttpError;

static TEST_SETUP: Once = Once::new();

/// Route test logs to stderr; `RUST_LOG` overrides the default `debug`.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub fn unauthorized() -> HttpError {
    HttpError::from_response(401, "http://mock/auth/login", None, "")
}

pub fn status(code: u16, path: &str) -> HttpError {
    HttpError::from_response(code, format!("http://mock/{path}"), Some("text/plain"), "")
}

/// Remote API double: accepts one password, answers scripted routes.
pub struct MockApi {
    endpoint: Url,
    accepted_password: Option<String>,
    session_file: Option<PathBuf>,
    routes: Mutex<HashMap<String, Result<Value, HttpError>>>,
    logins: Mutex<Vec<(String, String)>>,
    requests: Mutex<Vec<(Method, String, Vec<(String, String)>)>>,
    logouts: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            endpoint: Url::parse("http://mock/").unwrap(),
            accepted_password: None,
            session_file: None,
            routes: Mutex::new(HashMap::new()),
            logins: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            logouts: AtomicUsize::new(0),
        }
    }

    /// Only `password` authenticates; everything else is a 401.
    pub fn accepting(mut self, password: &str) -> Self {
        self.accepted_password = Some(password.to_string());
        self
    }

    /// Successful logins create this file, like the real session.
    pub fn with_session_file(mut self, path: &Path) -> Self {
        self.session_file = Some(path.to_path_buf());
        self
    }

    /// Answer `METHOD path` requests with `response`.
    pub fn route(self, method: Method, path: &str, response: Result<Value, HttpError>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), response);
        self
    }

    pub fn login_attempts(&self) -> usize {
        self.logins.lock().unwrap().len()
    }

    pub fn logins(&self) -> Vec<(String, String)> {
        self.logins.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<(Method, String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|(method, path, _)| format!("{method} {path}"))
            .collect()
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

impl RemoteApi for MockApi {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn login(&self, username: &str, password: &str) -> Result<(), HttpError> {
        self.logins
            .lock()
            .unwrap()
            .push((username.to_string(), password.to_string()));
        if self.accepted_password.as_deref() != Some(password) {
            return Err(unauthorized());
        }
        if let Some(path) = &self.session_file {
            std::fs::write(path, "cookie=abc").unwrap();
        }
        Ok(())
    }

    fn logout(&self) -> Result<(), HttpError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, HttpError> {
        self.requests
            .lock()
            .unwrap()
            .push((method, path.to_string(), params.to_vec()));
        self.routes
            .lock()
            .unwrap()
            .get(&format!("{method} {path}"))
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }
}

/// Prompter fed from scripted answers; running dry is an EOF error.
pub struct ScriptedPrompter {
    usernames: Mutex<VecDeque<String>>,
    passwords: Mutex<VecDeque<String>>,
    prompts: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(usernames: &[&str], passwords: &[&str]) -> Self {
        Self {
            usernames: Mutex::new(usernames.iter().map(|s| s.to_string()).collect()),
            passwords: Mutex::new(passwords.iter().map(|s| s.to_string()).collect()),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn silent() -> Self {
        Self::new(&[], &[])
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    fn next(&self, queue: &Mutex<VecDeque<String>>) -> io::Result<String> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"))
    }
}

impl Prompter for ScriptedPrompter {
    fn username(&self) -> io::Result<String> {
        self.next(&self.usernames)
    }

    fn password(&self, _username: &str) -> io::Result<String> {
        self.next(&self.passwords)
    }
}

/// Reporter that keeps every message, regardless of level.
#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.messages()
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, level: Level, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

pub fn no_env() -> Environment {
    Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
}

/// Config store in a temp dir with the session file redirected there too.
pub fn temp_store(temp: &TempDir, content: Option<&str>, profile: Option<&str>) -> ConfigStore {
    let path = temp.path().join(".slipstream").join("config");
    if let Some(content) = content {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
    }
    let mut store =
        ConfigStore::load_with_env(&path, Profile::parse(profile).unwrap(), no_env()).unwrap();
    store.set_transient(SESSION_FILE, session_path(temp).to_string_lossy().as_ref());
    store
}

pub fn session_path(temp: &TempDir) -> PathBuf {
    temp.path().join("cookies.txt")
}

pub struct Harness {
    pub api: Arc<MockApi>,
    pub prompter: Arc<ScriptedPrompter>,
    pub reporter: Arc<RecordingReporter>,
    pub container: ServiceContainer,
}

pub fn harness(store: ConfigStore, api: MockApi, prompter: ScriptedPrompter) -> Harness {
    let api = Arc::new(api);
    let prompter = Arc::new(prompter);
    let reporter = Arc::new(RecordingReporter::default());
    let container = ServiceContainer::with_deps(
        store,
        api.clone(),
        prompter.clone(),
        reporter.clone(),
    );
    Harness {
        api,
        prompter,
        reporter,
        container,
    }
}
