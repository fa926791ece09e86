//! Blocking HTTP implementation of [`RemoteApi`]
//!
//! The session is the cookie pair set by the login response, stored verbatim in
//! the per-profile session file and replayed as a `Cookie` header.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::infrastructure::traits::{Method, RemoteApi};
use crate::infrastructure::{HttpError, InfraError, InfraResult};
use crate::util::fs::{remove_if_exists, write_private};

const LOGIN_PATH: &str = "auth/login";
const LOGOUT_PATH: &str = "logout";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("slipstream-cli/", env!("CARGO_PKG_VERSION"));

/// Session-bound client for one endpoint.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    endpoint: Url,
    session_file: PathBuf,
}

impl HttpApi {
    /// Build a client for `endpoint`; `insecure` disables TLS certificate checks.
    pub fn new(
        endpoint: &str,
        session_file: impl Into<PathBuf>,
        insecure: bool,
    ) -> InfraResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        if insecure {
            warn!("TLS certificate verification disabled for {endpoint}");
        }
        // redirects are not followed: the login response carries the session cookie
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| InfraError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            session_file: session_file.into(),
        })
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    fn url(&self, path: &str) -> Result<Url, HttpError> {
        self.endpoint
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Transport(format!("invalid path '{path}': {e}")))
    }

    fn session_cookie(&self) -> Option<String> {
        fs::read_to_string(&self.session_file)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, HttpError> {
        let builder = match self.session_cookie() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        };
        let response = builder
            .header(ACCEPT, "application/json")
            .send()
            .map_err(transport)?;
        check(response)
    }

    fn session_error(&self, reason: impl ToString) -> HttpError {
        HttpError::Session {
            path: self.session_file.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl RemoteApi for HttpApi {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(level = "debug", skip(self, password))]
    fn login(&self, username: &str, password: &str) -> Result<(), HttpError> {
        let response = self
            .client
            .post(self.url(LOGIN_PATH)?)
            .form(&[("username", username), ("password", password)])
            .send()
            .map_err(transport)?;
        let response = check(response)?;

        let session = session_from(&response);
        if session.is_empty() {
            warn!("login response carried no session cookie");
        }
        write_private(&self.session_file, &session).map_err(|e| self.session_error(e))?;
        debug!("session stored in {}", self.session_file.display());
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn logout(&self) -> Result<(), HttpError> {
        if self.session_cookie().is_some() {
            if let Err(e) = self.send(self.client.get(self.url(LOGOUT_PATH)?)) {
                debug!("remote logout failed: {e}");
            }
        }
        remove_if_exists(&self.session_file).map_err(|e| self.session_error(e))?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, params))]
    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, HttpError> {
        let url = self.url(path)?;
        let builder = match method {
            Method::Get => self.client.get(url).query(params),
            Method::Delete => self.client.delete(url).query(params),
            Method::Post => self.client.post(url).form(params),
            Method::Put => self.client.put(url).form(params),
        };
        let text = self.send(builder)?.text().map_err(transport)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Parse and validate an endpoint URL. Only HTTP(S) is allowed.
///
/// The path gets a trailing slash so relative request paths append to it.
pub fn parse_endpoint(raw: &str) -> InfraResult<Url> {
    let invalid = |reason: String| InfraError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "invalid URL scheme ({}). Only HTTP(S) URLs are allowed",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport(e: reqwest::Error) -> HttpError {
    HttpError::Transport(e.to_string())
}

/// Pass through success and redirect responses; classify the rest.
fn check(response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(response);
    }
    let url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = response.text().unwrap_or_default();
    Err(HttpError::from_response(
        status.as_u16(),
        url,
        content_type.as_deref(),
        &text,
    ))
}

/// `name=value` pairs of every `Set-Cookie` header, joined for a `Cookie` header.
fn session_from(response: &Response) -> String {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
