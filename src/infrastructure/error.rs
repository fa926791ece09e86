//! Infrastructure-level errors: HTTP failures, I/O, prompts

use regex::Regex;
use thiserror::Error;

/// Body of a failed HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// XML error document, reduced to its text content.
    Xml(String),
    Text(String),
}

/// Failure reported by the remote API collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("{status} error for url: {url}{}", detail(body))]
    Response {
        status: u16,
        url: String,
        body: ResponseBody,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("session file {path}: {reason}")]
    Session { path: String, reason: String },
}

impl HttpError {
    /// Classify a non-success response by content type.
    pub fn from_response(
        status: u16,
        url: impl Into<String>,
        content_type: Option<&str>,
        text: &str,
    ) -> Self {
        let body = if content_type.is_some_and(|ct| ct.contains("xml")) {
            ResponseBody::Xml(xml_text(text))
        } else {
            ResponseBody::Text(text.trim().to_string())
        };
        Self::Response {
            status,
            url: url.into(),
            body,
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Transport(_) | Self::Session { .. } => None,
        }
    }

    pub fn is_status(&self, code: u16) -> bool {
        self.status() == Some(code)
    }
}

fn detail(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Xml(text) | ResponseBody::Text(text) if !text.is_empty() => {
            format!(": {text}")
        }
        _ => String::new(),
    }
}

/// Text content of an XML document: tags dropped, entities decoded, whitespace collapsed.
pub fn xml_text(xml: &str) -> String {
    let stripped = Regex::new(r"(?s)<\?.*?\?>|<!--.*?-->|<[^>]*>")
        .map(|re| re.replace_all(xml, " ").into_owned())
        .unwrap_or_else(|_| xml.to_string());
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Infrastructure errors wrap HTTP failures and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("cannot build HTTP client: {0}")]
    Client(String),

    #[error("cannot read input: {0}")]
    Prompt(#[source] std::io::Error),
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_xml_content_type_when_classifying_then_extracts_text() {
        let err = HttpError::from_response(
            400,
            "https://nuv.la/run",
            Some("application/xml;charset=utf-8"),
            "<?xml version=\"1.0\"?>\n<error code=\"400\">Module &lt;x&gt; is abstract</error>",
        );
        assert_eq!(
            err,
            HttpError::Response {
                status: 400,
                url: "https://nuv.la/run".into(),
                body: ResponseBody::Xml("Module <x> is abstract".into()),
            }
        );
    }

    #[test]
    fn given_plain_body_when_displayed_then_includes_status_url_and_body() {
        let err = HttpError::from_response(500, "https://nuv.la/x", Some("text/plain"), "boom\n");
        assert_eq!(err.to_string(), "500 error for url: https://nuv.la/x: boom");
        assert!(err.is_status(500));
    }

    #[test]
    fn given_empty_body_when_displayed_then_no_trailing_detail() {
        let err = HttpError::from_response(404, "https://nuv.la/x", None, "");
        assert_eq!(err.to_string(), "404 error for url: https://nuv.la/x");
    }

    #[test]
    fn given_transport_error_when_status_then_none() {
        assert_eq!(HttpError::Transport("dns".into()).status(), None);
    }
}
