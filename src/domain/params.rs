//! Node-scoped deployment parameters
//!
//! Accepted forms: `value`, `key=value`, `node:value`, `node:key=value`.
//! A `:` only separates the node when it comes before the first `=`, so values
//! such as `url=https://host` keep their colon.

use crate::domain::{DomainError, DomainResult};

const DEFAULT_NODE: &str = "default";
const CLOUD_KEY: &str = "cloudservice";

pub const PARAM_FORMAT: &str = "<node>:<param_name>=<value> or <param_name>=<value>";
pub const CLOUD_FORMAT: &str = "<node>:<cloud> or <cloud>";

/// What a node-scoped argument configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeParamKind {
    /// Application or component parameter; a key is required.
    Parameter,
    /// Cloud service selection; a key is forbidden.
    Cloud,
}

impl NodeParamKind {
    fn format(self) -> &'static str {
        match self {
            Self::Parameter => PARAM_FORMAT,
            Self::Cloud => CLOUD_FORMAT,
        }
    }
}

/// Parsed parameter, keyed the way the deployment request expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeParam {
    pub key: String,
    pub value: String,
}

pub fn parse_node_param(raw: &str, kind: NodeParamKind) -> DomainResult<NodeParam> {
    let invalid = || DomainError::InvalidNodeParam {
        value: raw.to_string(),
        format: kind.format(),
    };

    let (node, rest) = split_node(raw);
    let (key, value) = rest.split_once('=').unwrap_or(("", rest));

    let key = match kind {
        NodeParamKind::Cloud if !key.is_empty() => return Err(invalid()),
        NodeParamKind::Cloud => CLOUD_KEY,
        NodeParamKind::Parameter if key.is_empty() => return Err(invalid()),
        NodeParamKind::Parameter => key,
    };

    let key = match node {
        None | Some(DEFAULT_NODE) => format!("parameter--{key}"),
        Some("") => return Err(invalid()),
        Some(node) => format!("parameter--node--{node}--{key}"),
    };

    Ok(NodeParam {
        key,
        value: value.to_string(),
    })
}

fn split_node(raw: &str) -> (Option<&str>, &str) {
    match (raw.find(':'), raw.find('=')) {
        (Some(colon), Some(eq)) if colon > eq => (None, raw),
        (Some(colon), _) => (Some(&raw[..colon]), &raw[colon + 1..]),
        (None, _) => (None, raw),
    }
}
