//! Remote resources as rendered in tables
//!
//! Every record type is tolerant: unknown fields are ignored, missing or null
//! fields become empty cells.

use serde::{Deserialize, Deserializer};

/// A record that renders as one table row under fixed headers.
pub trait Tabular {
    const HEADERS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

/// Project, component or application (module tree node or app store entry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Element {
    pub name: Option<String>,
    #[serde(rename = "type", alias = "category")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "version_number")]
    pub version: Option<u64>,
    #[serde(alias = "resourceUri")]
    pub path: Option<String>,
}

impl Element {
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case(kind))
    }
}

impl Tabular for Element {
    const HEADERS: &'static [&'static str] = &["name", "type", "version", "path"];

    fn row(&self) -> Vec<String> {
        vec![
            cell(&self.name),
            cell(&self.kind),
            self.version.map(|v| v.to_string()).unwrap_or_default(),
            cell(&self.path),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Deployment {
    #[serde(alias = "uuid")]
    pub id: Option<String>,
    #[serde(alias = "moduleResourceUri")]
    pub module: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "startTime", alias = "start_time")]
    pub started_at: Option<String>,
    #[serde(alias = "cloudServiceNames")]
    pub cloud: Option<String>,
}

impl Tabular for Deployment {
    const HEADERS: &'static [&'static str] = &["id", "module", "status", "started_at", "cloud"];

    fn row(&self) -> Vec<String> {
        vec![
            cell(&self.id),
            cell(&self.module),
            cell(&self.status),
            cell(&self.started_at),
            cell(&self.cloud),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VirtualMachine {
    #[serde(alias = "instanceId")]
    pub id: Option<String>,
    #[serde(alias = "cloudServiceName")]
    pub cloud: Option<String>,
    #[serde(alias = "state")]
    pub status: Option<String>,
    #[serde(alias = "runUuid", alias = "run_uuid")]
    pub deployment_id: Option<String>,
    #[serde(alias = "ipAddress")]
    pub ip: Option<String>,
}

impl VirtualMachine {
    /// Client-side filter; `None` criteria match everything.
    pub fn matches(
        &self,
        deployment_id: Option<&str>,
        cloud: Option<&str>,
        status: Option<&str>,
    ) -> bool {
        let eq = |field: &Option<String>, wanted: Option<&str>| {
            wanted.map_or(true, |w| field.as_deref() == Some(w))
        };
        eq(&self.deployment_id, deployment_id) && eq(&self.cloud, cloud) && eq(&self.status, status)
    }
}

impl Tabular for VirtualMachine {
    const HEADERS: &'static [&'static str] = &["id", "cloud", "status", "deployment_id", "ip"];

    fn row(&self) -> Vec<String> {
        vec![
            cell(&self.id),
            cell(&self.cloud),
            cell(&self.status),
            cell(&self.deployment_id),
            cell(&self.ip),
        ]
    }
}

/// Usage and quota of one cloud service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde(alias = "name")]
    pub cloud: Option<String>,
    #[serde(alias = "currentUsage")]
    pub usage: u64,
    pub quota: u64,
}

impl Tabular for Usage {
    const HEADERS: &'static [&'static str] = &["cloud", "usage", "quota"];

    fn row(&self) -> Vec<String> {
        vec![cell(&self.cloud), self.usage.to_string(), self.quota.to_string()]
    }
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Versions arrive as numbers or numeric strings.
fn version_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
