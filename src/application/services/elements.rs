//! Remote resource commands
//!
//! Each operation issues one or two calls through [`RemoteApi`] and maps the
//! statuses that have a command-specific meaning (404, 403, 409) to
//! [`ApplicationError`] variants. Everything else propagates as an `HttpError`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::domain::{Deployment, Element, NodeParam, Usage, VirtualMachine};
use crate::infrastructure::traits::{Method, RemoteApi};
use crate::infrastructure::HttpError;

const NOT_FOUND: u16 = 404;
const FORBIDDEN: u16 = 403;
const CONFLICT: u16 = 409;

/// Result of a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(u64),
    AlreadyPublished(u64),
}

/// A deployment ready to be sent (or printed on dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub path: String,
    pub params: Vec<NodeParam>,
    pub clouds: Vec<NodeParam>,
}

impl DeployRequest {
    /// Form body of the `run` request.
    pub fn form(&self) -> Vec<(String, String)> {
        std::iter::once(("refqname".to_string(), module_path(&self.path)))
            .chain(
                self.params
                    .iter()
                    .chain(&self.clouds)
                    .map(|p| (p.key.clone(), p.value.clone())),
            )
            .collect()
    }
}

/// Commands over modules, deployments, virtual machines and usage.
pub struct ElementService {
    api: Arc<dyn RemoteApi>,
}

impl ElementService {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }

    fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, HttpError> {
        self.api.request(Method::Get, path, params)
    }

    pub fn appstore(&self) -> ApplicationResult<Vec<Element>> {
        records(self.get("appstore", &[])?, "decode appstore")
    }

    /// Children of a project (the root project when `path` is `None`).
    #[instrument(level = "debug", skip(self))]
    pub fn list(
        &self,
        path: Option<&str>,
        recurse: bool,
        kind: Option<&str>,
    ) -> ApplicationResult<Vec<Element>> {
        let params = if recurse {
            vec![("recurse".to_string(), "true".to_string())]
        } else {
            Vec::new()
        };
        let value = self
            .get(&module_path(path.unwrap_or_default()), &params)
            .map_err(|e| {
                on_status(e, NOT_FOUND, || {
                    ApplicationError::ElementNotFound(format!(
                        "Module '{}' doesn't exist.",
                        path.unwrap_or_default()
                    ))
                })
            })?;
        let elements: Vec<Element> = records(value, "decode module list")?;
        Ok(elements
            .into_iter()
            .filter(|e| kind.map_or(true, |k| e.is_kind(k)))
            .collect())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn show(&self, path: &str) -> ApplicationResult<Element> {
        let value = self.get(&module_path(path), &[]).map_err(|e| {
            on_status(e, NOT_FOUND, || {
                ApplicationError::ElementNotFound(format!("Element '{path}' doesn't exist."))
            })
        })?;
        serde_json::from_value(value).context("decode element")
    }

    pub fn deployment(&self, id: &Uuid) -> ApplicationResult<Deployment> {
        let value = self.get(&run_path(id), &[]).map_err(|e| {
            on_status(e, NOT_FOUND, || deployment_not_found(id))
        })?;
        serde_json::from_value(value).context("decode deployment")
    }

    pub fn deployments(&self, inactive: bool) -> ApplicationResult<Vec<Deployment>> {
        let params = [("inactive".to_string(), inactive.to_string())];
        records(self.get("run", &params)?, "decode deployments")
    }

    pub fn virtual_machines(
        &self,
        deployment_id: Option<&Uuid>,
        cloud: Option<&str>,
        status: Option<&str>,
    ) -> ApplicationResult<Vec<VirtualMachine>> {
        let deployment_id = deployment_id.map(Uuid::to_string);
        let vms: Vec<VirtualMachine> = records(self.get("vms", &[])?, "decode vms")?;
        Ok(vms
            .into_iter()
            .filter(|vm| vm.matches(deployment_id.as_deref(), cloud, status))
            .collect())
    }

    /// Resolve `path` to a deployable module.
    ///
    /// A path unknown as a module is looked up by name in the app store.
    #[instrument(level = "debug", skip(self, params, clouds))]
    pub fn prepare_deploy(
        &self,
        path: &str,
        params: Vec<NodeParam>,
        clouds: Vec<NodeParam>,
    ) -> ApplicationResult<DeployRequest> {
        let path = match self.show(path) {
            Ok(element) => {
                debug!(kind = ?element.kind, "deploying module");
                path.to_string()
            }
            Err(ApplicationError::ElementNotFound(message)) => self
                .appstore()?
                .into_iter()
                .find(|app| app.name.as_deref() == Some(path))
                .and_then(|app| app.path)
                .ok_or(ApplicationError::ElementNotFound(message))?,
            Err(e) => return Err(e),
        };
        Ok(DeployRequest {
            path,
            params,
            clouds,
        })
    }

    /// Start a deployment and return its id.
    pub fn deploy(&self, request: &DeployRequest) -> ApplicationResult<String> {
        let value = self.api.request(Method::Post, "run", &request.form())?;
        info!(path = %request.path, "deployment requested");
        deployment_id(value)
    }

    /// Start an image build of a component and return the deployment id.
    pub fn build(&self, path: &str, cloud: Option<&str>) -> ApplicationResult<String> {
        let mut form = vec![
            ("refqname".to_string(), module_path(path)),
            ("type".to_string(), "Machine".to_string()),
        ];
        if let Some(cloud) = cloud {
            form.push(("parameter--cloudservice".to_string(), cloud.to_string()));
        }
        let value = self.api.request(Method::Post, "run", &form)?;
        deployment_id(value)
    }

    pub fn terminate(&self, id: &Uuid) -> ApplicationResult<()> {
        self.api
            .request(Method::Delete, &run_path(id), &[])
            .map_err(|e| on_status(e, NOT_FOUND, || deployment_not_found(id)))?;
        Ok(())
    }

    pub fn usage(&self) -> ApplicationResult<Vec<Usage>> {
        records(self.get("dashboard", &[])?, "decode usage")
    }

    /// Publish `path` to the app store; the latest version when none is given.
    #[instrument(level = "debug", skip(self))]
    pub fn publish(&self, path: &str, version: Option<u64>) -> ApplicationResult<PublishOutcome> {
        let version = self.version_or_latest(path, version)?;
        match self
            .api
            .request(Method::Put, &publish_path(path, version), &[])
        {
            Ok(_) => Ok(PublishOutcome::Published(version)),
            Err(e) if e.is_status(CONFLICT) => Ok(PublishOutcome::AlreadyPublished(version)),
            Err(e) if e.is_status(FORBIDDEN) => Err(ApplicationError::PermissionDenied(
                "Only superuser is allowed to publish.".to_string(),
            )),
            Err(e) => Err(on_status(e, NOT_FOUND, || version_not_found(path, version))),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn unpublish(&self, path: &str, version: Option<u64>) -> ApplicationResult<u64> {
        let version = self.version_or_latest(path, version)?;
        match self
            .api
            .request(Method::Delete, &publish_path(path, version), &[])
        {
            Ok(_) => Ok(version),
            Err(e) if e.is_status(FORBIDDEN) => Err(ApplicationError::PermissionDenied(
                "Only a superuser is allowed to unpublish.".to_string(),
            )),
            Err(e) => Err(on_status(e, NOT_FOUND, || version_not_found(path, version))),
        }
    }

    /// Delete an element, or one version of it. Returns the deleted path.
    pub fn delete(&self, path: &str, version: Option<u64>) -> ApplicationResult<String> {
        let target = match version {
            Some(v) => format!("{path}/{v}"),
            None => path.to_string(),
        };
        self.api
            .request(Method::Delete, &module_path(&target), &[])
            .map_err(|e| {
                on_status(e, NOT_FOUND, || {
                    ApplicationError::ElementNotFound(format!("{target} doesn't exist."))
                })
            })?;
        Ok(target)
    }

    fn version_or_latest(&self, path: &str, version: Option<u64>) -> ApplicationResult<u64> {
        match version {
            Some(v) => Ok(v),
            None => self.show(path)?.version.ok_or_else(|| {
                ApplicationError::UnexpectedResponse(format!("element '{path}' has no version"))
            }),
        }
    }
}

fn module_path(path: &str) -> String {
    format!("module/{}", path.trim_matches('/'))
}

fn run_path(id: &Uuid) -> String {
    format!("run/{id}")
}

fn publish_path(path: &str, version: u64) -> String {
    format!("{}/{version}/publish", module_path(path))
}

fn deployment_not_found(id: &Uuid) -> ApplicationError {
    ApplicationError::ElementNotFound(format!("Deployment '{id}' doesn't exist."))
}

fn version_not_found(path: &str, version: u64) -> ApplicationError {
    ApplicationError::ElementNotFound(format!("'{path}' #{version} doesn't exist."))
}

/// Map `status` to a command-specific error; anything else stays an HTTP error.
fn on_status(
    e: HttpError,
    status: u16,
    mapped: impl FnOnce() -> ApplicationError,
) -> ApplicationError {
    if e.is_status(status) {
        mapped()
    } else {
        e.into()
    }
}

/// Records of a listing: a bare array, the largest array field of an envelope
/// object, or a single object.
fn records<T: DeserializeOwned>(value: Value, context: &str) -> ApplicationResult<Vec<T>> {
    let items = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => {
            let nested = map
                .values()
                .filter_map(Value::as_array)
                .max_by_key(|items| items.len())
                .cloned();
            nested.unwrap_or_else(|| vec![Value::Object(map)])
        }
        other => {
            return Err(ApplicationError::UnexpectedResponse(format!(
                "{context}: {other}"
            )))
        }
    };
    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .context(context)
}

/// Deployment id from a `run` creation response.
fn deployment_id(value: Value) -> ApplicationResult<String> {
    let id = match &value {
        Value::String(s) => s.trim().rsplit('/').next().map(str::to_string),
        Value::Object(map) => ["id", "uuid", "resource-id"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(|s| s.rsplit('/').next().unwrap_or(s).to_string()),
        _ => None,
    };
    id.filter(|s| !s.is_empty())
        .ok_or_else(|| ApplicationError::UnexpectedResponse(format!("no deployment id in {value}")))
}
