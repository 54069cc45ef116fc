//! Portainer and Docker Swarm API types
//!
//! Only the fields Retainer reads are modeled. Service types keep the rest of
//! the payload in `extra` so that a spec can be sent back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/auth`
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response of `POST /api/auth`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub jwt: String,
}

/// Registry configured in Portainer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registry {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// Portainer endpoint (environment)
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "Id")]
    pub id: i64,
}

/// Swarm node as returned by the Docker API proxy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Node {
    pub description: NodeDescription,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeDescription {
    pub hostname: String,
}

/// Swarm service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    #[serde(rename = "ID")]
    pub id: String,
    pub version: ServiceVersion,
    pub spec: ServiceSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optimistic concurrency token of a service
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceVersion {
    pub index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSpec {
    #[serde(default)]
    pub name: String,
    pub task_template: TaskTemplate,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskTemplate {
    /// Counter whose increment forces the tasks to be redeployed
    #[serde(default)]
    pub force_update: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_spec: Option<ContainerSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSpec {
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    /// Image of the service's container, if it runs containers at all
    pub fn image(&self) -> Option<&str> {
        self.spec
            .task_template
            .container_spec
            .as_ref()
            .map(|container| container.image.as_str())
    }

    /// Whether the service runs exactly this image reference
    pub fn uses_image(&self, image: &str) -> bool {
        self.image() == Some(image)
    }

    /// Spec to submit on update, with `ForceUpdate` bumped when requested
    pub fn update_spec(&self, pull_latest: bool) -> ServiceSpec {
        let mut spec = self.spec.clone();
        if pull_latest {
            spec.task_template.force_update = spec.task_template.force_update.saturating_add(1);
        }
        spec
    }
}

/// Response of a service update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceUpdateResponse {
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
