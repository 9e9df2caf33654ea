//! Container runtime gateway.
//!
//! [`ContainerRuntime`] is the capability boundary between the engine and the
//! local container runtime: everything the engine observes (names, states,
//! exit codes, networks, ports, labels) and everything it does (create, stop,
//! remove, restart, network management) goes through this trait. Production
//! uses [`DockerRuntime`]; tests substitute an in-memory fake.

mod docker;

pub use docker::DockerRuntime;

use crate::docker::DockerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observed container state, as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Exited,
    Dead,
    /// A state string this engine doesn't know. Never treated as running.
    Unknown,
}

impl ContainerState {
    /// Parse a docker status string (`.State.Status`).
    pub fn parse(s: &str) -> Self {
        match s {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "exited" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }
}

/// Snapshot of an existing container, as much of it as reconciliation and
/// monitoring need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub state: ContainerState,
    /// Exit code of the last run; only meaningful when `state` is `Exited`.
    pub exit_code: i64,
    /// Repo tags of the container's image (a container created from
    /// `nginx:1.25` matches that tag even after the tag moves).
    pub image_tags: Vec<String>,
    /// Names of networks the container is attached to.
    pub networks: Vec<String>,
    /// Published ports: container port key ("80/tcp") to host port.
    pub ports: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
}

impl ContainerSummary {
    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn has_image_tag(&self, tag: &str) -> bool {
        self.image_tags.iter().any(|t| t == tag)
    }
}

/// Everything needed to create and start one container.
///
/// Only a single network is attached at start; multi-network attachment is
/// out of scope for this engine's deployment model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub network: Option<String>,
    pub ports: BTreeMap<String, String>,
    pub environment: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
}

/// Handle to a container this engine started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
}

/// Capability boundary over the local container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List all containers (running or not) matching a `--filter` expression
    /// such as `label=key=value`.
    async fn list_labeled(&self, filter: &str) -> Result<Vec<ContainerSummary>, DockerError>;

    /// Look up a container by name. Not-found is a normal, non-error outcome.
    async fn get_container(&self, name: &str) -> Result<Option<ContainerSummary>, DockerError>;

    /// Create and start a detached container.
    async fn run_container(&self, spec: &RunSpec) -> Result<ContainerHandle, DockerError>;

    async fn stop_container(&self, name: &str) -> Result<(), DockerError>;

    async fn remove_container(&self, name: &str) -> Result<(), DockerError>;

    async fn restart_container(&self, name: &str) -> Result<(), DockerError>;

    async fn list_networks(&self) -> Result<Vec<String>, DockerError>;

    async fn create_network(&self, name: &str) -> Result<(), DockerError>;

    async fn remove_image(&self, image: &str) -> Result<(), DockerError>;
}
