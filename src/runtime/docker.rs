//! Docker-backed implementation of the container runtime gateway.

use super::{ContainerHandle, ContainerRuntime, ContainerState, ContainerSummary, RunSpec};
use crate::docker::{DockerClient, DockerError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Timeout for `docker run -d`; covers an image pull on first deployment.
const RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for stop/remove/restart. Docker's default stop grace period is
/// 10 seconds, so this leaves room for a slow shutdown plus the removal.
const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(35);

const RMI_TIMEOUT: Duration = Duration::from_secs(60);

/// [`ContainerRuntime`] over the local Docker daemon via [`DockerClient`].
#[derive(Debug, Clone, Default)]
pub struct DockerRuntime {
    client: DockerClient,
}

impl DockerRuntime {
    pub fn new() -> Self {
        Self {
            client: DockerClient::new(),
        }
    }

    /// Build a [`ContainerSummary`] from one `docker inspect` document.
    async fn summarize(&self, doc: &serde_json::Value) -> Result<ContainerSummary, DockerError> {
        let id = doc
            .get("Id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        // Docker reports names with a leading slash.
        let name = doc
            .get("Name")
            .and_then(|v| v.as_str())
            .map(|s| s.trim_start_matches('/').to_string())
            .unwrap_or_default();

        let state = doc
            .pointer("/State/Status")
            .and_then(|v| v.as_str())
            .map(ContainerState::parse)
            .unwrap_or(ContainerState::Unknown);

        let exit_code = doc
            .pointer("/State/ExitCode")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        let networks = doc
            .pointer("/NetworkSettings/Networks")
            .and_then(|v| v.as_object())
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let ports = parse_port_bindings(doc.pointer("/NetworkSettings/Ports"));

        let labels = doc
            .pointer("/Config/Labels")
            .and_then(|v| v.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        // Resolve the image's repo tags so reconciliation can compare the
        // declared image reference against what the container actually runs.
        let image_id = doc.get("Image").and_then(|v| v.as_str()).unwrap_or("");
        let mut image_tags = if image_id.is_empty() {
            Vec::new()
        } else {
            self.client.image_repo_tags(image_id).await?
        };

        // The reference the container was created from counts as a tag too;
        // it covers images pulled by digest or retagged since creation.
        if let Some(config_image) = doc.pointer("/Config/Image").and_then(|v| v.as_str()) {
            if !image_tags.iter().any(|t| t == config_image) {
                image_tags.push(config_image.to_string());
            }
        }

        Ok(ContainerSummary {
            id,
            name,
            state,
            exit_code,
            image_tags,
            networks,
            ports,
            labels,
        })
    }
}

/// Flatten docker's port binding map to container-port -> first host port.
/// Unpublished (null) bindings are skipped.
fn parse_port_bindings(value: Option<&serde_json::Value>) -> BTreeMap<String, String> {
    let mut ports = BTreeMap::new();
    let Some(obj) = value.and_then(|v| v.as_object()) else {
        return ports;
    };
    for (container_port, bindings) in obj {
        let host_port = bindings
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|b| b.get("HostPort"))
            .and_then(|v| v.as_str());
        if let Some(host_port) = host_port {
            ports.insert(container_port.clone(), host_port.to_string());
        }
    }
    ports
}

/// Build the argument list for `docker run -d` from a [`RunSpec`].
fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec!["--name".to_string(), spec.name.clone()];

    for (key, value) in &spec.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }

    for (key, value) in &spec.environment {
        args.push("-e".to_string());
        args.push(format!("{}={}", key, value));
    }

    if let Some(ref network) = spec.network {
        args.push("--network".to_string());
        args.push(network.clone());
    }

    for (container_port, host_port) in &spec.ports {
        args.push("-p".to_string());
        args.push(format!("{}:{}", host_port, container_port));
    }

    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_labeled(&self, filter: &str) -> Result<Vec<ContainerSummary>, DockerError> {
        let names = self.client.ps_names(filter).await?;
        let mut summaries = Vec::with_capacity(names.len());
        for name in names {
            // A container can disappear between ps and inspect; skip it.
            if let Some(doc) = self.client.inspect_container(&name).await? {
                summaries.push(self.summarize(&doc).await?);
            }
        }
        Ok(summaries)
    }

    async fn get_container(&self, name: &str) -> Result<Option<ContainerSummary>, DockerError> {
        match self.client.inspect_container(name).await? {
            Some(doc) => Ok(Some(self.summarize(&doc).await?)),
            None => Ok(None),
        }
    }

    async fn run_container(&self, spec: &RunSpec) -> Result<ContainerHandle, DockerError> {
        let args = run_args(spec);
        let id = self.client.run_detached(&args, RUN_TIMEOUT).await?;
        Ok(ContainerHandle {
            id,
            name: spec.name.clone(),
        })
    }

    async fn stop_container(&self, name: &str) -> Result<(), DockerError> {
        self.client.stop(name, LIFECYCLE_TIMEOUT).await
    }

    async fn remove_container(&self, name: &str) -> Result<(), DockerError> {
        self.client.rm_force(name, LIFECYCLE_TIMEOUT).await
    }

    async fn restart_container(&self, name: &str) -> Result<(), DockerError> {
        self.client.restart(name, LIFECYCLE_TIMEOUT).await
    }

    async fn list_networks(&self) -> Result<Vec<String>, DockerError> {
        self.client.network_names().await
    }

    async fn create_network(&self, name: &str) -> Result<(), DockerError> {
        self.client.network_create(name).await
    }

    async fn remove_image(&self, image: &str) -> Result<(), DockerError> {
        self.client.rmi(image, RMI_TIMEOUT).await
    }
}
