//! Docker CLI plumbing for the container runtime gateway.
//!
//! [`DockerClient`] is the single place `docker` subprocesses are spawned;
//! the [`crate::runtime`] module builds the engine-facing gateway on top.

pub mod client;
pub mod error;

pub use client::DockerClient;
pub use error::DockerError;

use std::time::Duration;

/// Check if the Docker daemon is healthy and responsive.
///
/// Uses `docker info` with a short timeout. Call this at engine startup
/// before attributing container failures: when the daemon is down, every
/// container check fails even for healthy containers.
pub async fn is_daemon_healthy() -> bool {
    DockerClient::new()
        .daemon_healthy(Duration::from_secs(2))
        .await
}
