//! Centralized Docker CLI client.
//!
//! All Docker CLI interactions go through `DockerClient`, which provides
//! consistent timeout handling, error mapping to [`DockerError`], and a single
//! point where `Command::new("docker")` is constructed.

use super::DockerError;
use std::process::Output;
use std::time::Duration;

/// Default timeout for inspection commands (ps, inspect, network ls).
const INSPECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Centralized client for Docker CLI operations.
///
/// Wraps every `docker` subprocess invocation with a timeout and a structured
/// [`DockerError`] return. Construct once and thread through the application —
/// the struct is cheap (zero-sized today).
#[derive(Debug, Clone, Default)]
pub struct DockerClient;

impl DockerClient {
    pub fn new() -> Self {
        DockerClient
    }

    /// Run a docker command with a timeout, returning raw Output.
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<Output, DockerError> {
        let result = tokio::time::timeout(
            timeout,
            tokio::process::Command::new("docker").args(args).output(),
        )
        .await;

        let cmd_str = format!("docker {}", args.join(" "));

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(DockerError::exec_failed(cmd_str, e)),
            Err(_) => Err(DockerError::timeout(cmd_str, timeout)),
        }
    }

    /// Run a docker command with a timeout, returning Output only if exit 0.
    async fn run_success(&self, args: &[&str], timeout: Duration) -> Result<Output, DockerError> {
        let output = self.run(args, timeout).await?;
        if output.status.success() {
            Ok(output)
        } else {
            let cmd_str = format!("docker {}", args.join(" "));
            Err(DockerError::failed(&cmd_str, &output))
        }
    }

    // ========================================================================
    // Container lifecycle
    // ========================================================================

    /// Start a detached container. `args` is everything after `docker run -d`
    /// (flags, image, command). Returns the new container id.
    pub async fn run_detached(
        &self,
        args: &[String],
        timeout: Duration,
    ) -> Result<String, DockerError> {
        let mut full: Vec<&str> = vec!["run", "-d"];
        full.extend(args.iter().map(String::as_str));
        let output = self.run_success(&full, timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Stop a container gracefully.
    pub async fn stop(&self, container: &str, timeout: Duration) -> Result<(), DockerError> {
        let output = self.run(&["stop", container], timeout).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such container") {
            return Err(DockerError::not_found(container));
        }
        Err(DockerError::failed("docker stop", &output))
    }

    /// Force-remove a container. Returns `Ok(())` if the container doesn't exist.
    pub async fn rm_force(&self, container: &str, timeout: Duration) -> Result<(), DockerError> {
        let output = self.run(&["rm", "-f", container], timeout).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such container") {
            return Ok(());
        }
        Err(DockerError::failed("docker rm -f", &output))
    }

    /// Restart a container (stop + start with docker's default grace period).
    pub async fn restart(&self, container: &str, timeout: Duration) -> Result<(), DockerError> {
        let output = self.run(&["restart", container], timeout).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such container") {
            return Err(DockerError::not_found(container));
        }
        Err(DockerError::failed("docker restart", &output))
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// List container names (running or not) matching a `--filter` expression.
    pub async fn ps_names(&self, filter: &str) -> Result<Vec<String>, DockerError> {
        let output = self
            .run_success(
                &["ps", "-a", "--filter", filter, "--format", "{{.Names}}"],
                INSPECT_TIMEOUT,
            )
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Inspect a container, returning the raw JSON document.
    ///
    /// A missing container is a normal outcome and yields `Ok(None)`.
    pub async fn inspect_container(
        &self,
        container: &str,
    ) -> Result<Option<serde_json::Value>, DockerError> {
        let output = self
            .run(
                &["inspect", "--type=container", container],
                INSPECT_TIMEOUT,
            )
            .await?;

        if !output.status.success() {
            let err = DockerError::failed("docker inspect", &output);
            if err.is_not_found() {
                return Ok(None);
            }
            return Err(err);
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let parsed: serde_json::Value = serde_json::from_str(&json_str).map_err(|e| {
            DockerError::cmd_failed(
                format!("docker inspect {}", container),
                format!("unparseable inspect output: {}", e),
                None,
            )
        })?;

        // `docker inspect` always returns an array, one element per target.
        Ok(parsed.as_array().and_then(|arr| arr.first()).cloned())
    }

    /// Repo tags of an image (by id or reference). Missing image yields an
    /// empty list rather than an error: callers compare tags, and a gone
    /// image simply matches nothing.
    pub async fn image_repo_tags(&self, image: &str) -> Result<Vec<String>, DockerError> {
        let output = self
            .run(
                &[
                    "image",
                    "inspect",
                    "--format",
                    "{{json .RepoTags}}",
                    image,
                ],
                INSPECT_TIMEOUT,
            )
            .await?;

        if !output.status.success() {
            let err = DockerError::failed("docker image inspect", &output);
            if err.is_not_found() {
                return Ok(Vec::new());
            }
            return Err(err);
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let tags: Vec<String> = serde_json::from_str(json_str.trim()).unwrap_or_default();
        Ok(tags)
    }

    // ========================================================================
    // Networks / images
    // ========================================================================

    /// Names of all networks known to the daemon.
    pub async fn network_names(&self) -> Result<Vec<String>, DockerError> {
        let output = self
            .run_success(&["network", "ls", "--format", "{{.Name}}"], INSPECT_TIMEOUT)
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Create a network with default settings. Creating a network that
    /// already exists is a command failure; callers check existence first.
    pub async fn network_create(&self, name: &str) -> Result<(), DockerError> {
        self.run_success(&["network", "create", name], INSPECT_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Remove an image. A missing image is tolerated.
    pub async fn rmi(&self, image: &str, timeout: Duration) -> Result<(), DockerError> {
        let output = self.run(&["rmi", image], timeout).await?;
        if output.status.success() {
            return Ok(());
        }
        let err = DockerError::failed("docker rmi", &output);
        if err.is_not_found() {
            return Ok(());
        }
        Err(err)
    }

    // ========================================================================
    // Daemon health
    // ========================================================================

    /// Check if the Docker daemon is healthy.
    pub async fn daemon_healthy(&self, timeout: Duration) -> bool {
        match self
            .run(&["info", "--format", "{{.ServerVersion}}"], timeout)
            .await
        {
            Ok(o) => o.status.success(),
            Err(_) => false,
        }
    }
}
