use miette::Diagnostic;
use std::io;
use thiserror::Error;

use crate::addon::AddonStatus;
use crate::docker::DockerError;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Docker error: {0}")]
    #[diagnostic(
        code(addon::docker::error),
        help("Check that Docker is running with `docker ps`")
    )]
    Docker(#[from] DockerError),

    #[error("Failed to create network '{network}': {source}")]
    #[diagnostic(code(addon::network::create_failed))]
    NetworkCreate {
        network: String,
        #[source]
        source: DockerError,
    },

    #[error("Service '{0}' failed to start: {1}")]
    #[diagnostic(
        code(addon::service::start_failed),
        help("Check the container logs with `docker logs {0}`")
    )]
    ServiceStartFailed(String, String),

    #[error("Addon not found: {0}")]
    #[diagnostic(code(addon::not_found))]
    AddonNotFound(String),

    #[error("Addon '{0}' has no services in the marketplace catalog")]
    #[diagnostic(
        code(addon::catalog::empty),
        help("The marketplace entry must declare at least one service")
    )]
    AddonHasNoServices(String),

    #[error("Marketplace error: {0}")]
    #[diagnostic(
        code(addon::marketplace::error),
        help("Check MARKETPLACE_ADDR and that the marketplace service is reachable")
    )]
    Marketplace(#[from] reqwest::Error),

    #[error("Invalid addon status transition: {from} -> {to}")]
    #[diagnostic(code(addon::status::invalid_transition))]
    InvalidStatusTransition { from: AddonStatus, to: AddonStatus },

    #[error("Database error: {0}")]
    #[diagnostic(code(addon::store::error))]
    Database(#[from] tokio_rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::Docker(DockerError::DaemonUnavailable) => {
                Some("Start the Docker daemon, then verify with: docker ps".to_string())
            }
            Error::Docker(_) => Some("Check that Docker is running: docker ps".to_string()),
            Error::Config(msg) if msg.contains("MARKETPLACE_ADDR") => Some(
                "Set the marketplace address, e.g. MARKETPLACE_ADDR=http://localhost:8080"
                    .to_string(),
            ),
            Error::Marketplace(e) if e.is_connect() => Some(
                "The marketplace did not answer. Verify MARKETPLACE_ADDR points at a running instance."
                    .to_string(),
            ),
            Error::AddonNotFound(id) => Some(format!(
                "List known addons with `addon-engine list`, or install one with `addon-engine install {}`",
                id
            )),
            _ => None,
        }
    }
}
